use crate::error::StoreError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Connection parameters shared by every worker's client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub host: String,
    pub port: u16,
    pub db: i64,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ConnectionSpec {
    fn default() -> Self {
        Self {
            host: crate::defaults::HOST.to_string(),
            port: crate::defaults::PORT,
            db: crate::defaults::DB,
            password: Some(crate::defaults::PASSWORD.to_string()),
        }
    }
}

impl ConnectionSpec {
    /// Build the redis connection parameters
    ///
    /// Fields are passed through structurally, so passwords containing URL
    /// reserved characters and IPv6 hosts need no escaping.
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                username: None,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// One connection to the store exposing the benchmarked operations
///
/// Every call completes only once the store has replied. Reads that find no
/// value return `None` rather than an error.
#[async_trait]
pub trait StoreClient: Send {
    async fn ping(&mut self) -> Result<(), StoreError>;

    async fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn incr(&mut self, key: &str) -> Result<i64, StoreError>;

    async fn decr(&mut self, key: &str) -> Result<i64, StoreError>;

    /// Push to the head of a list, returning the new length
    async fn lpush(&mut self, key: &str, value: &[u8]) -> Result<usize, StoreError>;

    async fn lpop(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Push to the tail of a list, returning the new length
    async fn rpush(&mut self, key: &str, value: &[u8]) -> Result<usize, StoreError>;

    async fn rpop(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Close the connection. Later calls fail with `StoreError::Closed`.
    async fn quit(&mut self) -> Result<(), StoreError>;
}

/// Creates one independent client per call
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreClient>, StoreError>;
}

/// Redis-backed client over a dedicated multiplexed connection
pub struct RedisClient {
    connection: Option<MultiplexedConnection>,
}

impl RedisClient {
    /// Open a new dedicated connection to the server in `spec`
    ///
    /// AUTH and SELECT are issued by the redis crate as part of the
    /// connection handshake when the URL carries a password and database.
    pub async fn connect(spec: &ConnectionSpec) -> Result<Self, StoreError> {
        let client = redis::Client::open(spec.connection_info())?;
        let connection = client.get_multiplexed_async_connection().await?;
        debug!("Connected to redis at {}:{} db {}", spec.host, spec.port, spec.db);
        Ok(Self {
            connection: Some(connection),
        })
    }

    fn connection(&mut self) -> Result<&mut MultiplexedConnection, StoreError> {
        self.connection.as_mut().ok_or(StoreError::Closed)
    }
}

#[async_trait]
impl StoreClient for RedisClient {
    async fn ping(&mut self) -> Result<(), StoreError> {
        let _: String = redis::cmd("PING").query_async(self.connection()?).await?;
        Ok(())
    }

    async fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let _: () = self.connection()?.set(key, value).await?;
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value: Option<Vec<u8>> = self.connection()?.get(key).await?;
        Ok(value)
    }

    async fn incr(&mut self, key: &str) -> Result<i64, StoreError> {
        let value: i64 = self.connection()?.incr(key, 1).await?;
        Ok(value)
    }

    async fn decr(&mut self, key: &str) -> Result<i64, StoreError> {
        let value: i64 = self.connection()?.decr(key, 1).await?;
        Ok(value)
    }

    async fn lpush(&mut self, key: &str, value: &[u8]) -> Result<usize, StoreError> {
        let len: usize = self.connection()?.lpush(key, value).await?;
        Ok(len)
    }

    async fn lpop(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value: Option<Vec<u8>> = self.connection()?.lpop(key, None).await?;
        Ok(value)
    }

    async fn rpush(&mut self, key: &str, value: &[u8]) -> Result<usize, StoreError> {
        let len: usize = self.connection()?.rpush(key, value).await?;
        Ok(len)
    }

    async fn rpop(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value: Option<Vec<u8>> = self.connection()?.rpop(key, None).await?;
        Ok(value)
    }

    async fn quit(&mut self) -> Result<(), StoreError> {
        // Dropping the connection closes the socket even if QUIT fails
        let mut connection = self.connection.take().ok_or(StoreError::Closed)?;
        let _: () = redis::cmd("QUIT").query_async(&mut connection).await?;
        Ok(())
    }
}

/// Factory producing `RedisClient`s for a fixed `ConnectionSpec`
#[derive(Debug, Clone)]
pub struct RedisClientFactory {
    spec: ConnectionSpec,
}

impl RedisClientFactory {
    pub fn new(spec: ConnectionSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ConnectionSpec {
        &self.spec
    }
}

#[async_trait]
impl ClientFactory for RedisClientFactory {
    async fn connect(&self) -> Result<Box<dyn StoreClient>, StoreError> {
        let client = RedisClient::connect(&self.spec).await?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory store shared by the unit tests of the engine modules.

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Shared state observed by tests after a run
    #[derive(Default)]
    pub struct MockState {
        pub strings: HashMap<String, Vec<u8>>,
        pub counters: HashMap<String, i64>,
        pub lists: HashMap<String, VecDeque<Vec<u8>>>,
        pub calls: Vec<(usize, &'static str, Option<String>)>,
        pub pings: usize,
        pub connected: usize,
        pub quit: usize,
        /// Order of connect and quit events, for sequencing assertions
        pub events: Vec<String>,
    }

    pub struct MockClient {
        index: usize,
        state: Arc<Mutex<MockState>>,
        fail_ops: bool,
        closed: bool,
    }

    impl MockClient {
        fn record(&mut self, op: &'static str, key: Option<&str>) -> Result<(), StoreError> {
            if self.closed {
                return Err(StoreError::Closed);
            }
            if self.fail_ops {
                return Err(StoreError::Other(format!("injected {} failure", op)));
            }
            let mut state = self.state.lock().unwrap();
            state.calls.push((self.index, op, key.map(str::to_string)));
            Ok(())
        }
    }

    #[async_trait]
    impl StoreClient for MockClient {
        async fn ping(&mut self) -> Result<(), StoreError> {
            self.record("PING", None)?;
            self.state.lock().unwrap().pings += 1;
            Ok(())
        }

        async fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
            self.record("SET", Some(key))?;
            let mut state = self.state.lock().unwrap();
            state.strings.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.record("GET", Some(key))?;
            Ok(self.state.lock().unwrap().strings.get(key).cloned())
        }

        async fn incr(&mut self, key: &str) -> Result<i64, StoreError> {
            self.record("INCR", Some(key))?;
            let mut state = self.state.lock().unwrap();
            let counter = state.counters.entry(key.to_string()).or_insert(0);
            *counter += 1;
            Ok(*counter)
        }

        async fn decr(&mut self, key: &str) -> Result<i64, StoreError> {
            self.record("DECR", Some(key))?;
            let mut state = self.state.lock().unwrap();
            let counter = state.counters.entry(key.to_string()).or_insert(0);
            *counter -= 1;
            Ok(*counter)
        }

        async fn lpush(&mut self, key: &str, value: &[u8]) -> Result<usize, StoreError> {
            self.record("LPUSH", Some(key))?;
            let mut state = self.state.lock().unwrap();
            let list = state.lists.entry(key.to_string()).or_default();
            list.push_front(value.to_vec());
            Ok(list.len())
        }

        async fn lpop(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.record("LPOP", Some(key))?;
            let mut state = self.state.lock().unwrap();
            Ok(state.lists.get_mut(key).and_then(|list| list.pop_front()))
        }

        async fn rpush(&mut self, key: &str, value: &[u8]) -> Result<usize, StoreError> {
            self.record("RPUSH", Some(key))?;
            let mut state = self.state.lock().unwrap();
            let list = state.lists.entry(key.to_string()).or_default();
            list.push_back(value.to_vec());
            Ok(list.len())
        }

        async fn rpop(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.record("RPOP", Some(key))?;
            let mut state = self.state.lock().unwrap();
            Ok(state.lists.get_mut(key).and_then(|list| list.pop_back()))
        }

        async fn quit(&mut self) -> Result<(), StoreError> {
            if self.closed {
                return Err(StoreError::Closed);
            }
            self.closed = true;
            let mut state = self.state.lock().unwrap();
            state.quit += 1;
            state.events.push("quit".to_string());
            Ok(())
        }
    }

    /// Factory over a shared `MockState` with optional failure injection
    #[derive(Clone, Default)]
    pub struct MockFactory {
        pub state: Arc<Mutex<MockState>>,
        next_index: Arc<AtomicUsize>,
        /// Connection attempt (counted across the whole run) that fails
        pub fail_connect_at: Option<usize>,
        /// Client indices whose operations always fail
        pub failing_clients: Vec<usize>,
    }

    impl MockFactory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_connect_at(index: usize) -> Self {
            Self {
                fail_connect_at: Some(index),
                ..Self::default()
            }
        }

        pub fn with_failing_clients(clients: Vec<usize>) -> Self {
            Self {
                failing_clients: clients,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ClientFactory for MockFactory {
        async fn connect(&self) -> Result<Box<dyn StoreClient>, StoreError> {
            let index = self.next_index.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect_at == Some(index) {
                return Err(StoreError::Other("connection refused".to_string()));
            }
            {
                let mut state = self.state.lock().unwrap();
                state.connected += 1;
                state.events.push("connect".to_string());
            }
            Ok(Box::new(MockClient {
                index,
                state: Arc::clone(&self.state),
                fail_ops: self.failing_clients.contains(&index),
                closed: false,
            }))
        }
    }
}
