//! # Operation Catalogue and Worker Loop
//!
//! Each benchmarked store command is an `Operation`. A `TaskSpec` names one
//! operation for the catalogue, and `run_worker` is the executable unit that
//! one worker runs against its own connection.
//!
//! ## Key Namespaces
//!
//! Keys are derived from the operation's prefix and the worker identity as
//! `<prefix>-<id>`. Worker identities are decimal indices, so the `-`
//! delimiter keeps every worker in its own namespace:
//!
//! | operations    | key           |
//! |---------------|---------------|
//! | SET, GET      | `set-<id>`    |
//! | INCR, DECR    | `ctr-<id>`    |
//! | LPUSH, LPOP   | `list-L-<id>` |
//! | RPUSH, RPOP   | `list-R-<id>` |
//!
//! Pairs share a key on purpose: GET reads what SET wrote for the same worker
//! id, and the pops drain the list filled by the matching push.

use crate::{
    cli::ErrorPolicy,
    client::StoreClient,
    error::StoreError,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// A store command benchmarked as one task category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Liveness round trip
    #[clap(name = "ping")]
    Ping,

    /// Write the fixed payload
    #[clap(name = "set")]
    Set,

    /// Read the payload written by SET
    #[clap(name = "get")]
    Get,

    /// Atomic counter increment
    #[clap(name = "incr")]
    Incr,

    /// Atomic counter decrement
    #[clap(name = "decr")]
    Decr,

    /// Push to the left end of a list
    #[clap(name = "lpush")]
    Lpush,

    /// Pop from the left end of a list
    #[clap(name = "lpop")]
    Lpop,

    /// Push to the right end of a list
    #[clap(name = "rpush")]
    Rpush,

    /// Pop from the right end of a list
    #[clap(name = "rpop")]
    Rpop,
}

impl Operation {
    /// The full catalogue in report order
    pub const ALL: [Operation; 9] = [
        Operation::Ping,
        Operation::Set,
        Operation::Get,
        Operation::Incr,
        Operation::Decr,
        Operation::Lpush,
        Operation::Lpop,
        Operation::Rpush,
        Operation::Rpop,
    ];

    /// Upper-case command name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Ping => "PING",
            Operation::Set => "SET",
            Operation::Get => "GET",
            Operation::Incr => "INCR",
            Operation::Decr => "DECR",
            Operation::Lpush => "LPUSH",
            Operation::Lpop => "LPOP",
            Operation::Rpush => "RPUSH",
            Operation::Rpop => "RPOP",
        }
    }

    /// Key namespace prefix, `None` for keyless commands
    pub fn key_prefix(&self) -> Option<&'static str> {
        match self {
            Operation::Ping => None,
            Operation::Set | Operation::Get => Some("set"),
            Operation::Incr | Operation::Decr => Some("ctr"),
            Operation::Lpush | Operation::Lpop => Some("list-L"),
            Operation::Rpush | Operation::Rpop => Some("list-R"),
        }
    }

    /// Key used by worker `worker_id` for this operation
    pub fn key_for(&self, worker_id: &str) -> Option<String> {
        self.key_prefix()
            .map(|prefix| format!("{}-{}", prefix, worker_id))
    }

    /// Perform one call of this operation
    ///
    /// Empty reads (GET on a missing key, pops on an empty list) succeed.
    pub async fn execute(
        &self,
        client: &mut dyn StoreClient,
        key: Option<&str>,
    ) -> Result<(), StoreError> {
        let payload = crate::defaults::PAYLOAD;
        let key = key.unwrap_or_default();
        match self {
            Operation::Ping => client.ping().await,
            Operation::Set => client.set(key, payload).await,
            Operation::Get => client.get(key).await.map(drop),
            Operation::Incr => client.incr(key).await.map(drop),
            Operation::Decr => client.decr(key).await.map(drop),
            Operation::Lpush => client.lpush(key, payload).await.map(drop),
            Operation::Lpop => client.lpop(key).await.map(drop),
            Operation::Rpush => client.rpush(key, payload).await.map(drop),
            Operation::Rpop => client.rpop(key).await.map(drop),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the benchmark catalogue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub operation: Operation,
}

impl TaskSpec {
    pub fn new(operation: Operation) -> Self {
        Self {
            name: operation.name().to_string(),
            operation,
        }
    }

    /// Catalogue of every operation in report order
    pub fn default_catalogue() -> Vec<TaskSpec> {
        Operation::ALL.into_iter().map(TaskSpec::new).collect()
    }
}

/// Everything one worker owns for the duration of a task run
pub struct WorkerContext {
    /// Worker index, also used as the identity in derived keys
    pub index: usize,
    pub id: String,
    pub key: Option<String>,
    pub client: Box<dyn StoreClient>,
    pub iterations: usize,
    pub policy: ErrorPolicy,
}

impl WorkerContext {
    pub fn new(
        index: usize,
        operation: Operation,
        client: Box<dyn StoreClient>,
        iterations: usize,
        policy: ErrorPolicy,
    ) -> Self {
        let id = index.to_string();
        let key = operation.key_for(&id);
        Self {
            index,
            id,
            key,
            client,
            iterations,
            policy,
        }
    }
}

/// What a worker hands back to the orchestrator when its loop ends
pub struct WorkerExit {
    pub index: usize,
    /// The worker's client, returned so the orchestrator can release it
    pub client: Box<dyn StoreClient>,
    /// Number of failed calls under `ErrorPolicy::Count`, or the first
    /// failure under `ErrorPolicy::Abort`
    pub outcome: Result<u64, StoreError>,
}

/// Run `ctx.iterations` calls of `operation` and signal completion
///
/// Exactly one token is sent on `signal` once the loop finishes. When the
/// policy is `Abort` and a call fails, the loop stops and no token is sent;
/// the error is returned in the `WorkerExit` instead.
pub async fn run_worker(
    operation: Operation,
    mut ctx: WorkerContext,
    signal: mpsc::Sender<()>,
) -> WorkerExit {
    let mut failed: u64 = 0;
    let mut outcome = Ok(());

    for _ in 0..ctx.iterations {
        if let Err(e) = operation
            .execute(ctx.client.as_mut(), ctx.key.as_deref())
            .await
        {
            match ctx.policy {
                ErrorPolicy::Abort => {
                    outcome = Err(e);
                    break;
                }
                ErrorPolicy::Count => {
                    debug!("Worker {} {} call failed: {}", ctx.id, operation, e);
                    failed += 1;
                }
            }
        }
    }

    if outcome.is_ok() {
        // Send fails only if the orchestrator stopped listening
        let _ = signal.send(()).await;
    }

    WorkerExit {
        index: ctx.index,
        client: ctx.client,
        outcome: outcome.map(|()| failed),
    }
}
