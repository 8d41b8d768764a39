use thiserror::Error;

/// Failure reported by a single store call or connection attempt
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or protocol failure reported by the Redis client
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// The client was used after `quit`
    #[error("connection already closed")]
    Closed,

    /// Failure raised by a non-Redis client implementation
    #[error("{0}")]
    Other(String),
}

/// Fatal benchmark failure
///
/// Every variant names the task category, and where it applies the worker,
/// so the message printed on exit identifies where the run stopped.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("task {task}: failed to connect client for worker {worker}: {source}")]
    Connection {
        task: String,
        worker: usize,
        #[source]
        source: StoreError,
    },

    #[error("task {task}: worker {worker} operation failed: {source}")]
    Operation {
        task: String,
        worker: usize,
        #[source]
        source: StoreError,
    },

    #[error("task {task}: worker {worker} panicked")]
    WorkerPanicked { task: String, worker: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BenchError {
    /// Name of the task category the failure belongs to, if any
    pub fn task(&self) -> Option<&str> {
        match self {
            BenchError::Connection { task, .. }
            | BenchError::Operation { task, .. }
            | BenchError::WorkerPanicked { task, .. } => Some(task),
            BenchError::InvalidConfig(_) => None,
        }
    }
}
