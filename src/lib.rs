//! # Redis Throughput Benchmark Library
//!
//! A concurrent throughput benchmark harness for Redis implemented in Rust.
//! This library fans a fixed catalogue of store operations out across many
//! concurrent client connections and reports the aggregate throughput of
//! each operation category.
//!
//! ## Benchmarked Operations
//!
//! - **PING**: Liveness round trip with no key
//! - **SET / GET**: Fixed payload write and read on a per-worker key
//! - **INCR / DECR**: Atomic counter updates on a per-worker counter
//! - **LPUSH / LPOP / RPUSH / RPOP**: List operations on both ends, with the
//!   left and right lists kept in separate key namespaces
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `client`: Store client abstraction and the Redis-backed implementation
//! - `task`: Operation catalogue, key derivation and the per-worker loop
//! - `benchmark`: Worker pool orchestration for a single operation category
//! - `coordination`: Sequential driver over the whole catalogue
//! - `results`: Result records, report formatting and JSON output
//! - `cli`: Command-line interface parsing
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use redis_bench::{
//!     BenchmarkConfig, BenchmarkDriver, ConnectionSpec, ErrorPolicy, Operation,
//!     RedisClientFactory, ResultsManager, TaskSpec,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BenchmarkConfig {
//!         workers: 4,
//!         iterations: 1000,
//!         connection: ConnectionSpec::default(),
//!         error_policy: ErrorPolicy::Abort,
//!         catalogue: vec![TaskSpec::new(Operation::Set), TaskSpec::new(Operation::Get)],
//!     };
//!
//!     let factory = RedisClientFactory::new(config.connection.clone());
//!     let driver = BenchmarkDriver::new(&config, factory);
//!     let mut results_manager = ResultsManager::new(None);
//!     let results = driver.run(&mut results_manager).await?;
//!
//!     println!("{} categories benchmarked", results.len());
//!     Ok(())
//! }
//! ```

/// Worker pool orchestration
///
/// Contains `BenchmarkRunner`, which runs one operation category across all
/// workers and times the concurrent batch, and the validated `BenchmarkConfig`.
pub mod benchmark;

/// Command-line interface and configuration
///
/// Provides argument parsing using clap. Arguments are converted into the
/// immutable `BenchmarkConfig` once at startup.
pub mod cli;

/// Store client abstraction
///
/// The `StoreClient` trait exposes the named store operations on one
/// connection; `ClientFactory` creates one such client per worker.
pub mod client;

/// Sequential execution of the operation catalogue
pub mod coordination;

/// Error types shared by the benchmark engine
pub mod error;

pub mod logging;

/// Result collection, report formatting and JSON output
pub mod results;

/// Operation catalogue and the per-worker executable unit
pub mod task;

pub mod utils;

pub use benchmark::{BenchmarkConfig, BenchmarkRunner};
pub use cli::{Args, ErrorPolicy};
pub use client::{ClientFactory, ConnectionSpec, RedisClient, RedisClientFactory, StoreClient};
pub use coordination::BenchmarkDriver;
pub use error::{BenchError, StoreError};
pub use results::{BenchmarkResult, ResultsManager};
pub use task::{Operation, TaskSpec};

/// The current version of the benchmark harness
///
/// Populated from Cargo.toml and recorded in the JSON output metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Default number of concurrent workers, one connection each
    pub const WORKERS: usize = 10;

    /// Default number of operations each worker performs per category
    pub const ITERATIONS: usize = 2000;

    /// Upper bound on the worker count accepted by validation
    pub const MAX_WORKERS: usize = 10_000;

    /// Default Redis host
    pub const HOST: &str = "127.0.0.1";

    /// Default Redis port
    pub const PORT: u16 = 6379;

    /// Default logical database
    ///
    /// A high-numbered database keeps benchmark keys away from database 0.
    pub const DB: i64 = 13;

    /// Default credential sent with AUTH
    pub const PASSWORD: &str = "go-redis";

    /// Payload written by SET, LPUSH and RPUSH
    pub const PAYLOAD: &[u8] = b"foo";
}
