//! # Benchmark Engine Module
//!
//! This module contains the worker pool orchestrator that times one operation
//! category against the store. It handles the complete lifecycle of a task
//! run, from connecting clients through the concurrent measurement to
//! releasing the connections.
//!
//! ## Key Components
//!
//! - **BenchmarkConfig**: Immutable, validated configuration built once at startup
//! - **BenchmarkRunner**: Runs a single `TaskSpec` across all workers
//!
//! ## Task Run Lifecycle
//!
//! 1. **Signal**: Allocate a bounded completion channel sized to the worker count
//! 2. **Connect**: Create one client per worker; any failure aborts before launch
//! 3. **Launch**: Start the clock and spawn one tokio task per worker
//! 4. **Drain**: Wait for one completion token from every worker
//! 5. **Measure**: Stop the clock
//! 6. **Release**: Join every worker and quit every client (best effort)
//!
//! Workers are always joined, so a failed or panicked worker is reported with
//! its index instead of being lost.

use crate::{
    cli::{Args, ErrorPolicy},
    client::{ClientFactory, ConnectionSpec, StoreClient},
    error::BenchError,
    results::BenchmarkResult,
    task::{run_worker, TaskSpec, WorkerContext},
    utils::{validate_iterations, validate_workers},
};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Configuration for benchmark execution
///
/// Built once from the command line and passed by reference to the driver and
/// runner; nothing inside the engine reads process-wide state.
#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    /// Number of concurrent workers, each with a dedicated connection
    pub workers: usize,

    /// Number of calls each worker performs per task
    pub iterations: usize,

    /// Connection parameters shared by every client
    pub connection: ConnectionSpec,

    /// Handling of failed store calls inside a worker loop
    pub error_policy: ErrorPolicy,

    /// Tasks to run, in report order
    pub catalogue: Vec<TaskSpec>,
}

impl BenchmarkConfig {
    /// Create benchmark configuration from CLI arguments
    ///
    /// ## Validation
    /// - The worker count must be between 1 and `defaults::MAX_WORKERS`
    /// - The product `workers × iterations` must fit in a `u64`
    pub fn from_args(args: &Args) -> Result<Self, BenchError> {
        let config = Self {
            workers: args.workers,
            iterations: args.iterations,
            connection: ConnectionSpec {
                host: args.host.clone(),
                port: args.port,
                db: args.db,
                password: args.effective_password(),
            },
            error_policy: args.on_error,
            catalogue: args
                .selected_operations()
                .into_iter()
                .map(TaskSpec::new)
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        validate_workers(self.workers)
            .and_then(|_| validate_iterations(self.workers, self.iterations))
            .map_err(|e| BenchError::InvalidConfig(e.to_string()))?;
        if self.catalogue.is_empty() {
            return Err(BenchError::InvalidConfig(
                "at least one task must be selected".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for BenchmarkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tasks: Vec<&str> = self.catalogue.iter().map(|t| t.name.as_str()).collect();
        writeln!(
            f,
            "-----------------------------------------------------------------"
        )?;
        writeln!(
            f,
            "  Target:             {}:{} (db {})",
            self.connection.host, self.connection.port, self.connection.db
        )?;
        writeln!(f, "  Workers:            {}", self.workers)?;
        writeln!(f, "  Iterations:         {}", self.iterations)?;
        writeln!(f, "  On Error:           {}", self.error_policy)?;
        writeln!(f, "  Tasks:              {}", tasks.join(", "))?;
        write!(
            f,
            "-----------------------------------------------------------------"
        )
    }
}

/// Worker pool orchestrator for a single task category
pub struct BenchmarkRunner<'a, F> {
    config: &'a BenchmarkConfig,
    factory: F,
}

impl<'a, F: ClientFactory> BenchmarkRunner<'a, F> {
    pub fn new(config: &'a BenchmarkConfig, factory: F) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        self.config
    }

    /// Run `task` on every worker concurrently and time the whole batch
    ///
    /// ## Returns
    /// - `Ok(BenchmarkResult)`: All workers finished their loops
    /// - `Err(BenchError::Connection)`: A client could not be created; no worker was launched
    /// - `Err(BenchError::Operation)`: A worker's store call failed under `ErrorPolicy::Abort`
    /// - `Err(BenchError::WorkerPanicked)`: A worker task panicked
    ///
    /// No timing is reported for a failed run.
    ///
    /// Under `ErrorPolicy::Abort` a failing worker stops only itself. The
    /// remaining workers run their loops to completion before the error is
    /// returned, and every client is released either way.
    pub async fn run_task(&self, task: &TaskSpec) -> Result<BenchmarkResult, BenchError> {
        let workers = self.config.workers;
        let iterations = self.config.iterations;
        info!(
            "Running {} with {} workers x {} iterations",
            task.name, workers, iterations
        );

        let (signal, mut completions) = mpsc::channel::<()>(workers.max(1));
        let clients = self.connect_clients(task).await?;

        let start = Instant::now();
        let handles: Vec<_> = clients
            .into_iter()
            .enumerate()
            .map(|(index, client)| {
                let ctx = WorkerContext::new(
                    index,
                    task.operation,
                    client,
                    iterations,
                    self.config.error_policy,
                );
                tokio::spawn(run_worker(task.operation, ctx, signal.clone()))
            })
            .collect();
        // Only workers hold senders now, so the channel closes if they all exit
        drop(signal);

        let mut received = 0;
        while received < workers {
            match completions.recv().await {
                Some(()) => received += 1,
                None => break,
            }
        }
        let elapsed = start.elapsed();
        debug!(
            "{}: received {}/{} completion tokens in {:?}",
            task.name, received, workers, elapsed
        );

        let mut failed_ops = 0;
        let mut failure = None;
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(exit) => {
                    match exit.outcome {
                        Ok(failed) => failed_ops += failed,
                        Err(source) => {
                            error!("{}: worker {} failed: {}", task.name, exit.index, source);
                            if failure.is_none() {
                                failure = Some(BenchError::Operation {
                                    task: task.name.clone(),
                                    worker: exit.index,
                                    source,
                                });
                            }
                        }
                    }
                    release_client(&task.name, exit.index, exit.client).await;
                }
                Err(join_error) => {
                    error!("{}: worker {} did not finish: {}", task.name, index, join_error);
                    if failure.is_none() {
                        failure = Some(BenchError::WorkerPanicked {
                            task: task.name.clone(),
                            worker: index,
                        });
                    }
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        Ok(BenchmarkResult::new(
            &task.name,
            workers,
            iterations,
            failed_ops,
            elapsed,
        ))
    }

    /// Connect one client per worker, releasing any already made on failure
    async fn connect_clients(
        &self,
        task: &TaskSpec,
    ) -> Result<Vec<Box<dyn StoreClient>>, BenchError> {
        let mut clients = Vec::with_capacity(self.config.workers);
        for worker in 0..self.config.workers {
            match self.factory.connect().await {
                Ok(client) => clients.push(client),
                Err(source) => {
                    error!(
                        "{}: error creating client for worker {}: {}",
                        task.name, worker, source
                    );
                    for (index, client) in clients.into_iter().enumerate() {
                        release_client(&task.name, index, client).await;
                    }
                    return Err(BenchError::Connection {
                        task: task.name.clone(),
                        worker,
                        source,
                    });
                }
            }
        }
        debug!("{}: connected {} clients", task.name, clients.len());
        Ok(clients)
    }
}

/// Quit a client, logging instead of failing
async fn release_client(task: &str, worker: usize, mut client: Box<dyn StoreClient>) {
    if let Err(e) = client.quit().await {
        warn!("{}: failed to release client for worker {}: {}", task, worker, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::MockFactory;
    use crate::task::Operation;
    use clap::Parser;

    fn test_config(workers: usize, iterations: usize, operations: &[Operation]) -> BenchmarkConfig {
        BenchmarkConfig {
            workers,
            iterations,
            connection: ConnectionSpec::default(),
            error_policy: ErrorPolicy::Abort,
            catalogue: operations.iter().copied().map(TaskSpec::new).collect(),
        }
    }

    #[test]
    fn test_benchmark_config_creation() {
        let args = Args::parse_from(["redis-bench", "-w", "4", "-n", "100", "-t", "set", "get"]);
        let config = BenchmarkConfig::from_args(&args).unwrap();

        assert_eq!(config.workers, 4);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.connection.db, 13);
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert_eq!(
            config.catalogue,
            vec![TaskSpec::new(Operation::Set), TaskSpec::new(Operation::Get)]
        );
    }

    #[test]
    fn test_benchmark_config_rejects_zero_workers() {
        let args = Args::parse_from(["redis-bench", "-w", "0"]);
        let err = BenchmarkConfig::from_args(&args).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }

    #[test]
    fn test_benchmark_config_display() {
        let config = test_config(2, 10, &[Operation::Ping, Operation::Set]);
        let text = config.to_string();
        assert!(text.contains("Workers:            2"));
        assert!(text.contains("Tasks:              PING, SET"));
    }

    #[tokio::test]
    async fn test_run_task_incr_scenario() {
        let config = test_config(3, 5, &[Operation::Incr]);
        let factory = MockFactory::new();
        let runner = BenchmarkRunner::new(&config, factory.clone());

        let result = runner.run_task(&TaskSpec::new(Operation::Incr)).await.unwrap();

        assert_eq!(result.task, "INCR");
        assert_eq!(result.total_ops, 15);
        assert_eq!(result.failed_ops, 0);

        let state = factory.state.lock().unwrap();
        assert_eq!(state.connected, 3);
        assert_eq!(state.quit, 3);
        for key in ["ctr-0", "ctr-1", "ctr-2"] {
            assert_eq!(state.counters.get(key), Some(&5), "counter {}", key);
        }
        assert_eq!(state.counters.len(), 3);
    }

    #[tokio::test]
    async fn test_run_task_zero_iterations() {
        let config = test_config(1, 0, &[Operation::Ping]);
        let factory = MockFactory::new();
        let runner = BenchmarkRunner::new(&config, factory.clone());

        let result = runner.run_task(&TaskSpec::new(Operation::Ping)).await.unwrap();

        assert_eq!(result.total_ops, 0);
        assert_eq!(factory.state.lock().unwrap().pings, 0);
    }

    #[tokio::test]
    async fn test_run_task_connection_failure_launches_nothing() {
        let config = test_config(5, 10, &[Operation::Set]);
        let factory = MockFactory::failing_connect_at(2);
        let runner = BenchmarkRunner::new(&config, factory.clone());

        let err = runner.run_task(&TaskSpec::new(Operation::Set)).await.unwrap_err();

        match err {
            BenchError::Connection { task, worker, .. } => {
                assert_eq!(task, "SET");
                assert_eq!(worker, 2);
            }
            other => panic!("unexpected error: {}", other),
        }
        let state = factory.state.lock().unwrap();
        assert!(state.calls.is_empty());
        assert_eq!(state.connected, 2);
        assert_eq!(state.quit, 2);
    }

    #[tokio::test]
    async fn test_run_task_operation_failure_reports_worker() {
        let config = test_config(4, 10, &[Operation::Lpush]);
        let factory = MockFactory::with_failing_clients(vec![1, 3]);
        let runner = BenchmarkRunner::new(&config, factory.clone());

        let err = runner.run_task(&TaskSpec::new(Operation::Lpush)).await.unwrap_err();

        match err {
            BenchError::Operation { task, worker, .. } => {
                assert_eq!(task, "LPUSH");
                assert_eq!(worker, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
        // Healthy workers still ran to completion and every client was released
        let state = factory.state.lock().unwrap();
        assert_eq!(state.lists.get("list-L-0").map(|l| l.len()), Some(10));
        assert_eq!(state.lists.get("list-L-2").map(|l| l.len()), Some(10));
        assert_eq!(state.quit, 4);
    }

    #[tokio::test]
    async fn test_run_task_count_policy_completes() {
        let mut config = test_config(2, 7, &[Operation::Decr]);
        config.error_policy = ErrorPolicy::Count;
        let factory = MockFactory::with_failing_clients(vec![0]);
        let runner = BenchmarkRunner::new(&config, factory);

        let result = runner.run_task(&TaskSpec::new(Operation::Decr)).await.unwrap();

        assert_eq!(result.total_ops, 14);
        assert_eq!(result.failed_ops, 7);
    }
}
