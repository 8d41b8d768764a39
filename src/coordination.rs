//! # Benchmark Coordination
//!
//! The driver walks the task catalogue in order. Each task's run is complete
//! (every worker joined, every client released) before the next task connects
//! its first client, so no two categories ever load the store at once.

use crate::{
    benchmark::{BenchmarkConfig, BenchmarkRunner},
    client::ClientFactory,
    error::BenchError,
    results::{BenchmarkResult, ResultsManager},
};
use tracing::{error, info};

/// Runs the configured catalogue sequentially
pub struct BenchmarkDriver<'a, F> {
    runner: BenchmarkRunner<'a, F>,
}

impl<'a, F: ClientFactory> BenchmarkDriver<'a, F> {
    pub fn new(config: &'a BenchmarkConfig, factory: F) -> Self {
        Self {
            runner: BenchmarkRunner::new(config, factory),
        }
    }

    /// Run every task, forwarding each result to `results_manager`
    ///
    /// The first failing task aborts the remaining catalogue, and its error
    /// is returned. Results of tasks that completed before it have already
    /// been forwarded.
    pub async fn run(
        &self,
        results_manager: &mut ResultsManager,
    ) -> Result<Vec<BenchmarkResult>, BenchError> {
        let catalogue = &self.runner.config().catalogue;
        let mut results = Vec::with_capacity(catalogue.len());

        for (i, task) in catalogue.iter().enumerate() {
            info!("Task {}/{}: {}", i + 1, catalogue.len(), task.name);

            let result = match self.runner.run_task(task).await {
                Ok(result) => result,
                Err(e) => {
                    error!(
                        "Benchmark aborted at {}; {} task(s) not run",
                        task.name,
                        catalogue.len() - i - 1
                    );
                    return Err(e);
                }
            };

            results_manager.add_results(result.clone());
            results.push(result);
        }

        info!("All {} tasks completed", results.len());
        Ok(results)
    }
}
