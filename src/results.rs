use crate::benchmark::BenchmarkConfig;
use crate::utils::{format_duration, format_ops_rate};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Timing of one completed task run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub task: String,
    pub workers: usize,
    pub iterations: usize,
    /// Always `workers × iterations`
    pub total_ops: u64,
    /// Calls that failed under `ErrorPolicy::Count`
    pub failed_ops: u64,
    pub elapsed_ns: u64,
    pub ops_per_second: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl BenchmarkResult {
    pub fn new(
        task: &str,
        workers: usize,
        iterations: usize,
        failed_ops: u64,
        elapsed: Duration,
    ) -> Self {
        let total_ops = workers as u64 * iterations as u64;
        let secs = elapsed.as_secs_f64();
        let ops_per_second = if secs > 0.0 {
            total_ops as f64 / secs
        } else {
            0.0
        };

        Self {
            task: task.to_string(),
            workers,
            iterations,
            total_ops,
            failed_ops,
            elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            ops_per_second,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns)
    }

    /// Elapsed time in whole milliseconds, truncated
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }

    /// Report block printed for this task
    pub fn report(&self) -> String {
        let cmd = format!("concurrent {}", self.task);
        let mut out = String::new();
        out.push_str("---\n");
        out.push_str(&format!("cmd: {}\n", cmd));
        out.push_str(&format!(
            "{} iterations of {} in {} msecs\n",
            self.total_ops,
            cmd,
            self.elapsed_ms()
        ));
        out.push_str(&format!(
            "throughput: {} ({})\n",
            format_ops_rate(self.ops_per_second),
            format_duration(self.elapsed())
        ));
        if self.failed_ops > 0 {
            out.push_str(&format!("failed calls: {}\n", self.failed_ops));
        }
        out
    }
}

/// Banner printed once before the first task
pub fn format_banner(workers: usize, iterations: usize) -> String {
    format!(
        "=== Bench redis ================ {} Concurrent Clients -- {} opts each ---",
        workers, iterations
    )
}

/// System information recorded with JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
    pub benchmark_version: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: num_cpus::get(),
            benchmark_version: crate::VERSION.to_string(),
        }
    }
}

/// Benchmark metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct BenchmarkMetadata {
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub workers: usize,
    pub iterations: usize,
    pub total_tests: usize,
    pub system_info: SystemInfo,
}

/// Document written to the JSON output file
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalBenchmarkResults {
    pub metadata: BenchmarkMetadata,
    pub results: Vec<BenchmarkResult>,
}

/// Collects results, prints report blocks and writes the JSON output
pub struct ResultsManager {
    output_file: Option<PathBuf>,
    print_reports: bool,
    workers: usize,
    iterations: usize,
    results: Vec<BenchmarkResult>,
}

impl ResultsManager {
    /// Create a results manager, writing JSON to `output_file` if given
    pub fn new(output_file: Option<&Path>) -> Self {
        Self {
            output_file: output_file.map(Path::to_path_buf),
            print_reports: true,
            workers: crate::defaults::WORKERS,
            iterations: crate::defaults::ITERATIONS,
            results: Vec::new(),
        }
    }

    /// Record the run parameters written to the JSON metadata
    pub fn with_config(mut self, config: &BenchmarkConfig) -> Self {
        self.workers = config.workers;
        self.iterations = config.iterations;
        self
    }

    /// Stop printing report blocks to stdout
    pub fn quiet(mut self) -> Self {
        self.print_reports = false;
        self
    }

    /// Record a result and print its report block
    pub fn add_results(&mut self, result: BenchmarkResult) {
        info!(
            "{}: {} ops in {:?}",
            result.task,
            result.total_ops,
            result.elapsed()
        );
        if self.print_reports {
            print!("{}", result.report());
        }
        self.results.push(result);
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// Write the JSON document if an output file was configured
    pub fn finalize(&self) -> Result<()> {
        let Some(ref output_file) = self.output_file else {
            debug!("No output file configured, skipping JSON results");
            return Ok(());
        };

        let final_results = FinalBenchmarkResults {
            metadata: BenchmarkMetadata {
                version: crate::VERSION.to_string(),
                timestamp: chrono::Utc::now(),
                workers: self.workers,
                iterations: self.iterations,
                total_tests: self.results.len(),
                system_info: SystemInfo::collect(),
            },
            results: self.results.clone(),
        };

        let json = serde_json::to_string_pretty(&final_results)?;
        std::fs::write(output_file, json)
            .with_context(|| format!("Failed to write results to {}", output_file.display()))?;

        info!("Results written to: {:?}", output_file);
        Ok(())
    }
}
