//! # Redis Bench - Main Entry Point
//!
//! Runs the concurrent throughput benchmark against a Redis server:
//!
//! 1. **Parse arguments**: Worker count, iterations, target and task selection
//! 2. **Initialize logging**: Colorized stderr diagnostics, optional log file
//! 3. **Create benchmark config**: Validated once, then shared by reference
//! 4. **Run the catalogue**: One task category at a time, each fully concurrent
//! 5. **Finalize results**: Optional JSON output
//!
//! ## Error Handling
//!
//! Any connection or operation failure aborts the run. The error names the
//! task and worker, no report is printed for that task or any later one, and
//! the process exits with a non-zero status.

use anyhow::{Context, Result};
use clap::Parser;
use redis_bench::{
    benchmark::BenchmarkConfig,
    cli::Args,
    client::RedisClientFactory,
    coordination::BenchmarkDriver,
    logging::init_logging,
    results::{format_banner, ResultsManager},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Held until exit so the file appender flushes
    let _log_guard = init_logging(args.verbose, args.log_file.as_deref())?;

    info!("Starting Redis Bench {}", redis_bench::VERSION);

    let config = BenchmarkConfig::from_args(&args).context("Invalid benchmark configuration")?;
    info!("\n{}", config);

    let mut results_manager =
        ResultsManager::new(args.output_file.as_deref()).with_config(&config);
    if args.quiet {
        results_manager = results_manager.quiet();
    }

    println!(
        "\n\n{} \n",
        format_banner(config.workers, config.iterations)
    );

    let factory = RedisClientFactory::new(config.connection.clone());
    let driver = BenchmarkDriver::new(&config, factory);
    driver
        .run(&mut results_manager)
        .await
        .context("Benchmark aborted")?;

    results_manager.finalize()?;

    info!("Redis Bench completed successfully");
    Ok(())
}
