//! # Utility Functions and Helper Module
//!
//! Formatters for human-readable report output and validation of the
//! benchmark parameters.
//!
//! ## Usage Examples
//!
//! ```rust
//! use redis_bench::utils::*;
//! use std::time::Duration;
//!
//! # fn main() -> anyhow::Result<()> {
//! let duration_str = format_duration(Duration::from_micros(1500));
//! assert_eq!(duration_str, "1.50ms");
//!
//! let rate_str = format_ops_rate(15500.0);
//! assert_eq!(rate_str, "15.50K ops/s");
//!
//! validate_workers(10)?; // OK
//! # Ok(())
//! # }
//! ```

use anyhow::{bail, Result};
use std::time::Duration;

/// Format a duration for display with an adaptive unit
///
/// ## Examples
///
/// ```rust
/// # use redis_bench::utils::format_duration;
/// # use std::time::Duration;
/// assert_eq!(format_duration(Duration::from_nanos(750)), "750ns");
/// assert_eq!(format_duration(Duration::from_nanos(1250)), "1.25μs");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Format an operation rate using decimal scaling
///
/// ```rust
/// # use redis_bench::utils::format_ops_rate;
/// assert_eq!(format_ops_rate(750.0), "750 ops/s");
/// assert_eq!(format_ops_rate(2300000.0), "2.30M ops/s");
/// ```
pub fn format_ops_rate(ops_per_second: f64) -> String {
    if ops_per_second < 1000.0 {
        format!("{:.0} ops/s", ops_per_second)
    } else if ops_per_second < 1_000_000.0 {
        format!("{:.2}K ops/s", ops_per_second / 1000.0)
    } else {
        format!("{:.2}M ops/s", ops_per_second / 1_000_000.0)
    }
}

/// Validate the worker count. Each worker holds one connection.
pub fn validate_workers(workers: usize) -> Result<()> {
    if workers == 0 {
        bail!("Worker count must be at least 1");
    }
    if workers > crate::defaults::MAX_WORKERS {
        bail!(
            "Worker count {} exceeds the maximum of {}",
            workers,
            crate::defaults::MAX_WORKERS
        );
    }
    Ok(())
}

/// Validate that the total operation count is representable
pub fn validate_iterations(workers: usize, iterations: usize) -> Result<()> {
    let total = (workers as u64).checked_mul(iterations as u64);
    if total.is_none() {
        bail!(
            "{} workers x {} iterations overflows the operation count",
            workers,
            iterations
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::from_micros(1)), "1.00μs");
        assert_eq!(format_duration(Duration::from_millis(1)), "1.00ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.00s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn test_format_ops_rate() {
        assert_eq!(format_ops_rate(0.0), "0 ops/s");
        assert_eq!(format_ops_rate(500.0), "500 ops/s");
        assert_eq!(format_ops_rate(1500.0), "1.50K ops/s");
        assert_eq!(format_ops_rate(1500000.0), "1.50M ops/s");
    }

    #[test]
    fn test_validate_workers() {
        assert!(validate_workers(1).is_ok());
        assert!(validate_workers(10).is_ok());
        assert!(validate_workers(10_000).is_ok());
        assert!(validate_workers(0).is_err());
        assert!(validate_workers(10_001).is_err());
    }

    #[test]
    fn test_validate_iterations() {
        assert!(validate_iterations(10, 0).is_ok());
        assert!(validate_iterations(10, 2000).is_ok());
        assert!(validate_iterations(2, usize::MAX).is_err());
    }
}
