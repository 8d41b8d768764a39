use crate::task::Operation;
use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Redis Bench - concurrent throughput benchmark for Redis
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Number of concurrent workers, each with its own connection
    #[clap(short = 'w', long, default_value_t = crate::defaults::WORKERS, help_heading = "Core Options")]
    pub workers: usize,

    /// Number of operations each worker performs per task
    #[clap(short = 'n', long, default_value_t = crate::defaults::ITERATIONS, help_heading = "Core Options")]
    pub iterations: usize,

    /// Tasks to run, in order (space-separated; all tasks when omitted)
    #[clap(short = 't', long, value_enum, num_args = 1.., help_heading = "Core Options")]
    pub tasks: Vec<Operation>,

    /// What to do when a store call fails mid-loop
    #[clap(long = "on-error", value_enum, default_value_t = ErrorPolicy::Abort, help_heading = "Core Options")]
    pub on_error: ErrorPolicy,

    /// Redis host
    #[clap(long, default_value = crate::defaults::HOST, help_heading = "Connection")]
    pub host: String,

    /// Redis port
    #[clap(long, default_value_t = crate::defaults::PORT, help_heading = "Connection")]
    pub port: u16,

    /// Logical database selected on every connection
    #[clap(long, default_value_t = crate::defaults::DB, help_heading = "Connection")]
    pub db: i64,

    /// Password sent with AUTH
    #[clap(long, default_value = crate::defaults::PASSWORD, help_heading = "Connection")]
    pub password: String,

    /// Connect without AUTH
    #[clap(long, default_value_t = false, help_heading = "Connection")]
    pub no_password: bool,

    /// Output file for results (JSON format)
    #[clap(short = 'o', long, help_heading = "Output")]
    pub output_file: Option<PathBuf>,

    /// Do not print report blocks to stdout
    #[clap(short = 'q', long, default_value_t = false, help_heading = "Output")]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = ArgAction::Count, help_heading = "Output")]
    pub verbose: u8,

    /// Also write logs to this file
    #[clap(long, help_heading = "Output")]
    pub log_file: Option<PathBuf>,
}

/// Handling of a failed store call inside a worker loop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the worker and abort the whole run
    #[default]
    #[clap(name = "abort")]
    Abort,

    /// Count the failed call and keep going
    #[clap(name = "count")]
    Count,
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::Abort => write!(f, "abort"),
            ErrorPolicy::Count => write!(f, "count"),
        }
    }
}

impl Args {
    /// Tasks to run, expanding an empty selection to the full catalogue
    pub fn selected_operations(&self) -> Vec<Operation> {
        if self.tasks.is_empty() {
            Operation::ALL.to_vec()
        } else {
            self.tasks.clone()
        }
    }

    /// Password to authenticate with, if any
    pub fn effective_password(&self) -> Option<String> {
        if self.no_password || self.password.is_empty() {
            None
        } else {
            Some(self.password.clone())
        }
    }
}
