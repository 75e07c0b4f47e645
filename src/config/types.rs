//! Core configuration types.
//! - Config holds runtime settings with defaults.
//! - LogLevel is the user-facing verbosity.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::fetch::{FetchOptions, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_REQUEST_TIMEOUT};
use crate::fs_ops::ConflictPolicy;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// Per-entry detail
    Info,
    /// Everything, including name probes
    Debug,
}

impl LogLevel {
    /// Case-insensitive, with a few aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Conflict policy for every operation. `None` lets each operation use its
    /// own default (flatten: overwrite; extract and fetch: rename with `cp_`).
    pub policy: Option<ConflictPolicy>,
    pub concurrency_limit: usize,
    pub request_timeout: Duration,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: None,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_level: LogLevel::Normal,
            log_file: None,
        }
    }
}

impl Config {
    /// Configured policy, or `default` when none was set.
    pub fn policy_or(&self, default: ConflictPolicy) -> ConflictPolicy {
        self.policy.clone().unwrap_or(default)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            policy: self.policy_or(ConflictPolicy::default()),
            concurrency_limit: self.concurrency_limit,
            request_timeout: self.request_timeout,
        }
    }
}
