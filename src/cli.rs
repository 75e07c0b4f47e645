//! CLI definition and parsing.
//!
//! Notes:
//! - `--debug` is a shorthand for `--log-level debug`.
//! - Logging flags are global and may follow the subcommand.
//! - CLI flags override config values (which are loaded from XML if present).

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::types::{Config, LogLevel};
use crate::errors::Result;
use crate::fs_ops::ConflictPolicy;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Flatten trees, extract archive subsets and fetch URL batches without losing files to name conflicts"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Emit logs in structured JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Also append logs to this file.
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Print the config file location used by relocate and exit.
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Move every file below ROOT directly into ROOT and remove emptied subdirectories.
    Flatten(FlattenArgs),
    /// Extract archive entries whose path starts with a prefix.
    Extract(ExtractArgs),
    /// Download URLs into a directory with bounded concurrency.
    Fetch(FetchArgs),
    /// Write a commented template config file at the config location.
    InitConfig,
}

/// Conflict policy flags shared by all operations.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Replace existing files on name conflicts.
    #[arg(long, conflicts_with = "rename_prefix")]
    pub overwrite: bool,

    /// Keep both files; prepend PREFIX to the newcomer until its name is free.
    #[arg(long, value_name = "PREFIX")]
    pub rename_prefix: Option<String>,
}

impl PolicyArgs {
    /// The policy requested on the command line, if any.
    pub fn requested(&self) -> Result<Option<ConflictPolicy>> {
        if self.overwrite {
            return Ok(Some(ConflictPolicy::Overwrite));
        }
        self.rename_prefix
            .as_deref()
            .map(ConflictPolicy::rename)
            .transpose()
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct FlattenArgs {
    #[arg(value_name = "ROOT", value_hint = ValueHint::DirPath)]
    pub root: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Show what would be done, but do not modify files/directories.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(value_name = "ARCHIVE", value_hint = ValueHint::FilePath)]
    pub archive: PathBuf,

    #[arg(value_name = "TARGET", value_hint = ValueHint::DirPath)]
    pub target: PathBuf,

    /// Only extract entries whose path starts with this (default: everything).
    #[arg(long, value_name = "PREFIX", default_value = "")]
    pub prefix: String,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Show what would be extracted without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    #[arg(value_name = "TARGET", value_hint = ValueHint::DirPath)]
    pub target: PathBuf,

    #[arg(value_name = "URL", value_hint = ValueHint::Url)]
    pub urls: Vec<String>,

    /// Read additional URLs from FILE, one per line ('#' starts a comment).
    #[arg(short = 'i', long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input_file: Option<PathBuf>,

    /// Maximum simultaneous downloads.
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

impl Args {
    /// Precedence: --debug > --log-level > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.clone()
    }

    /// Apply CLI overrides to a loaded Config (in-place). Unset flags are no-ops.
    pub fn apply_overrides(&self, cfg: &mut Config) -> Result<()> {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(path) = &self.log_file {
            cfg.log_file = Some(path.clone());
        }

        let policy_args = match &self.command {
            Some(Command::Flatten(a)) => Some(&a.policy),
            Some(Command::Extract(a)) => Some(&a.policy),
            Some(Command::Fetch(a)) => {
                if let Some(n) = a.concurrency {
                    cfg.concurrency_limit = n;
                }
                if let Some(secs) = a.timeout {
                    cfg.request_timeout = Duration::from_secs(secs);
                }
                Some(&a.policy)
            }
            Some(Command::InitConfig) | None => None,
        };
        if let Some(policy) = policy_args.map(PolicyArgs::requested).transpose()?.flatten() {
            cfg.policy = Some(policy);
        }
        Ok(())
    }
}

pub fn parse() -> Args {
    Args::parse()
}
