//! Core library for `relocate`.
//!
//! Conflict-safe relocation of files on a local filesystem:
//! - [`flatten`] moves every file of a tree into its root,
//! - [`extract`] unpacks the entries of a tar archive matching a path prefix,
//! - [`fetch_all`] downloads a batch of URLs with bounded concurrency.
//!
//! All three decide destination names through one resolver
//! ([`resolve_name`] / [`NameReservations`]) driven by a [`ConflictPolicy`].

pub mod archive;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod shutdown;

pub use archive::{extract, extract_with, ArchiveKind, ExtractOptions, ExtractReport};
pub use config::{default_config_path, default_log_path, path_has_symlink_ancestor, Config, LogLevel};
pub use errors::{Error, ErrorKind, FetchError, Result};
pub use fetch::{
    fetch_all, BatchReport, DownloadTask, FetchOptions, Fetcher, HttpGet, HttpResponse,
    ReqwestClient, TaskOutcome, DEFAULT_CONCURRENCY_LIMIT,
};
pub use fs_ops::{
    flatten, flatten_with, resolve_name, ConflictPolicy, FileEntry, FlattenOptions,
    FlattenReport, MoveRecord, NameReservations, RenamePrefix, DEFAULT_RENAME_PREFIX,
};
