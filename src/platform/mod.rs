//! Platform-specific helpers for the config and log files.
//! Unix gets 0600/0700 modes and a durable atomic write; Windows gets the
//! same API with best-effort semantics.

mod temp;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{open_log_file_secure_append, set_dir_mode_0700, write_config_secure_new_0600};

#[cfg(not(unix))]
pub use windows::{open_log_file_secure_append, set_dir_mode_0700, write_config_secure_new_0600};

pub(crate) use temp::tmp_sibling_name;
