//! Config validation.
//! Rejects values that would only fail later, deep inside an operation.

use anyhow::{bail, Result};
use tracing::debug;

use super::paths::path_has_symlink_ancestor;
use super::types::Config;

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            bail!("concurrency_limit must be at least 1");
        }
        if self.request_timeout.is_zero() {
            bail!("request_timeout_seconds must be at least 1");
        }
        if let Some(log) = &self.log_file {
            if log.as_os_str().is_empty() {
                bail!("log_file must not be empty");
            }
            if matches!(path_has_symlink_ancestor(log), Ok(true)) {
                bail!(
                    "log_file '{}' has a symlinked ancestor; refusing",
                    log.display()
                );
            }
        }
        debug!(
            policy = ?self.policy,
            concurrency_limit = self.concurrency_limit,
            request_timeout_secs = self.request_timeout.as_secs(),
            "config validated"
        );
        Ok(())
    }
}
