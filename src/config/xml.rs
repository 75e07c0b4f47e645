//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request (`relocate init-config`).
//!
//! Notes:
//! - Unknown elements are rejected so typos surface instead of being ignored.
//! - A missing file is not an error; defaults apply.

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use crate::fetch::{DEFAULT_CONCURRENCY_LIMIT, DEFAULT_REQUEST_TIMEOUT};
use crate::fs_ops::{ConflictPolicy, DEFAULT_RENAME_PREFIX};
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Mirror of the XML document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(default)]
    policy: Option<String>,
    #[serde(default)]
    rename_prefix: Option<String>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    concurrency_limit: Option<usize>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    request_timeout_seconds: Option<u64>,
    #[serde(default)]
    log_level: Option<String>,
    #[serde(default)]
    log_file: Option<String>,
}

/// Optional number with surrounding whitespace allowed; garbage is an error.
fn de_trimmed_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    let prefix = non_empty(parsed.rename_prefix.as_deref());
    cfg.policy = match (non_empty(parsed.policy.as_deref()), prefix) {
        (None, None) => None,
        (None, Some(p)) => Some(ConflictPolicy::rename(p)?),
        (Some(kind), None) => Some(kind.parse::<ConflictPolicy>()?),
        (Some(kind), Some(p)) => match kind.parse::<ConflictPolicy>()? {
            ConflictPolicy::Overwrite => {
                bail!("rename_prefix '{p}' is set but policy is overwrite")
            }
            ConflictPolicy::Rename(_) => Some(ConflictPolicy::rename(p)?),
        },
    };

    if let Some(n) = parsed.concurrency_limit {
        cfg.concurrency_limit = n;
    }
    if let Some(secs) = parsed.request_timeout_seconds {
        cfg.request_timeout = Duration::from_secs(secs);
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)?;
    }
    cfg.log_file = non_empty(parsed.log_file.as_deref()).map(PathBuf::from);

    cfg.validate()?;
    Ok(cfg)
}

/// Load a Config from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid config xml '{}'", path.display()))
}

/// Load from the default location (honouring `RELOCATE_CONFIG`).
/// Returns the defaults when no file exists there.
pub fn load_config() -> Result<Config> {
    let path = default_config_path()?;
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Config::default());
    }
    debug!(path = %path.display(), "loading config");
    load_config_from_xml_path(&path)
}

/// Write a commented template config at `path`. Fails if it already exists or
/// any ancestor is a symlink.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/relocate.log".into());

    let content = format!(
        "<!--\n  relocate configuration (XML). CLI flags override these values.\n\n    policy                  -> overwrite | rename (omit to use each command's default)\n    rename_prefix           -> prefix prepended on name conflicts under rename\n    concurrency_limit       -> max simultaneous downloads for `fetch`\n    request_timeout_seconds -> per-request timeout for `fetch`\n    log_level               -> quiet | normal | info | debug\n    log_file                -> optional log file (console output is kept)\n-->\n<config>\n  <policy>rename</policy>\n  <rename_prefix>{}</rename_prefix>\n  <concurrency_limit>{}</concurrency_limit>\n  <request_timeout_seconds>{}</request_timeout_seconds>\n  <log_level>normal</log_level>\n  <!-- <log_file>{}</log_file> -->\n</config>\n",
        DEFAULT_RENAME_PREFIX,
        DEFAULT_CONCURRENCY_LIMIT,
        DEFAULT_REQUEST_TIMEOUT.as_secs(),
        suggested_log,
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    info!(path = %path.display(), "Created template config");
    Ok(())
}
