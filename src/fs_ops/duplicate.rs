//! Duplicate-name resolution.
//!
//! Policy:
//! - Overwrite: return the requested name; the caller replaces whatever is there.
//! - Rename(prefix): prepend `prefix` until the name is free
//!   ("a.txt" -> "cp_a.txt" -> "cp_cp_a.txt" ...).
//!
//! Notes:
//! - This only decides a name from current filesystem state. Callers running
//!   concurrently inside one process go through [`super::NameReservations`].

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use tracing::trace;

use super::helpers::fs_error;
use crate::errors::{Error, Result};

/// Prefix used when none is configured.
pub const DEFAULT_RENAME_PREFIX: &str = "cp_";

/// A non-empty prefix for [`ConflictPolicy::Rename`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenamePrefix(String);

impl RenamePrefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::InvalidPolicy(
                "rename prefix must not be empty".into(),
            ));
        }
        if prefix.contains(['/', '\\', '\0']) {
            return Err(Error::InvalidPolicy(format!(
                "rename prefix '{prefix}' must not contain path separators"
            )));
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RenamePrefix {
    fn default() -> Self {
        Self(DEFAULT_RENAME_PREFIX.to_string())
    }
}

impl fmt::Display for RenamePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happens when a destination name is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConflictPolicy {
    /// Reuse the name; existing content is replaced.
    Overwrite,
    /// Prefix the name repeatedly until it is free.
    Rename(RenamePrefix),
}

impl ConflictPolicy {
    /// Build a `Rename` policy, failing on an empty prefix.
    pub fn rename(prefix: impl Into<String>) -> Result<Self> {
        RenamePrefix::new(prefix).map(ConflictPolicy::Rename)
    }

    pub fn is_overwrite(&self) -> bool {
        matches!(self, ConflictPolicy::Overwrite)
    }
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::Rename(RenamePrefix::default())
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Overwrite => f.write_str("overwrite"),
            ConflictPolicy::Rename(p) => write!(f, "rename:{p}"),
        }
    }
}

/// Accepts `overwrite`, `rename` (default prefix) or `rename:<prefix>`.
impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => return Ok(ConflictPolicy::Overwrite),
            "rename" => return Ok(ConflictPolicy::default()),
            _ => {}
        }
        match s.split_once(':') {
            Some((kind, prefix)) if kind.eq_ignore_ascii_case("rename") => {
                ConflictPolicy::rename(prefix)
            }
            _ => Err(Error::InvalidPolicy(format!(
                "unknown policy '{s}' (expected overwrite, rename or rename:<prefix>)"
            ))),
        }
    }
}

/// True if anything (file, directory, dangling symlink) occupies `path`.
pub(crate) fn is_occupied(path: &Path) -> Result<bool> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(fs_error("probe destination", path)(e)),
    }
}

/// Compute the final file name inside `dir` for `name` under `policy`.
///
/// The returned name did not exist at call time (Rename) or is `name` itself
/// (Overwrite). Only performs existence probes.
pub fn resolve_name(dir: &Path, name: &OsStr, policy: &ConflictPolicy) -> Result<OsString> {
    resolve_name_with(dir, name, policy, is_occupied)
}

/// Same as [`resolve_name`] with a caller-supplied occupancy probe.
pub(crate) fn resolve_name_with(
    dir: &Path,
    name: &OsStr,
    policy: &ConflictPolicy,
    occupied: impl Fn(&Path) -> Result<bool>,
) -> Result<OsString> {
    let prefix = match policy {
        ConflictPolicy::Overwrite => return Ok(name.to_os_string()),
        ConflictPolicy::Rename(prefix) => prefix,
    };

    let mut candidate = name.to_os_string();
    let mut collisions = 0u32;
    loop {
        let path = dir.join(&candidate);
        if !occupied(&path)? {
            return Ok(candidate);
        }
        collisions = collisions.saturating_add(1);
        if collisions == 3 {
            trace!(name = ?name, dir = %dir.display(), "duplicate: multiple collisions, still prefixing");
        }
        let mut next = OsString::from(prefix.as_str());
        next.push(&candidate);
        if name_len_units(&next) > MAX_FILENAME_LEN {
            return Err(fs_error("resolve free name", &dir.join(&candidate))(
                name_too_long(),
            ));
        }
        candidate = next;
    }
}

#[cfg(windows)]
const MAX_FILENAME_LEN: usize = 240;
#[cfg(not(windows))]
const MAX_FILENAME_LEN: usize = 255;

#[cfg(unix)]
fn name_len_units(s: &OsStr) -> usize {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().len()
}

#[cfg(not(unix))]
fn name_len_units(s: &OsStr) -> usize {
    s.to_string_lossy().len()
}

#[cfg(unix)]
fn name_too_long() -> io::Error {
    io::Error::from_raw_os_error(libc::ENAMETOOLONG)
}

#[cfg(not(unix))]
fn name_too_long() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "file name too long")
}
