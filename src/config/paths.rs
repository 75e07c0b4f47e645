//! Default path helpers and symlink checks.

use anyhow::{Context, Result};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RELOCATE_CONFIG";

const APP_DIR: &str = "relocate";

/// Config file location: `$RELOCATE_CONFIG` if set (relative paths are taken
/// from the current directory), else `<config_dir>/relocate/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        let p = PathBuf::from(raw);
        if p.is_absolute() {
            return Ok(p);
        }
        let cwd = env::current_dir().context("resolve current directory")?;
        return Ok(cwd.join(p));
    }
    if let Some(base) = config_dir() {
        return Ok(base.join(APP_DIR).join("config.xml"));
    }
    let home = env::var_os("HOME").context("no config directory and HOME is not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join(APP_DIR)
        .join("config.xml"))
}

/// Suggested log file location (`<data_dir>/relocate/relocate.log`).
/// Nothing is created.
pub fn default_log_path() -> Result<PathBuf> {
    if let Some(base) = data_dir() {
        return Ok(base.join(APP_DIR).join("relocate.log"));
    }
    let home = env::var_os("HOME").context("no data directory and HOME is not set")?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join(APP_DIR)
        .join("relocate.log"))
}

/// True if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn env_override_wins_and_relative_is_anchored() {
        // SAFETY: serialized with the other env-touching tests.
        unsafe { env::set_var(CONFIG_ENV, "sub/cfg.xml") };
        let p = default_config_path().unwrap();
        unsafe { env::remove_var(CONFIG_ENV) };
        assert!(p.is_absolute());
        assert!(p.ends_with("sub/cfg.xml"));
    }

    #[test]
    #[serial]
    fn default_location_ends_with_app_dir() {
        unsafe { env::remove_var(CONFIG_ENV) };
        let p = default_config_path().unwrap();
        assert!(p.ends_with("relocate/config.xml"), "{}", p.display());
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinked_ancestor() {
        let td = tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(path_has_symlink_ancestor(&link.join("x.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("x.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("missing/x.log")).unwrap());
    }
}
