//! Selective tar extraction.
//!
//! Entries are visited in archive order. An entry is extracted when its name
//! (directories always carry a trailing '/') starts with the prefix
//! filter and, unless the policy is Overwrite, nothing exists yet at
//! `target/<name>`. Paths are preserved relative to `target`.
//!
//! Notes:
//! - Any read/unpack error aborts; entries already written stay on disk.
//! - Names are handled as raw header bytes; a non-UTF-8 name is probed at
//!   the same path it is written to.
//! - Entries that would land outside `target` (absolute paths, `..`) are
//!   refused and counted, not fatal.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::kind::ArchiveKind;
use crate::errors::{Error, Result};
use crate::fs_ops::helpers::fs_error;
use crate::fs_ops::{is_occupied, ConflictPolicy, FileEntry};
use crate::shutdown;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Only entries whose name starts with this are extracted ("" = all).
    pub prefix_filter: String,
    /// Overwrite replaces existing targets; any other policy keeps them.
    pub policy: ConflictPolicy,
    pub dry_run: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            prefix_filter: String::new(),
            policy: ConflictPolicy::default(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub extracted: Vec<FileEntry>,
    pub skipped_filter: usize,
    pub skipped_existing: usize,
    pub refused: usize,
    pub dry_run: bool,
}

/// Extract entries of `archive` matching `prefix_filter` into `target`.
pub fn extract(
    archive: &Path,
    target: &Path,
    prefix_filter: &str,
    policy: ConflictPolicy,
) -> Result<ExtractReport> {
    extract_with(
        archive,
        target,
        &ExtractOptions {
            prefix_filter: prefix_filter.to_string(),
            policy,
            dry_run: false,
        },
    )
}

pub fn extract_with(archive: &Path, target: &Path, opts: &ExtractOptions) -> Result<ExtractReport> {
    let file = File::open(archive).map_err(fs_error("open archive", archive))?;
    let mut reader = BufReader::new(file);
    let kind = ArchiveKind::sniff(&mut reader).map_err(fs_error("read archive", archive))?;
    debug!(archive = %archive.display(), %kind, "opened archive");

    if !opts.dry_run {
        fs::create_dir_all(target).map_err(fs_error("create target directory", target))?;
    }

    let mut tar = tar::Archive::new(kind.decoder(reader));
    tar.set_overwrite(true);

    let mut report = ExtractReport {
        dry_run: opts.dry_run,
        ..Default::default()
    };
    let replace = opts.policy.is_overwrite();

    for entry in tar.entries().map_err(fs_error("read archive", archive))? {
        if shutdown::is_requested() {
            return Err(Error::Interrupted);
        }
        let mut entry = entry.map_err(fs_error("read archive entry", archive))?;
        let is_dir = entry.header().entry_type().is_dir();
        let mut raw = entry.path_bytes().into_owned();
        if is_dir && !raw.ends_with(b"/") {
            raw.push(b'/');
        }

        if !raw.starts_with(opts.prefix_filter.as_bytes()) {
            report.skipped_filter += 1;
            continue;
        }

        let name = entry_path(trim_dir_marker(&raw));
        if escapes_target(&name) {
            warn!(entry = %name.display(), "refusing entry that escapes the target directory");
            report.refused += 1;
            continue;
        }
        let dest = target.join(&name);
        if is_dir && dest.is_dir() {
            // Nothing to do; not a conflict.
            continue;
        }
        if !replace && is_occupied(&dest)? {
            debug!(entry = %name.display(), dest = %dest.display(), "target exists; skipping");
            report.skipped_existing += 1;
            continue;
        }

        let record = if is_dir {
            FileEntry::directory(name.clone())
        } else {
            FileEntry::file(name.clone())
        };

        if opts.dry_run {
            info!(entry = %name.display(), dest = %dest.display(), "dry-run: would extract");
            report.extracted.push(record);
            continue;
        }

        let unpacked = entry
            .unpack_in(target)
            .map_err(fs_error("extract entry", &dest))?;
        if !unpacked {
            warn!(entry = %name.display(), "refusing entry that escapes the target directory");
            report.refused += 1;
            continue;
        }
        debug!(entry = %name.display(), dest = %dest.display(), "extracted");
        report.extracted.push(record);
    }

    info!(
        archive = %archive.display(),
        target = %target.display(),
        extracted = report.extracted.len(),
        skipped_existing = report.skipped_existing,
        skipped_filter = report.skipped_filter,
        "Extraction finished"
    );
    Ok(report)
}

fn escapes_target(name: &Path) -> bool {
    name.components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

/// Entry name without the trailing '/' directory marker.
fn trim_dir_marker(raw: &[u8]) -> &[u8] {
    let end = raw.iter().rposition(|&b| b != b'/').map_or(0, |i| i + 1);
    if end == 0 { raw } else { &raw[..end] }
}

/// Header bytes as a path, exactly as `unpack_in` will write them.
#[cfg(unix)]
fn entry_path(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn entry_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
