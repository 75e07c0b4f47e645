//! Directory flattening.
//!
//! Every file below `root` is moved directly into `root`, then the emptied
//! subdirectories are removed. The tree is snapshotted in post-order before
//! anything moves, so a directory is only visited once all of its contents
//! (including nested directories) have been drained.
//!
//! Notes:
//! - The first filesystem error aborts; already-moved files stay where they are.
//! - Symlinks are moved as links and never followed.
//! - Running it again on a flat root is a no-op.
//! - A file whose name is held by a top-level directory that is still being
//!   drained waits until that directory is gone, so the name counts as free.

use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::atomic::move_file;
use super::duplicate::{is_occupied, ConflictPolicy};
use super::entry::FileEntry;
use super::helpers::fs_error;
use super::reserve::NameReservations;
use crate::errors::{Error, Result};
use crate::platform::tmp_sibling_name;
use crate::shutdown;

/// Options for [`flatten_with`].
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub policy: ConflictPolicy,
    /// Log the planned moves/removals without touching the filesystem.
    pub dry_run: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            policy: ConflictPolicy::Overwrite,
            dry_run: false,
        }
    }
}

/// A file relocated into the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// An existing entry at `dest` was replaced (Overwrite only).
    pub replaced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FlattenReport {
    pub root: PathBuf,
    pub moved: Vec<MoveRecord>,
    /// Files that already lived directly under the root.
    pub already_flat: usize,
    pub removed_dirs: Vec<PathBuf>,
    pub dry_run: bool,
}

impl FlattenReport {
    /// Nothing was (or would be) changed.
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty() && self.removed_dirs.is_empty()
    }
}

/// Flatten `root` with `policy`. See [`flatten_with`].
pub fn flatten(root: &Path, policy: ConflictPolicy) -> Result<FlattenReport> {
    flatten_with(
        root,
        &FlattenOptions {
            policy,
            dry_run: false,
        },
    )
}

/// Move every file below `root` into `root` and remove the emptied directories.
pub fn flatten_with(root: &Path, opts: &FlattenOptions) -> Result<FlattenReport> {
    let root = canonical_root(root)?;
    let worklist = snapshot(&root)?;
    debug!(root = %root.display(), entries = worklist.len(), "flatten worklist built");

    let mut run = Flattener {
        root: root.clone(),
        opts,
        reservations: NameReservations::new(),
        vacated: HashSet::new(),
        report: FlattenReport {
            root: root.clone(),
            dry_run: opts.dry_run,
            ..Default::default()
        },
    };

    // Top-level directories still to be drained, and the files waiting for
    // their name.
    let mut blocking: HashSet<OsString> = worklist
        .iter()
        .filter(|e| e.is_directory && e.depth() == 1)
        .map(|e| e.relative_path.as_os_str().to_os_string())
        .collect();
    let mut deferred: HashMap<OsString, Vec<(PathBuf, PathBuf)>> = HashMap::new();

    for entry in worklist {
        if shutdown::is_requested() {
            return Err(Error::Interrupted);
        }
        let abs = root.join(entry.path());

        if entry.is_directory {
            run.remove_dir(&abs)?;
            if entry.depth() == 1 {
                let name = entry.relative_path.into_os_string();
                run.vacated.insert(abs);
                blocking.remove(&name);
                for (source, current) in deferred.remove(&name).unwrap_or_default() {
                    run.relocate(source, &current, &name)?;
                }
            }
            continue;
        }

        let Some(name) = abs.file_name().map(|n| n.to_os_string()) else {
            continue;
        };
        if abs == root.join(&name) {
            run.report.already_flat += 1;
            continue;
        }

        if blocking.contains(&name) {
            let current = run.stage_inside(&abs, &name)?;
            debug!(src = %abs.display(), "name held by an undrained directory; deferring");
            deferred.entry(name).or_default().push((abs, current));
            continue;
        }
        run.relocate(abs.clone(), &abs, &name)?;
    }

    let report = run.report;
    info!(
        root = %root.display(),
        moved = report.moved.len(),
        removed_dirs = report.removed_dirs.len(),
        dry_run = opts.dry_run,
        "Flatten finished"
    );
    Ok(report)
}

struct Flattener<'a> {
    root: PathBuf,
    opts: &'a FlattenOptions,
    reservations: NameReservations,
    /// Directories already removed (or, in a dry run, that would be).
    vacated: HashSet<PathBuf>,
    report: FlattenReport,
}

impl Flattener<'_> {
    fn remove_dir(&mut self, dir: &Path) -> Result<()> {
        if self.opts.dry_run {
            info!(dir = %dir.display(), "dry-run: would remove directory");
        } else {
            fs::remove_dir(dir).map_err(fs_error("remove directory", dir))?;
            debug!(dir = %dir.display(), "removed emptied directory");
        }
        self.report.removed_dirs.push(dir.to_path_buf());
        Ok(())
    }

    /// A deferred file living inside the very directory that blocks its name
    /// would keep that directory from being removed; park it in the root
    /// under a hidden temporary name. Returns where the file now is.
    fn stage_inside(&self, abs: &Path, name: &OsStr) -> Result<PathBuf> {
        let blocker = self.root.join(name);
        if self.opts.dry_run || !abs.starts_with(&blocker) {
            return Ok(abs.to_path_buf());
        }
        let staged = tmp_sibling_name(&blocker);
        move_file(abs, &staged)?;
        Ok(staged)
    }

    /// Move `current` (originally `source`) to its resolved name in the root.
    fn relocate(&mut self, source: PathBuf, current: &Path, name: &OsStr) -> Result<()> {
        let vacated = &self.vacated;
        let dest = self.reservations.resolve_and_reserve_with(
            &self.root,
            name,
            &self.opts.policy,
            |p| vacated.contains(p),
        )?;
        let on_disk = if self.opts.dry_run && self.vacated.contains(&dest) {
            false
        } else {
            is_occupied(&dest)?
        };
        let replaced = self.opts.policy.is_overwrite() && on_disk;
        if replaced {
            warn!(src = %source.display(), dest = %dest.display(), "overwriting existing file");
        }

        if self.opts.dry_run {
            info!(src = %source.display(), dest = %dest.display(), "dry-run: would move file");
        } else {
            move_file(current, &dest)?;
            info!(src = %source.display(), dest = %dest.display(), "Moved file into root");
        }
        self.report.moved.push(MoveRecord {
            source,
            dest,
            replaced,
        });
        Ok(())
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    let meta = match fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }
        Err(e) => return Err(fs_error("stat root", root)(e)),
    };
    if !meta.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }
    dunce::canonicalize(root).map_err(fs_error("canonicalize root", root))
}

/// Post-order listing of everything below `root`, relative to `root`.
/// Fully collected before the caller mutates anything.
fn snapshot(root: &Path) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for item in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .sort_by_file_name()
    {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let io_err = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("directory walk failed"));
            fs_error("list directory", &path)(io_err)
        })?;
        let rel = item
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| item.path().to_path_buf());
        if item.file_type().is_dir() {
            entries.push(FileEntry::directory(rel));
        } else {
            entries.push(FileEntry::file(rel));
        }
    }
    Ok(entries)
}
