//! In-process name reservations.
//!
//! The existence probe in [`super::resolve_name`] and the write that follows are
//! not atomic. When several tasks of one operation resolve names in the same
//! directory, they serialize through a single mutex here and every handed-out
//! path counts as occupied for later callers, even before anything is written.
//!
//! Other processes can still race us; writers pair a reservation with
//! `create_new` so that loss shows up as an error rather than a clobber.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

use super::duplicate::{is_occupied, resolve_name_with, ConflictPolicy};
use crate::errors::Result;

/// Set of destination paths already promised to a caller.
#[derive(Debug, Default)]
pub struct NameReservations {
    taken: Mutex<HashSet<PathBuf>>,
}

impl NameReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` inside `dir` and reserve the result, under one lock.
    ///
    /// Under `Overwrite` the requested path is returned (and recorded) even if
    /// it is already reserved: overwriting is what the caller asked for.
    pub fn resolve_and_reserve(
        &self,
        dir: &Path,
        name: &OsStr,
        policy: &ConflictPolicy,
    ) -> Result<PathBuf> {
        self.resolve_and_reserve_with(dir, name, policy, |_| false)
    }

    /// Like [`Self::resolve_and_reserve`], but paths for which `vacated`
    /// returns true count as free even if something is still there
    /// (a directory a dry run would have removed).
    pub(crate) fn resolve_and_reserve_with(
        &self,
        dir: &Path,
        name: &OsStr,
        policy: &ConflictPolicy,
        vacated: impl Fn(&Path) -> bool,
    ) -> Result<PathBuf> {
        let mut taken = self.taken.lock().unwrap_or_else(PoisonError::into_inner);
        let resolved = resolve_name_with(dir, name, policy, |p| {
            if taken.contains(p) {
                return Ok(true);
            }
            if vacated(p) {
                return Ok(false);
            }
            is_occupied(p)
        })?;
        let path = dir.join(resolved);
        trace!(path = %path.display(), "reserved destination name");
        taken.insert(path.clone());
        Ok(path)
    }

    /// Forget a reservation (e.g. the write failed and nothing was created).
    pub fn release(&self, path: &Path) {
        let mut taken = self.taken.lock().unwrap_or_else(PoisonError::into_inner);
        taken.remove(path);
    }

    pub fn is_reserved(&self, path: &Path) -> bool {
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }

    pub fn len(&self) -> usize {
        self.taken.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
