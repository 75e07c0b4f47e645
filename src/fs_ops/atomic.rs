//! Rename-based file move.
//! - Same filesystem: a single rename (replaces an existing file on Unix).
//! - On Windows, removes an existing destination first (rename doesn't overwrite there).
//! - Cross-filesystem: copy to the destination, then remove the source.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use super::helpers::fs_error;
use crate::errors::Result;

pub(crate) fn move_file(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        if dst.is_file() {
            if let Err(e) = fs::remove_file(dst) {
                if e.kind() != io::ErrorKind::NotFound {
                    return Err(fs_error("remove existing destination", dst)(e));
                }
            }
        }
    }

    match fs::rename(src, dst) {
        Ok(()) => {
            debug!(src = %src.display(), dest = %dst.display(), "renamed");
            Ok(())
        }
        Err(e) if is_cross_device(&e) => {
            warn!(src = %src.display(), dest = %dst.display(), "cross-device rename; copying instead");
            copy_then_remove(src, dst)
        }
        Err(e) => Err(fs_error("move file", dst)(e)),
    }
}

fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(fs_error("stat source", src))?;
    if meta.file_type().is_symlink() {
        let target = fs::read_link(src).map_err(fs_error("read symlink", src))?;
        remove_if_present(dst)?;
        make_symlink(&target, dst).map_err(fs_error("create symlink", dst))?;
    } else {
        fs::copy(src, dst).map_err(fs_error("copy file to destination", dst))?;
    }
    fs::remove_file(src).map_err(fs_error("remove original file", src))?;
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_error("remove existing destination", path)(e)),
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// std::io::ErrorKind::CrossesDevices is recent, so match raw codes.
fn is_cross_device(e: &io::Error) -> bool {
    match e.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc::EXDEV,
        #[cfg(windows)]
        Some(code) => code == 17,
        #[cfg(not(any(unix, windows)))]
        Some(_) => false,
        None => false,
    }
}
