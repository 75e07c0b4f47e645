//! I/O error helpers.
//!
//! Wraps io::Error into [`Error::Filesystem`] with the operation, the path and a
//! platform-aware hint, usable directly with `map_err`:
//!
//!   fs::remove_dir(dir).map_err(fs_error("remove directory", dir))?;

use std::io;
use std::path::Path;

use crate::errors::Error;

/// Format a human-friendly message with op/path plus platform-aware hints.
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    msg.push_str("; permission denied, check ownership and write permissions.");
                }
                libc::EXDEV => {
                    msg.push_str("; cross-filesystem, atomic rename not possible.");
                }
                libc::ENOENT => {
                    msg.push_str("; path not found, verify it exists.");
                }
                libc::EEXIST => {
                    msg.push_str("; already exists.");
                }
                libc::EISDIR => {
                    msg.push_str("; destination is a directory and cannot be overwritten by a file.");
                }
                libc::ENOTEMPTY => {
                    msg.push_str("; directory not empty.");
                }
                libc::ENOSPC => {
                    msg.push_str("; insufficient space on device.");
                }
                libc::EROFS => {
                    msg.push_str("; read-only filesystem.");
                }
                libc::ENAMETOOLONG => {
                    msg.push_str("; filename or path too long.");
                }
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => msg.push_str("; access denied, check permissions."),
                17 => msg.push_str("; not same device, cross-filesystem move."),
                32 => msg.push_str("; sharing violation, file is in use."),
                2 | 3 => msg.push_str("; path not found, verify it exists."),
                112 => msg.push_str("; insufficient disk space."),
                206 => msg.push_str("; filename or path too long."),
                _ => {}
            }
        }
        msg.push_str(&format!(" [os code: {}]", code));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => {
                msg.push_str("; permission denied, check ownership and write permissions.");
            }
            io::ErrorKind::NotFound => {
                msg.push_str("; path not found, verify it exists.");
            }
            io::ErrorKind::AlreadyExists => {
                msg.push_str("; already exists.");
            }
            _ => {}
        }
    }

    msg
}

/// Returns a closure suitable for `.map_err(...)` that converts io::Error into
/// [`Error::Filesystem`].
pub(crate) fn fs_error<'a>(
    op: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> Error + 'a {
    move |e: io::Error| Error::Filesystem {
        op,
        path: path.to_path_buf(),
        message: build_message(op, path, &e),
        source: e,
    }
}
