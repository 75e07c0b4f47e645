//! Cooperative cancellation.
//! The Ctrl-C handler raises a process-wide flag; flatten and extract check it
//! between entries and stop with `Error::Interrupted`.
//!
//! Notes:
//! - The flag only ever goes from false to true, so relaxed ordering is enough.
//! - The batch fetcher does not consult the flag; in-flight downloads finish.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Raise the flag. Idempotent and safe to call from a signal handler.
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Lower the flag again. Only tests need this.
#[cfg(test)]
pub(crate) fn reset() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}
