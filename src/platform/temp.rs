use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hidden sibling of `target` for write-then-rename:
/// `.relocate.tmp.<pid>.<nanos>.<seq>`.
pub(crate) fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = format!(".relocate.tmp.{pid}.{nanos}.{seq}");
    target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(name)
}
