//! Archive extraction (tar, tar.gz, tar.bz2, tar.xz).

mod extract;
mod kind;

pub use extract::{extract, extract_with, ExtractOptions, ExtractReport};
pub use kind::ArchiveKind;
