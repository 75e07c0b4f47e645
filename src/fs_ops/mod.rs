//! Filesystem operations: name resolution, moves and flattening.

mod atomic;
mod duplicate;
mod entry;
mod flatten;
pub(crate) mod helpers;
mod reserve;

pub use duplicate::{resolve_name, ConflictPolicy, RenamePrefix, DEFAULT_RENAME_PREFIX};
pub use entry::FileEntry;
pub use flatten::{flatten, flatten_with, FlattenOptions, FlattenReport, MoveRecord};
pub use reserve::NameReservations;

pub(crate) use duplicate::is_occupied;
