//! Domain models for archives and archived items.

mod archive;
mod item;

pub use archive::{Archive, ArchiveSet, Credential};
pub use item::{is_item_id, new_item_id, ArchiveItem};
