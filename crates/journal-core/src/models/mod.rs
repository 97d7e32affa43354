//! Data models for Journal

mod entry;
mod identity;

pub use entry::{EntryDraft, EntryId, ImagePayload, JournalEntry};
pub use identity::{Identity, OwnerId};
