//! journal-core - Core library for Journal
//!
//! This crate contains the entry model, the identity session, the blob
//! uploader, the entry repository and the submission/listing workflows that
//! every Journal front end drives, together with the hosted backend adapters
//! (Supabase auth, Cloudflare R2 blobs, libSQL/Turso documents).

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod render;
pub mod storage;
pub mod util;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorCategory, Field, Result};
pub use models::{EntryDraft, EntryId, Identity, ImagePayload, JournalEntry, OwnerId};
