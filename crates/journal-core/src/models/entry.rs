//! Journal entry model

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Field, Result};
use crate::util::unix_timestamp_now;

use super::identity::{Identity, OwnerId};

/// A unique identifier for an entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Image bytes attached to a draft, uploaded before the entry is persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// User input for a new entry, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    pub title: String,
    pub thoughts: String,
    pub image: Option<ImagePayload>,
}

impl EntryDraft {
    pub fn new(title: impl Into<String>, thoughts: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            thoughts: thoughts.into(),
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    /// Check title then thoughts; the first empty field wins.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation(Field::Title, "Title is required"));
        }
        if self.thoughts.trim().is_empty() {
            return Err(Error::validation(Field::Thoughts, "Thoughts are required"));
        }
        Ok(())
    }
}

/// A persisted journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier
    pub id: EntryId,
    /// Trimmed, non-empty title
    pub title: String,
    /// Trimmed, non-empty body text
    pub thoughts: String,
    /// Retrieval URL of the attached image, empty when there is none
    pub image_url: String,
    /// Identity that created the entry
    pub owner_id: OwnerId,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
    /// Owner's display identifier at creation time
    pub owner_display_name: String,
}

impl JournalEntry {
    /// Build a new entry owned by `owner`, stamped with the current time.
    #[must_use]
    pub fn new(
        owner: &Identity,
        title: &str,
        thoughts: &str,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            title: title.trim().to_string(),
            thoughts: thoughts.trim().to_string(),
            image_url: image_url.into(),
            owner_id: owner.id.clone(),
            created_at: unix_timestamp_now(),
            owner_display_name: owner.display_name(),
        }
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// Creation time as `dd MMM yyyy, HH:mm` in UTC.
    #[must_use]
    pub fn formatted_created_at(&self) -> String {
        DateTime::from_timestamp(self.created_at, 0)
            .map(|time| time.format("%d %b %Y, %H:%M").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Identity {
        Identity::new("uid-1", Some("ada@example.com".to_string()))
    }

    #[test]
    fn test_entry_id_unique() {
        let id1 = EntryId::new();
        let id2 = EntryId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entry_id_parse() {
        let id = EntryId::new();
        let parsed: EntryId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_entry_new_copies_owner_fields() {
        let entry = JournalEntry::new(&owner(), "  Trip ", "Great day\n", "");
        assert_eq!(entry.title, "Trip");
        assert_eq!(entry.thoughts, "Great day");
        assert_eq!(entry.owner_id, OwnerId::new("uid-1"));
        assert_eq!(entry.owner_display_name, "ada@example.com");
        assert!(entry.created_at > 0);
        assert!(!entry.has_image());
    }

    #[test]
    fn test_has_image() {
        let entry = JournalEntry::new(&owner(), "t", "b", "https://cdn.example.com/a.jpg");
        assert!(entry.has_image());
    }

    #[test]
    fn test_formatted_created_at() {
        let mut entry = JournalEntry::new(&owner(), "t", "b", "");
        entry.created_at = 1_700_000_000;
        assert_eq!(entry.formatted_created_at(), "14 Nov 2023, 22:13");
    }

    #[test]
    fn test_validate_rejects_blank_title_first() {
        let error = EntryDraft::new("   ", "").validate().unwrap_err();
        assert_eq!(error.field(), Some(Field::Title));
    }

    #[test]
    fn test_validate_rejects_blank_thoughts() {
        let error = EntryDraft::new("Trip", " \n\t").validate().unwrap_err();
        assert_eq!(error.field(), Some(Field::Thoughts));
    }

    #[test]
    fn test_validate_accepts_filled_draft() {
        assert!(EntryDraft::new("Trip", "Great day").validate().is_ok());
    }

    #[test]
    fn test_image_payload_debug_hides_bytes() {
        let payload = ImagePayload::new(vec![1, 2, 3], Some("image/png".to_string()));
        let rendered = format!("{payload:?}");
        assert!(rendered.contains("len: 3"));
        assert!(!rendered.contains("[1, 2, 3]"));
    }
}
