//! Text renderings of entries for listings and sharing.

use serde::Serialize;

use crate::models::JournalEntry;

/// Shown instead of a listing when the user has no entries.
pub const EMPTY_STATE_MESSAGE: &str = "No journal entries yet.";

const SHARE_FOOTER: &str = "Shared from My Journal App";
const IMAGE_MARKER: &str = "[Image attached]";

/// Listing row for machine-readable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub thoughts: String,
    pub image_url: String,
    pub has_image: bool,
    pub owner_display_name: String,
    pub created_at: i64,
    pub created_at_display: String,
}

impl From<&JournalEntry> for EntryListItem {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            title: entry.title.clone(),
            preview: preview(&entry.thoughts, 80),
            thoughts: entry.thoughts.clone(),
            image_url: entry.image_url.clone(),
            has_image: entry.has_image(),
            owner_display_name: entry.owner_display_name.clone(),
            created_at: entry.created_at,
            created_at_display: entry.formatted_created_at(),
        }
    }
}

/// Plain-text body handed to other apps when an entry is shared.
#[must_use]
pub fn share_text(entry: &JournalEntry) -> String {
    let mut text = format!("Journal Entry: {}\n\n{}", entry.title, entry.thoughts);
    if entry.has_image() {
        text.push_str("\n\n");
        text.push_str(IMAGE_MARKER);
    }
    text.push_str("\n\n");
    text.push_str(SHARE_FOOTER);
    text
}

/// One aligned line per entry: short id, title, creation time, image marker.
#[must_use]
pub fn format_entry_lines(entries: &[JournalEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let id = entry.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let title = preview(&entry.title, 32);
            let created = entry.formatted_created_at();
            let line = format!("{short_id:<13}  {title:<32}  {created}");
            if entry.has_image() {
                format!("{line}  [image]")
            } else {
                line
            }
        })
        .collect()
}

/// First line of `text` with whitespace collapsed, cut to `max_chars`.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
