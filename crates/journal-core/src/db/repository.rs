//! Journal entry repository

use libsql::{params, Connection, Row, Value};

use crate::error::{Error, Result};
use crate::models::{EntryId, JournalEntry, OwnerId};
use crate::util::is_http_url;

use super::{classify_store_error, is_generic_error};

/// Collection every journal entry lives in.
pub const ENTRIES_TABLE: &str = "journal_entries";

/// Storage for journal entries (async)
#[allow(async_fn_in_trait)]
pub trait EntryRepository {
    /// Append an entry and return its id
    async fn create(&self, entry: &JournalEntry) -> Result<EntryId>;

    /// All entries owned by `owner`, in backend order.
    ///
    /// Records that do not parse into a [`JournalEntry`] are logged and skipped.
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<JournalEntry>>;
}

/// libSQL implementation of `EntryRepository`
pub struct LibSqlEntryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlEntryRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Refine a generic SQL error into `NotFound` when the collection is missing.
    async fn classify(&self, error: &libsql::Error) -> Error {
        if is_generic_error(error) && !self.table_exists().await.unwrap_or(true) {
            return Error::NotFound(format!("Collection `{ENTRIES_TABLE}` does not exist"));
        }
        classify_store_error(error)
    }

    async fn table_exists(&self) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
                [ENTRIES_TABLE],
            )
            .await
            .map_err(|error| classify_store_error(&error))?;
        let row = rows
            .next()
            .await
            .map_err(|error| classify_store_error(&error))?;
        Ok(row.is_some_and(|row| matches!(row.get_value(0), Ok(Value::Integer(exists)) if exists != 0)))
    }
}

impl EntryRepository for LibSqlEntryRepository<'_> {
    async fn create(&self, entry: &JournalEntry) -> Result<EntryId> {
        let result = self
            .conn
            .execute(
                "INSERT INTO journal_entries
                    (id, title, thoughts, image_url, owner_id, created_at, owner_display_name)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.id.as_str(),
                    entry.title.as_str(),
                    entry.thoughts.as_str(),
                    entry.image_url.as_str(),
                    entry.owner_id.as_str(),
                    entry.created_at,
                    entry.owner_display_name.as_str(),
                ],
            )
            .await;

        if let Err(error) = result {
            return Err(self.classify(&error).await);
        }

        tracing::info!("Saved journal entry {}", entry.id);
        Ok(entry.id)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<JournalEntry>> {
        let mut rows = match self
            .conn
            .query(
                "SELECT id, title, thoughts, image_url, owner_id, created_at, owner_display_name
                 FROM journal_entries WHERE owner_id = ?",
                [owner.as_str()],
            )
            .await
        {
            Ok(rows) => rows,
            Err(error) => return Err(self.classify(&error).await),
        };

        let mut entries = Vec::new();
        loop {
            let row = match rows.next().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(error) => return Err(self.classify(&error).await),
            };
            match row_to_entry(&row) {
                Ok(entry) => entries.push(entry),
                Err(reason) => tracing::warn!("Skipping malformed journal entry: {reason}"),
            }
        }

        tracing::debug!("Loaded {} journal entries for {owner}", entries.len());
        Ok(entries)
    }
}

fn row_to_entry(row: &Row) -> std::result::Result<JournalEntry, String> {
    let id = text_column(row, 0, "id")?;
    let id = id
        .parse::<EntryId>()
        .map_err(|error| format!("id `{id}`: {error}"))?;
    let field = |index: i32, name: &str| {
        text_column(row, index, name).map_err(|reason| format!("{reason} in {id}"))
    };

    let title = field(1, "title")?;
    let thoughts = field(2, "thoughts")?;
    let image_url = field(3, "image_url")?;
    if title.trim().is_empty() {
        return Err(format!("blank title in {id}"));
    }
    if thoughts.trim().is_empty() {
        return Err(format!("blank thoughts in {id}"));
    }
    if !image_url.is_empty() && !is_http_url(&image_url) {
        return Err(format!("image_url `{image_url}` is not an http(s) URL in {id}"));
    }

    let created_at = match row.get_value(5) {
        Ok(Value::Integer(seconds)) => seconds,
        Ok(other) => return Err(format!("created_at holds {} in {id}", value_kind(&other))),
        Err(error) => return Err(format!("created_at in {id}: {error}")),
    };

    Ok(JournalEntry {
        id,
        title,
        thoughts,
        image_url,
        owner_id: OwnerId::new(field(4, "owner_id")?),
        created_at,
        owner_display_name: field(6, "owner_display_name")?,
    })
}

/// Read a TEXT column without going through `FromValue`, which panics on a type mismatch.
fn text_column(row: &Row, index: i32, name: &str) -> std::result::Result<String, String> {
    match row.get_value(index) {
        Ok(Value::Text(text)) => Ok(text),
        Ok(other) => Err(format!("{name} holds {}", value_kind(&other))),
        Err(error) => Err(format!("{name}: {error}")),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Integer(_) => "an INTEGER",
        Value::Real(_) => "a REAL",
        Value::Text(_) => "TEXT",
        Value::Blob(_) => "a BLOB",
    }
}
