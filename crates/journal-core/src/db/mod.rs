//! Database layer for Journal

mod connection;
mod migrations;
mod repository;

use crate::error::Error;

pub use connection::{Database, SyncConfig};
pub use repository::{EntryRepository, LibSqlEntryRepository, ENTRIES_TABLE};

const SQLITE_ERROR: i32 = 1;
const SQLITE_PERM: i32 = 3;
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_READONLY: i32 = 8;
const SQLITE_IOERR: i32 = 10;
const SQLITE_FULL: i32 = 13;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_PROTOCOL: i32 = 15;
const SQLITE_AUTH: i32 = 23;

/// Map a libSQL failure onto the crate taxonomy by primary result code.
///
/// A generic `SQLITE_ERROR` is left as [`Error::Unknown`]; callers that know
/// which table they touched refine it to [`Error::NotFound`].
pub(crate) fn classify_store_error(error: &libsql::Error) -> Error {
    match error {
        libsql::Error::SqliteFailure(code, message) => {
            let detail = format!("{message} (code {code})");
            match primary_code(*code) {
                SQLITE_PERM | SQLITE_AUTH | SQLITE_READONLY => Error::PermissionDenied(detail),
                SQLITE_BUSY | SQLITE_LOCKED | SQLITE_IOERR | SQLITE_CANTOPEN | SQLITE_FULL
                | SQLITE_PROTOCOL => Error::Unavailable(detail),
                _ => Error::Unknown(detail),
            }
        }
        libsql::Error::ConnectionFailed(message) => Error::Unavailable(message.clone()),
        other => Error::Unknown(other.to_string()),
    }
}

/// Whether the failure is a generic `SQLITE_ERROR`.
pub(crate) const fn is_generic_error(error: &libsql::Error) -> bool {
    matches!(error, libsql::Error::SqliteFailure(code, _) if primary_code(*code) == SQLITE_ERROR)
}

const fn primary_code(code: i32) -> i32 {
    code & 0xff
}
