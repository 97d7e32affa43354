use std::path::Path;

use journal_core::db::{EntryRepository, LibSqlEntryRepository};
use journal_core::render::share_text;

use crate::commands::common::{resolve_entry, AppContext};
use crate::error::CliError;

pub async fn run_share(
    entry_query: &str,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let context = AppContext::load(global_profile)?;
    let (_, identity) = context.signed_in_session().await?;
    let db = context.open_database(db_path).await?;

    let entries = LibSqlEntryRepository::new(db.connection())
        .list_by_owner(&identity.id)
        .await?;
    let entry = resolve_entry(entry_query, &entries)?;

    println!("{}", share_text(entry));
    Ok(())
}
