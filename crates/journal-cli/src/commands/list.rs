use std::path::Path;

use journal_core::db::LibSqlEntryRepository;
use journal_core::render::{format_entry_lines, EntryListItem, EMPTY_STATE_MESSAGE};
use journal_core::workflow::{ListingState, ListingWorkflow};

use crate::commands::common::AppContext;
use crate::error::CliError;

pub async fn run_list(
    as_json: bool,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let context = AppContext::load(global_profile)?;
    let (session, _) = context.signed_in_session().await?;
    let db = context.open_database(db_path).await?;

    let mut listing = ListingWorkflow::new(LibSqlEntryRepository::new(db.connection()));
    let state = listing.refresh(&session).await;
    for line in render_listing(state, as_json)? {
        println!("{line}");
    }
    Ok(())
}

/// Output lines for a finished listing; a failed listing is returned as the error.
pub fn render_listing(state: &ListingState, as_json: bool) -> Result<Vec<String>, CliError> {
    let entries = match state {
        ListingState::Failed(error) => return Err(error.clone().into()),
        ListingState::NotLoaded | ListingState::Loading => return Ok(Vec::new()),
        ListingState::Empty | ListingState::Loaded(_) => state.entries(),
    };

    if as_json {
        let items = entries.iter().map(EntryListItem::from).collect::<Vec<_>>();
        return Ok(vec![serde_json::to_string_pretty(&items)?]);
    }

    if entries.is_empty() {
        Ok(vec![EMPTY_STATE_MESSAGE.to_string()])
    } else {
        Ok(format_entry_lines(entries))
    }
}
