use std::path::Path;

use journal_core::db::LibSqlEntryRepository;
use journal_core::storage::BlobUploader;
use journal_core::workflow::SubmissionWorkflow;
use journal_core::EntryDraft;

use crate::commands::common::{describe_event, read_image, AppContext};
use crate::error::CliError;

pub async fn run_add(
    title: &str,
    thoughts: &str,
    image: Option<&Path>,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let mut draft = EntryDraft::new(title, thoughts);
    // Reject empty fields before any backend is contacted
    draft.validate()?;
    if let Some(path) = image {
        draft = draft.with_image(read_image(path)?);
    }

    let context = AppContext::load(global_profile)?;
    let (session, _) = context.signed_in_session().await?;
    let db = context.open_database(db_path).await?;

    let workflow = SubmissionWorkflow::new(
        LibSqlEntryRepository::new(db.connection()),
        BlobUploader::new(context.blob_store()),
    );
    let id = workflow
        .submit(&session, draft, |event| {
            if let Some(line) = describe_event(&event) {
                eprintln!("{line}");
            }
        })
        .await?;

    println!("{id}");
    Ok(())
}
