use std::path::Path;

use journal_core::storage::R2BlobStore;

use crate::commands::common::AppContext;
use crate::error::CliError;

/// Print identity and backend reachability; unreachable backends are reported, not returned.
pub async fn run_status(global_profile: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let context = AppContext::load(global_profile)?;
    println!("Profile: {}", context.profile_name);

    if context.backend.supabase.is_some() {
        let session = context.session()?;
        match session.restore().await {
            Ok(Some(identity)) => println!("Identity: signed in as {}", identity.display_name()),
            Ok(None) => println!("Identity: not signed in"),
            Err(error) => println!("Identity: unavailable ({error})"),
        }
    } else {
        println!("Identity: auth not configured");
    }

    let mode = if context.backend.sync.is_some() {
        "embedded replica"
    } else {
        "local"
    };
    match context.open_database(db_path).await {
        Ok(db) => match db.health_check().await {
            Ok(()) => println!("Database: ok ({mode}, {})", db_path.display()),
            Err(error) => println!("Database: unreachable ({error})"),
        },
        Err(error) => println!("Database: unreachable ({error})"),
    }

    match context.backend.r2.as_ref() {
        Some(config) => {
            let store = R2BlobStore::new(config.clone());
            match store.bucket_is_reachable().await {
                Ok(()) => println!("Blob storage: ok (bucket {})", config.bucket),
                Err(error) => println!("Blob storage: unreachable ({error})"),
            }
            if config.public_base_url.is_none() {
                println!("Blob storage: R2_PUBLIC_BASE_URL is not set; image uploads will fail");
            }
        }
        None => println!("Blob storage: not configured (entries without images only)"),
    }

    Ok(())
}
