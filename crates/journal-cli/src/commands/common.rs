use std::env;
use std::path::{Path, PathBuf};

use journal_core::auth::SupabaseAuthProvider;
use journal_core::config::BackendConfig;
use journal_core::db::Database;
use journal_core::storage::{BlobStore, NoBlobStore, R2BlobStore};
use journal_core::workflow::{SubmissionEvent, SubmissionStage};
use journal_core::{Identity, ImagePayload, JournalEntry};

use crate::auth::{CliSession, SessionStore};
use crate::config_profiles::{CliProfilesConfig, ENV_PROFILE};
use crate::error::CliError;

const ENV_DB_PATH: &str = "JOURNAL_DB_PATH";
const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

/// Resolved profile plus the backends it points at.
pub struct AppContext {
    pub profile_name: String,
    pub backend: BackendConfig,
}

impl AppContext {
    pub fn load(explicit_profile: Option<&str>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let (profile_name, backend) =
            resolve_backend_config(&profiles, explicit_profile, |key| env::var(key).ok())?;
        Ok(Self {
            profile_name,
            backend,
        })
    }

    /// Identity session for this profile, not yet restored.
    pub fn session(&self) -> Result<CliSession, CliError> {
        let config = self.backend.supabase.as_ref().ok_or_else(|| {
            CliError::Config(format!(
                "Supabase is not configured for profile '{}'. Run `journal config init` or set SUPABASE_URL and SUPABASE_ANON_KEY.",
                self.profile_name
            ))
        })?;
        let provider =
            SupabaseAuthProvider::from_config(config, SessionStore::new(&self.profile_name))?;
        Ok(CliSession::new(provider))
    }

    /// Restore the persisted session and require an identity.
    pub async fn signed_in_session(&self) -> Result<(CliSession, Identity), CliError> {
        let session = self.session()?;
        session.restore().await?;
        let identity = session.require_identity()?;
        Ok((session, identity))
    }

    pub async fn open_database(&self, path: &Path) -> Result<Database, CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match self.backend.sync.clone() {
            Some(sync_config) if sync_config.is_configured() => {
                tracing::info!("Opening embedded replica at {}", path.display());
                Ok(Database::open_with_sync(path, sync_config).await?)
            }
            _ => Ok(Database::open(path).await?),
        }
    }

    pub fn blob_store(&self) -> ConfiguredBlobStore {
        match self.backend.r2.clone() {
            Some(config) => ConfiguredBlobStore::R2(R2BlobStore::new(config)),
            None => ConfiguredBlobStore::Unconfigured(NoBlobStore),
        }
    }
}

/// Merge profile values over the environment; the profile wins per key.
pub fn resolve_backend_config(
    profiles: &CliProfilesConfig,
    explicit_profile: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(String, BackendConfig), CliError> {
    let profile_name =
        profiles.resolve_profile_name_with(explicit_profile, lookup(ENV_PROFILE).as_deref());
    let profile = profiles.profile(&profile_name).cloned().unwrap_or_default();

    let backend = BackendConfig::from_lookup(|key| match key {
        ENV_SUPABASE_URL => profile.supabase_url().or_else(|| lookup(key)),
        ENV_SUPABASE_ANON_KEY => profile.supabase_anon_key().or_else(|| lookup(key)),
        _ => lookup(key),
    })?;
    Ok((profile_name, backend))
}

/// Blob store chosen at runtime from the environment.
pub enum ConfiguredBlobStore {
    R2(R2BlobStore),
    Unconfigured(NoBlobStore),
}

impl BlobStore for ConfiguredBlobStore {
    async fn put(
        &self,
        key: &str,
        payload: &ImagePayload,
        progress: &mut dyn FnMut(u8),
    ) -> journal_core::Result<()> {
        match self {
            Self::R2(store) => store.put(key, payload, progress).await,
            Self::Unconfigured(store) => store.put(key, payload, progress).await,
        }
    }

    async fn resolve_url(&self, key: &str) -> journal_core::Result<String> {
        match self {
            Self::R2(store) => store.resolve_url(key).await,
            Self::Unconfigured(store) => store.resolve_url(key).await,
        }
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(ENV_DB_PATH).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("journal").join("journal.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// Read an image file, guessing its content type from the extension.
pub fn read_image(path: &Path) -> Result<ImagePayload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    let content_type = mime_guess::from_path(path).first_raw().map(ToOwned::to_owned);
    Ok(ImagePayload::new(bytes, content_type))
}

/// Terminal line for a submission event, if it is worth showing.
pub fn describe_event(event: &SubmissionEvent) -> Option<String> {
    match event {
        SubmissionEvent::Stage(SubmissionStage::Uploading) => Some("Uploading image...".to_string()),
        SubmissionEvent::Progress(percent) => Some(format!("Upload progress: {percent}%")),
        SubmissionEvent::Stage(SubmissionStage::Persisting) => Some("Saving entry...".to_string()),
        SubmissionEvent::Stage(_) => None,
    }
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyEntryId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Find one entry by full id or unique id prefix.
pub fn resolve_entry<'a>(
    entry_query: &str,
    entries: &'a [JournalEntry],
) -> Result<&'a JournalEntry, CliError> {
    let query = normalize_entry_identifier(entry_query)?.to_ascii_lowercase();

    if let Some(entry) = entries.iter().find(|entry| entry.id.to_string() == query) {
        return Ok(entry);
    }

    let matching = entries
        .iter()
        .filter(|entry| entry.id.to_string().starts_with(&query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::EntryNotFound(entry_query.to_string())),
        [entry] => Ok(entry),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|entry| entry.id.to_string().chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousEntryId(format!(
                "ID prefix '{entry_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}
