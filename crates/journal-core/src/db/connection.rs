//! Database connection management

use std::path::Path;
use std::time::Duration;

use libsql::{Builder, Connection, Database as LibSqlDatabase};

use crate::error::{Error, Result};

use super::{classify_store_error, migrations};

/// Configuration for the Turso embedded replica
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote database URL (e.g., `libsql://journal.turso.io`)
    pub url: Option<String>,
    /// Authentication token for remote database
    pub auth_token: Option<String>,
    /// Automatic sync interval (default: 60 seconds)
    pub sync_interval: Option<Duration>,
}

impl SyncConfig {
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            auth_token: Some(auth_token.into()),
            sync_interval: Some(Duration::from_secs(60)),
        }
    }

    #[must_use]
    pub const fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    /// Disable automatic sync (manual sync only)
    #[must_use]
    pub const fn without_auto_sync(mut self) -> Self {
        self.sync_interval = None;
        self
    }

    pub const fn is_configured(&self) -> bool {
        self.url.is_some() && self.auth_token.is_some()
    }
}

/// Database wrapper for libSQL connections
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    sync_config: Option<SyncConfig>,
}

impl Database {
    /// Open a local-only database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str)
            .build()
            .await
            .map_err(|error| classify_store_error(&error))?;
        Self::init(db, None).await
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|error| classify_store_error(&error))?;
        Self::init(db, None).await
    }

    /// Open a local replica that syncs with a remote Turso database.
    ///
    /// Reads are served from the local file, writes go to the remote and sync back.
    pub async fn open_with_sync(
        local_path: impl AsRef<Path>,
        sync_config: SyncConfig,
    ) -> Result<Self> {
        let path_str = local_path.as_ref().to_string_lossy().to_string();

        let url = sync_config
            .url
            .clone()
            .ok_or_else(|| Error::Configuration("Sync URL is required".into()))?;
        let token = sync_config
            .auth_token
            .clone()
            .ok_or_else(|| Error::Configuration("Sync auth token is required".into()))?;

        let mut builder = Builder::new_remote_replica(&path_str, url, token);
        if let Some(interval) = sync_config.sync_interval {
            builder = builder.sync_interval(interval);
            tracing::debug!("Automatic sync interval set to {:?}", interval);
        }

        let db = builder
            .build()
            .await
            .map_err(|error| classify_store_error(&error))?;
        Self::init(db, Some(sync_config)).await
    }

    async fn init(db: LibSqlDatabase, sync_config: Option<SyncConfig>) -> Result<Self> {
        let conn = db.connect().map_err(|error| classify_store_error(&error))?;
        let database = Self {
            db,
            conn,
            sync_config,
        };

        // Pull the remote schema first so migrations see it
        database.sync().await?;
        database.configure().await;
        migrations::run(&database.conn).await?;
        Ok(database)
    }

    /// Pragmas are best-effort; remote replicas reject some of them.
    async fn configure(&self) {
        for pragma in [
            "PRAGMA journal_mode = WAL;",
            "PRAGMA synchronous = NORMAL;",
            "PRAGMA cache_size = 10000;",
        ] {
            if let Err(error) = self.conn.execute(pragma, ()).await {
                tracing::debug!("Skipping `{pragma}`: {error}");
            }
        }
    }

    /// Pull changes from the remote database (if configured)
    pub async fn sync(&self) -> Result<()> {
        if self.sync_config.is_some() {
            self.db
                .sync()
                .await
                .map_err(|error| classify_store_error(&error))?;
            tracing::debug!("Database synced with remote");
        }
        Ok(())
    }

    pub const fn is_sync_enabled(&self) -> bool {
        self.sync_config.is_some()
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a trivial query to prove the store answers.
    pub async fn health_check(&self) -> Result<()> {
        let mut rows = self
            .conn
            .query("SELECT 1", ())
            .await
            .map_err(|error| classify_store_error(&error))?;
        rows.next()
            .await
            .map_err(|error| classify_store_error(&error))?
            .ok_or_else(|| Error::Unavailable("Health check returned no rows".to_string()))?;
        Ok(())
    }
}
