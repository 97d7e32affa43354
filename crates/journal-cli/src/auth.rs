//! Session persistence for the CLI, backed by the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use journal_core::auth::{AuthSession, IdentitySession, SessionPersistence, SupabaseAuthProvider};
use journal_core::{Error, Result};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "journal-cli";

pub type CliAuthProvider = SupabaseAuthProvider<SessionStore>;
pub type CliSession = IdentitySession<CliAuthProvider>;

/// One keychain slot per profile.
#[derive(Clone)]
pub struct SessionStore {
    username: String,
}

impl SessionStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("supabase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username).map_err(storage_error)
    }
}

fn storage_error(error: impl std::fmt::Display) -> Error {
    Error::Unknown(format!("Secure storage error: {error}"))
}

fn decode(raw: &str) -> Result<AuthSession> {
    serde_json::from_str(raw).map_err(storage_error)
}

fn encode(session: &AuthSession) -> Result<String> {
    serde_json::to_string(session).map_err(storage_error)
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> Result<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(raw) => decode(&raw).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(storage_error(error)),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> Result<Option<AuthSession>> {
        let guard = Self::test_store().lock().map_err(storage_error)?;
        guard.get(&self.username).map(|raw| decode(raw)).transpose()
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> Result<()> {
        let raw = encode(session)?;
        self.entry()?.set_password(&raw).map_err(storage_error)
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> Result<()> {
        let raw = encode(session)?;
        let mut guard = Self::test_store().lock().map_err(storage_error)?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(storage_error(error)),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> Result<()> {
        let mut guard = Self::test_store().lock().map_err(storage_error)?;
        guard.remove(&self.username);
        Ok(())
    }
}
