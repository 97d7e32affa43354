//! In-memory stand-ins for the three backend boundaries.
//!
//! Each fake counts its calls so tests can assert that no backend was
//! contacted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::auth::AuthProvider;
use crate::db::EntryRepository;
use crate::error::{Error, Result};
use crate::models::{EntryId, Identity, ImagePayload, JournalEntry, OwnerId};
use crate::storage::BlobStore;

/// Auth provider that accepts any credentials unless told to fail.
#[derive(Default)]
pub struct FakeAuthProvider {
    calls: AtomicUsize,
    failure: Mutex<Option<Error>>,
    persisted: Mutex<Option<Identity>>,
}

impl FakeAuthProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail with `error`.
    pub fn fail_with(&self, error: Error) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Identity returned by `restore`.
    pub fn persist(&self, identity: Identity) {
        *self.persisted.lock().unwrap() = Some(identity);
    }

    fn record(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn identity_for(email: &str) -> Identity {
        Identity::new(format!("uid-{email}"), Some(email.to_string()))
    }
}

impl AuthProvider for FakeAuthProvider {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<Identity> {
        self.record()?;
        Ok(Self::identity_for(email))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<Identity> {
        self.record()?;
        Ok(Self::identity_for(email))
    }

    async fn sign_out(&self) -> Result<()> {
        self.record()?;
        *self.persisted.lock().unwrap() = None;
        Ok(())
    }

    async fn restore(&self) -> Result<Option<Identity>> {
        self.record()?;
        Ok(self.persisted.lock().unwrap().clone())
    }
}

/// Which step of an upload a [`MemoryBlobStore`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFailure {
    Transfer,
    UrlResolution,
}

#[derive(Default)]
struct BlobState {
    objects: BTreeMap<String, Vec<u8>>,
    put_calls: usize,
}

/// Blob store keeping objects in a shared map; clones see the same objects.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    state: Arc<Mutex<BlobState>>,
    failure: Option<UploadFailure>,
}

impl MemoryBlobStore {
    pub fn failing(failure: UploadFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    pub fn put_calls(&self) -> usize {
        self.state.lock().unwrap().put_calls
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        payload: &ImagePayload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.put_calls += 1;
        if self.failure == Some(UploadFailure::Transfer) {
            return Err(Error::UploadFailed("connection reset".to_string()));
        }
        progress(50);
        state.objects.insert(key.to_string(), payload.bytes.clone());
        progress(100);
        Ok(())
    }

    async fn resolve_url(&self, key: &str) -> Result<String> {
        if self.failure == Some(UploadFailure::UrlResolution) {
            return Err(Error::UrlResolutionFailed(format!("no url for {key}")));
        }
        Ok(format!("https://blobs.test/{key}"))
    }
}

#[derive(Default)]
struct RepositoryState {
    entries: Vec<JournalEntry>,
    calls: usize,
    failure: Option<Error>,
}

/// Entry repository backed by a shared vector; clones see the same entries.
#[derive(Clone, Default)]
pub struct MemoryEntryRepository {
    state: Arc<Mutex<RepositoryState>>,
}

impl MemoryEntryRepository {
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    /// Make every following call fail with `error`.
    pub fn fail_with(&self, error: Error) {
        self.state.lock().unwrap().failure = Some(error);
    }

    /// Let calls succeed again.
    pub fn recover(&self) {
        self.state.lock().unwrap().failure = None;
    }
}

impl EntryRepository for MemoryEntryRepository {
    async fn create(&self, entry: &JournalEntry) -> Result<EntryId> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        state.entries.push(entry.clone());
        Ok(entry.id)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<JournalEntry>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        Ok(state
            .entries
            .iter()
            .filter(|entry| &entry.owner_id == owner)
            .cloned()
            .collect())
    }
}
