//! Listing the signed-in user's entries.

use crate::auth::{AuthProvider, IdentitySession};
use crate::db::EntryRepository;
use crate::error::Error;
use crate::models::JournalEntry;

/// Result of the most recent listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListingState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<JournalEntry>),
    /// Loaded successfully with zero entries
    Empty,
    Failed(Error),
}

impl ListingState {
    /// Entries held by this state; empty unless loaded.
    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        match self {
            Self::Loaded(entries) => entries,
            _ => &[],
        }
    }
}

/// Fetches the current identity's entries on every refresh; nothing is cached.
pub struct ListingWorkflow<R> {
    repository: R,
    state: ListingState,
}

impl<R: EntryRepository> ListingWorkflow<R> {
    pub const fn new(repository: R) -> Self {
        Self {
            repository,
            state: ListingState::NotLoaded,
        }
    }

    pub const fn state(&self) -> &ListingState {
        &self.state
    }

    /// Drop the previous result and load the current identity's entries.
    pub async fn refresh<P: AuthProvider>(
        &mut self,
        session: &IdentitySession<P>,
    ) -> &ListingState {
        self.state = ListingState::Loading;

        let identity = match session.require_identity() {
            Ok(identity) => identity,
            Err(error) => {
                self.state = ListingState::Failed(error);
                return &self.state;
            }
        };

        self.state = match self.repository.list_by_owner(&identity.id).await {
            Ok(entries) if entries.is_empty() => ListingState::Empty,
            Ok(entries) => ListingState::Loaded(entries),
            Err(error) => {
                tracing::warn!("Listing entries failed ({}): {error}", error.category());
                ListingState::Failed(error)
            }
        };
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Identity;
    use crate::testing::{FakeAuthProvider, MemoryEntryRepository};

    async fn signed_in() -> IdentitySession<FakeAuthProvider> {
        let session = IdentitySession::new(FakeAuthProvider::default());
        session.sign_in("ada@example.com", "secret").await.unwrap();
        session
    }

    #[tokio::test]
    async fn empty_result_is_distinct_from_not_loaded_and_failed() {
        let session = signed_in().await;
        let mut listing = ListingWorkflow::new(MemoryEntryRepository::default());
        assert_eq!(listing.state(), &ListingState::NotLoaded);

        let state = listing.refresh(&session).await;

        assert_eq!(state, &ListingState::Empty);
        assert!(state.entries().is_empty());
    }

    #[tokio::test]
    async fn only_own_entries_are_listed() {
        let session = signed_in().await;
        let me = session.current_identity().unwrap();
        let other = Identity::new("uid-other", None);
        let repository = MemoryEntryRepository::default();
        repository
            .create(&JournalEntry::new(&me, "Mine", "a", ""))
            .await
            .unwrap();
        repository
            .create(&JournalEntry::new(&other, "Theirs", "b", ""))
            .await
            .unwrap();
        let mut listing = ListingWorkflow::new(repository);

        let entries = listing.refresh(&session).await.entries();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Mine");
    }

    #[tokio::test]
    async fn repository_failure_replaces_previous_result() {
        let session = signed_in().await;
        let me = session.current_identity().unwrap();
        let repository = MemoryEntryRepository::default();
        repository
            .create(&JournalEntry::new(&me, "Mine", "a", ""))
            .await
            .unwrap();
        let mut listing = ListingWorkflow::new(repository.clone());
        assert_eq!(listing.refresh(&session).await.entries().len(), 1);

        repository.fail_with(Error::Unavailable("offline".to_string()));
        let state = listing.refresh(&session).await;

        assert_eq!(
            state,
            &ListingState::Failed(Error::Unavailable("offline".to_string()))
        );
        assert!(state.entries().is_empty());

        repository.recover();
        assert_eq!(listing.refresh(&session).await.entries().len(), 1);
    }

    #[tokio::test]
    async fn signed_out_listing_fails_without_repository_call() {
        let session = IdentitySession::new(FakeAuthProvider::default());
        let repository = MemoryEntryRepository::default();
        let mut listing = ListingWorkflow::new(repository.clone());

        let state = listing.refresh(&session).await;

        assert_eq!(state, &ListingState::Failed(Error::NotSignedIn));
        assert_eq!(repository.calls(), 0);
    }

    #[tokio::test]
    async fn listing_follows_identity_changes() {
        let session = signed_in().await;
        let me = session.current_identity().unwrap();
        let repository = MemoryEntryRepository::default();
        repository
            .create(&JournalEntry::new(&me, "Mine", "a", ""))
            .await
            .unwrap();
        let mut listing = ListingWorkflow::new(repository);
        assert_eq!(listing.refresh(&session).await.entries().len(), 1);

        session.sign_out().await;
        session.sign_in("grace@example.com", "secret").await.unwrap();

        assert_eq!(listing.refresh(&session).await, &ListingState::Empty);
    }
}
