//! Entry submission: validate, upload the optional image, persist.

use crate::auth::{AuthProvider, IdentitySession};
use crate::db::EntryRepository;
use crate::error::{Error, Result};
use crate::models::{EntryDraft, EntryId, JournalEntry};
use crate::storage::{BlobStore, BlobUploader};

/// Where a submission is in `Idle → Validating → (Uploading) → Persisting → Done | Failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStage {
    #[default]
    Idle,
    Validating,
    Uploading,
    Persisting,
    Done(EntryId),
    Failed(Error),
}

/// Observable side effects of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Stage(SubmissionStage),
    /// Upload progress in percent, only while uploading
    Progress(u8),
}

/// Drives one draft to a persisted entry. No retries, no cancellation.
pub struct SubmissionWorkflow<R, B> {
    repository: R,
    uploader: BlobUploader<B>,
}

impl<R: EntryRepository, B: BlobStore> SubmissionWorkflow<R, B> {
    pub const fn new(repository: R, uploader: BlobUploader<B>) -> Self {
        Self {
            repository,
            uploader,
        }
    }

    /// Submit `draft` as the session's current identity.
    ///
    /// `on_event` sees each stage as it is entered, upload progress while an
    /// image is transferred, and exactly one terminal stage. The returned
    /// result matches the terminal stage.
    pub async fn submit<P: AuthProvider>(
        &self,
        session: &IdentitySession<P>,
        draft: EntryDraft,
        mut on_event: impl FnMut(SubmissionEvent),
    ) -> Result<EntryId> {
        let result = self.run(session, &draft, &mut on_event).await;
        match &result {
            Ok(id) => on_event(SubmissionEvent::Stage(SubmissionStage::Done(*id))),
            Err(error) => {
                tracing::warn!(
                    "Entry submission failed ({}): {error}",
                    error.category()
                );
                on_event(SubmissionEvent::Stage(SubmissionStage::Failed(
                    error.clone(),
                )));
            }
        }
        result
    }

    async fn run<P: AuthProvider>(
        &self,
        session: &IdentitySession<P>,
        draft: &EntryDraft,
        on_event: &mut impl FnMut(SubmissionEvent),
    ) -> Result<EntryId> {
        on_event(SubmissionEvent::Stage(SubmissionStage::Validating));
        draft.validate()?;
        let identity = session.require_identity()?;

        let image_url = match &draft.image {
            Some(image) => {
                on_event(SubmissionEvent::Stage(SubmissionStage::Uploading));
                self.uploader
                    .upload(&identity.id, image, |percent| {
                        tracing::debug!("Upload progress: {percent}%");
                        on_event(SubmissionEvent::Progress(percent));
                    })
                    .await?
            }
            None => String::new(),
        };

        on_event(SubmissionEvent::Stage(SubmissionStage::Persisting));
        let entry = JournalEntry::new(&identity, &draft.title, &draft.thoughts, image_url);
        self.repository.create(&entry).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Field;
    use crate::models::ImagePayload;
    use crate::storage::NoBlobStore;
    use crate::testing::{
        FakeAuthProvider, MemoryBlobStore, MemoryEntryRepository, UploadFailure,
    };

    async fn signed_in() -> IdentitySession<FakeAuthProvider> {
        let session = IdentitySession::new(FakeAuthProvider::default());
        session.sign_in("ada@example.com", "secret").await.unwrap();
        session
    }

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xff, 0xd8, 0xff], Some("image/jpeg".to_string()))
    }

    fn stages(events: &[SubmissionEvent]) -> Vec<SubmissionStage> {
        events
            .iter()
            .filter_map(|event| match event {
                SubmissionEvent::Stage(stage) => Some(stage.clone()),
                SubmissionEvent::Progress(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn blank_title_halts_at_validating_without_backend_calls() {
        let session = signed_in().await;
        let repository = MemoryEntryRepository::default();
        let store = MemoryBlobStore::default();
        let workflow = SubmissionWorkflow::new(repository.clone(), BlobUploader::new(store.clone()));
        let mut events = Vec::new();

        let error = workflow
            .submit(
                &session,
                EntryDraft::new("   ", "thoughts").with_image(image()),
                |event| events.push(event),
            )
            .await
            .unwrap_err();

        assert_eq!(error.field(), Some(Field::Title));
        assert_eq!(
            stages(&events),
            vec![
                SubmissionStage::Validating,
                SubmissionStage::Failed(error.clone())
            ]
        );
        assert_eq!(repository.calls(), 0);
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn blank_thoughts_are_reported_after_title() {
        let session = signed_in().await;
        let workflow =
            SubmissionWorkflow::new(MemoryEntryRepository::default(), BlobUploader::new(NoBlobStore));

        let error = workflow
            .submit(&session, EntryDraft::new("Title", "\n\t"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(error.field(), Some(Field::Thoughts));

        let error = workflow
            .submit(&session, EntryDraft::new("", ""), |_| {})
            .await
            .unwrap_err();
        assert_eq!(error.field(), Some(Field::Title));
    }

    #[tokio::test]
    async fn signed_out_submission_fails_before_backend_calls() {
        let session = IdentitySession::new(FakeAuthProvider::default());
        let repository = MemoryEntryRepository::default();
        let workflow =
            SubmissionWorkflow::new(repository.clone(), BlobUploader::new(NoBlobStore));

        let error = workflow
            .submit(&session, EntryDraft::new("Trip", "Great day"), |_| {})
            .await
            .unwrap_err();

        assert_eq!(error, Error::NotSignedIn);
        assert_eq!(repository.calls(), 0);
    }

    #[tokio::test]
    async fn failed_upload_persists_nothing() {
        let session = signed_in().await;
        let repository = MemoryEntryRepository::default();
        let workflow = SubmissionWorkflow::new(
            repository.clone(),
            BlobUploader::new(MemoryBlobStore::failing(UploadFailure::Transfer)),
        );
        let mut events = Vec::new();

        let error = workflow
            .submit(
                &session,
                EntryDraft::new("Trip", "Great day").with_image(image()),
                |event| events.push(event),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, Error::UploadFailed(_)));
        assert_eq!(repository.calls(), 0);
        assert!(repository.entries().is_empty());
        assert_eq!(
            stages(&events).last(),
            Some(&SubmissionStage::Failed(error))
        );
    }

    #[tokio::test]
    async fn unresolvable_url_persists_nothing() {
        let session = signed_in().await;
        let repository = MemoryEntryRepository::default();
        let store = MemoryBlobStore::failing(UploadFailure::UrlResolution);
        let workflow =
            SubmissionWorkflow::new(repository.clone(), BlobUploader::new(store.clone()));

        let error = workflow
            .submit(
                &session,
                EntryDraft::new("Trip", "Great day").with_image(image()),
                |_| {},
            )
            .await
            .unwrap_err();

        assert!(matches!(error, Error::UrlResolutionFailed(_)));
        assert_eq!(repository.calls(), 0);
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn image_submission_reports_progress_between_upload_and_persist() {
        let session = signed_in().await;
        let repository = MemoryEntryRepository::default();
        let workflow = SubmissionWorkflow::new(
            repository.clone(),
            BlobUploader::new(MemoryBlobStore::default()),
        );
        let mut events = Vec::new();

        let id = workflow
            .submit(
                &session,
                EntryDraft::new("Trip", "Great day").with_image(image()),
                |event| events.push(event),
            )
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                SubmissionEvent::Stage(SubmissionStage::Validating),
                SubmissionEvent::Stage(SubmissionStage::Uploading),
                SubmissionEvent::Progress(0),
                SubmissionEvent::Progress(50),
                SubmissionEvent::Progress(100),
                SubmissionEvent::Stage(SubmissionStage::Persisting),
                SubmissionEvent::Stage(SubmissionStage::Done(id)),
            ]
        );
        let stored = repository.entries();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].has_image());
    }

    #[tokio::test]
    async fn text_only_submission_skips_upload_stage() {
        let session = signed_in().await;
        let workflow =
            SubmissionWorkflow::new(MemoryEntryRepository::default(), BlobUploader::new(NoBlobStore));
        let mut events = Vec::new();

        let id = workflow
            .submit(&session, EntryDraft::new("Trip", "Great day"), |event| {
                events.push(event);
            })
            .await
            .unwrap();

        assert_eq!(
            stages(&events),
            vec![
                SubmissionStage::Validating,
                SubmissionStage::Persisting,
                SubmissionStage::Done(id),
            ]
        );
        assert!(events
            .iter()
            .all(|event| !matches!(event, SubmissionEvent::Progress(_))));
    }

    #[tokio::test]
    async fn repository_error_is_surfaced_unchanged() {
        let session = signed_in().await;
        let repository = MemoryEntryRepository::default();
        repository.fail_with(Error::PermissionDenied("rules".to_string()));
        let workflow = SubmissionWorkflow::new(repository.clone(), BlobUploader::new(NoBlobStore));

        let error = workflow
            .submit(&session, EntryDraft::new("Trip", "Great day"), |_| {})
            .await
            .unwrap_err();

        assert_eq!(error, Error::PermissionDenied("rules".to_string()));
        assert_eq!(repository.calls(), 1);
    }
}
