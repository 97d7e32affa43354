//! Blob storage: the store abstraction and the per-user image uploader.

mod r2;

use crate::error::{Error, Result};
use crate::models::{ImagePayload, OwnerId};
use crate::util::unix_timestamp_millis_now;

pub use r2::{R2BlobStore, R2Config};

/// Key prefix every entry image is stored under.
pub const ENTRY_BLOB_PREFIX: &str = "entries";

/// Path-addressed binary store that can issue retrieval URLs.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    /// Store `payload` under `key`, reporting transfer progress in percent.
    async fn put(
        &self,
        key: &str,
        payload: &ImagePayload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()>;

    /// Durable, publicly fetchable URL for a stored key.
    async fn resolve_url(&self, key: &str) -> Result<String>;
}

/// Stand-in for deployments without blob storage; every upload fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlobStore;

impl BlobStore for NoBlobStore {
    async fn put(
        &self,
        _key: &str,
        _payload: &ImagePayload,
        _progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        Err(Error::UploadFailed(
            "Blob storage is not configured".to_string(),
        ))
    }

    async fn resolve_url(&self, key: &str) -> Result<String> {
        Err(Error::UrlResolutionFailed(format!(
            "Blob storage is not configured for {key}"
        )))
    }
}

/// Uploads one image per call under `entries/{owner}_{timestamp}`.
#[derive(Debug, Clone)]
pub struct BlobUploader<B> {
    store: B,
}

impl<B: BlobStore> BlobUploader<B> {
    pub const fn new(store: B) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &B {
        &self.store
    }

    /// Upload `payload` for `owner` and return its retrieval URL.
    ///
    /// `on_progress` sees a non-decreasing sequence starting at 0 and, on a
    /// successful transfer, ending at 100. Transfer failures surface as
    /// [`Error::UploadFailed`]; a stored blob without a URL surfaces as
    /// [`Error::UrlResolutionFailed`].
    pub async fn upload(
        &self,
        owner: &OwnerId,
        payload: &ImagePayload,
        on_progress: impl FnMut(u8),
    ) -> Result<String> {
        if payload.is_empty() {
            return Err(Error::UploadFailed("Image payload is empty".to_string()));
        }

        let key = build_blob_key(
            owner,
            payload.content_type.as_deref(),
            unix_timestamp_millis_now(),
        )?;
        tracing::debug!("Uploading {} bytes to {key}", payload.len());

        let mut progress = ProgressTracker::new(on_progress);
        progress.report(0);
        self.store
            .put(&key, payload, &mut |percent: u8| progress.report(percent))
            .await
            .map_err(|error| match error {
                Error::UploadFailed(_) => error,
                other => Error::UploadFailed(other.to_string()),
            })?;
        progress.report(100);

        self.store
            .resolve_url(&key)
            .await
            .map_err(|error| match error {
                Error::UrlResolutionFailed(_) => error,
                other => Error::UrlResolutionFailed(other.to_string()),
            })
    }
}

/// Build the storage key for an owner's image uploaded at `timestamp_ms`.
///
/// The owner id keeps its case; characters outside the unreserved URL set are
/// percent-escaped so distinct owners never share a key.
pub fn build_blob_key(
    owner: &OwnerId,
    content_type: Option<&str>,
    timestamp_ms: i64,
) -> Result<String> {
    let owner = owner.as_str().trim();
    if owner.is_empty() {
        return Err(Error::UploadFailed(
            "Owner id cannot be empty".to_string(),
        ));
    }

    let owner = urlencoding::encode(owner);
    let key = format!("{ENTRY_BLOB_PREFIX}/{owner}_{timestamp_ms}");
    Ok(match content_type.and_then(extension_for) {
        Some(extension) => format!("{key}.{extension}"),
        None => key,
    })
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let content_type = content_type.trim().to_ascii_lowercase();
    match content_type.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|extensions| extensions.first().copied()),
    }
}

/// Forwards only increasing percentages, clamped to 100.
struct ProgressTracker<F> {
    last: Option<u8>,
    callback: F,
}

impl<F: FnMut(u8)> ProgressTracker<F> {
    const fn new(callback: F) -> Self {
        Self {
            last: None,
            callback,
        }
    }

    fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.map_or(true, |last| percent > last) {
            self.last = Some(percent);
            (self.callback)(percent);
        }
    }
}
