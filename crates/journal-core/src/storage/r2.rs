//! Cloudflare R2 blob store over the S3-compatible API.

use std::env;

use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use aws_types::region::Region;

use crate::error::{Error, Result};
use crate::models::ImagePayload;

use super::BlobStore;

const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_PUBLIC_BASE_URL: &str = "R2_PUBLIC_BASE_URL";

/// Payloads above this size are sent as a multipart upload, one part each.
const MULTIPART_PART_SIZE: usize = 5 * 1024 * 1024;

/// Cloudflare R2 configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Public URL base for serving images; required to resolve retrieval URLs.
    pub public_base_url: Option<String>,
}

impl R2Config {
    /// Load R2 configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no R2 variables are set.
    /// Returns an error when only a partial configuration is provided.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        parse_config(lookup)
    }

    /// Cloudflare R2 S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

/// R2-backed [`BlobStore`].
#[derive(Clone, Debug)]
pub struct R2BlobStore {
    config: R2Config,
    client: Client,
}

impl R2BlobStore {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| {
                Error::Unavailable(describe_failure("head_bucket", &self.config.bucket, None, error))
            })?;
        Ok(())
    }

    /// Public URL for an object key when a public base URL is configured.
    #[must_use]
    pub fn public_object_url(&self, object_key: &str) -> Option<String> {
        let base = self.config.public_base_url.as_ref()?;
        let key = object_key.trim_matches('/');
        if key.is_empty() {
            return None;
        }

        let key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Some(format!("{base}/{key}"))
    }

    async fn put_single(&self, key: &str, payload: &ImagePayload) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(ByteStream::from(payload.bytes.clone()));

        if let Some(content_type) = normalize_content_type(payload.content_type.as_deref()) {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|error| self.upload_error("put_object", key, error))?;
        Ok(())
    }

    async fn put_multipart(
        &self,
        key: &str,
        payload: &ImagePayload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        let mut request = self
            .client
            .create_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key);
        if let Some(content_type) = normalize_content_type(payload.content_type.as_deref()) {
            request = request.content_type(content_type);
        }

        let created = request
            .send()
            .await
            .map_err(|error| self.upload_error("create_multipart_upload", key, error))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| {
                Error::UploadFailed(format!("R2 did not return an upload id for {key}"))
            })?
            .to_string();

        match self.send_parts(key, &upload_id, payload, progress).await {
            Ok(parts) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(&self.config.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(|error| self.upload_error("complete_multipart_upload", key, error))?;
                Ok(())
            }
            Err(error) => {
                if let Err(abort_error) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.config.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!("Failed to abort multipart upload for {key}: {abort_error}");
                }
                Err(error)
            }
        }
    }

    async fn send_parts(
        &self,
        key: &str,
        upload_id: &str,
        payload: &ImagePayload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<Vec<CompletedPart>> {
        let total = payload.bytes.len();
        let mut sent = 0usize;
        let mut parts = Vec::new();

        for (index, chunk) in payload.bytes.chunks(MULTIPART_PART_SIZE).enumerate() {
            let part_number = i32::try_from(index + 1)
                .map_err(|_| Error::UploadFailed(format!("Too many parts for {key}")))?;
            let uploaded = self
                .client
                .upload_part()
                .bucket(&self.config.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk.to_vec()))
                .send()
                .await
                .map_err(|error| self.upload_error("upload_part", key, error))?;

            parts.push(
                CompletedPart::builder()
                    .set_e_tag(uploaded.e_tag().map(ToOwned::to_owned))
                    .part_number(part_number)
                    .build(),
            );

            sent += chunk.len();
            progress(percent_of(sent, total));
        }

        Ok(parts)
    }

    fn upload_error(&self, operation: &str, key: &str, error: impl std::fmt::Display) -> Error {
        Error::UploadFailed(describe_failure(
            operation,
            &self.config.bucket,
            Some(key),
            error,
        ))
    }
}

impl BlobStore for R2BlobStore {
    async fn put(
        &self,
        key: &str,
        payload: &ImagePayload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        let key = normalize_object_key(key)?;
        if payload.bytes.len() <= MULTIPART_PART_SIZE {
            self.put_single(&key, payload).await?;
            progress(100);
            return Ok(());
        }
        self.put_multipart(&key, payload, progress).await
    }

    async fn resolve_url(&self, key: &str) -> Result<String> {
        self.public_object_url(key).ok_or_else(|| {
            Error::UrlResolutionFailed(format!(
                "{ENV_PUBLIC_BASE_URL} is not configured; cannot issue a URL for {key}"
            ))
        })
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<R2Config>> {
    let account_id = lookup(ENV_ACCOUNT_ID).map(|value| value.trim().to_string());
    let bucket = lookup(ENV_BUCKET).map(|value| value.trim().to_string());
    let access_key_id = lookup(ENV_ACCESS_KEY_ID).map(|value| value.trim().to_string());
    let secret_access_key = lookup(ENV_SECRET_ACCESS_KEY).map(|value| value.trim().to_string());
    let public_base_url = lookup(ENV_PUBLIC_BASE_URL).map(|value| value.trim().to_string());

    let any_present = account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some()
        || public_base_url.is_some();

    if !any_present {
        return Ok(None);
    }

    let mut missing = Vec::new();
    let account_id = required(account_id, ENV_ACCOUNT_ID, &mut missing);
    let bucket = required(bucket, ENV_BUCKET, &mut missing);
    let access_key_id = required(access_key_id, ENV_ACCESS_KEY_ID, &mut missing);
    let secret_access_key = required(secret_access_key, ENV_SECRET_ACCESS_KEY, &mut missing);

    match (account_id, bucket, access_key_id, secret_access_key) {
        (Some(account_id), Some(bucket), Some(access_key_id), Some(secret_access_key)) => {
            Ok(Some(R2Config {
                account_id,
                bucket,
                access_key_id,
                secret_access_key,
                public_base_url: normalize_public_base_url(public_base_url)?,
            }))
        }
        _ => Err(Error::Configuration(format!(
            "R2 configuration is incomplete. Missing: {}",
            missing.join(", ")
        ))),
    }
}

fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let value = value.filter(|value| !value.is_empty());
    if value.is_none() {
        missing.push(name);
    }
    value
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "journal-core-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn describe_failure(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: impl std::fmt::Display,
) -> String {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    format!("R2 {operation} failed for {target}: {error}")
}

fn percent_of(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(sent.saturating_mul(100) / total).unwrap_or(100)
}

fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(Error::UploadFailed(
            "Object key cannot be empty".to_string(),
        ));
    }
    Ok(object_key)
}

fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn normalize_public_base_url(public_base_url: Option<String>) -> Result<Option<String>> {
    let Some(value) = public_base_url else {
        return Ok(None);
    };

    if value.is_empty() {
        return Ok(None);
    }
    if !value.starts_with("https://") && !value.starts_with("http://") {
        return Err(Error::Configuration(format!(
            "{ENV_PUBLIC_BASE_URL} must start with http:// or https://"
        )));
    }

    Ok(Some(value.trim_end_matches('/').to_string()))
}
