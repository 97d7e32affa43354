//! Supabase GoTrue auth provider.

use std::fmt;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::SupabaseConfig;
use crate::error::{Error, Field, Result};
use crate::models::Identity;
use crate::util::{compact_text, unix_timestamp_now};

use super::AuthProvider;

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: Identity,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Where an authenticated session survives between process runs.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> Result<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> Result<()>;
    fn clear_session(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct SupabaseAuthProvider<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthProvider<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> Result<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::Configuration(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .build()
            .map_err(|error| Error::Configuration(format!("HTTP client: {error}")))?;

        Ok(Self {
            auth_url,
            anon_key,
            client,
            store,
        })
    }

    pub fn from_config(config: &SupabaseConfig, store: S) -> Result<Self> {
        Self::new(&config.url, config.anon_key.clone(), store)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(Error::Configuration(
                "Refresh token must not be empty".to_string(),
            ));
        }

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "refresh_token")])
                .json(&payload),
        );
        let response = self.send_auth_request(request).await?;
        let session = response.into_session()?.ok_or_else(|| {
            Error::Unknown("Refresh response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send_auth_request(&self, request: RequestBuilder) -> Result<SupabaseAuthResponse> {
        let response = request
            .send()
            .await
            .map_err(|error| classify_transport_error(&error))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }
        response
            .json::<SupabaseAuthResponse>()
            .await
            .map_err(|error| Error::Unknown(format!("Invalid auth response: {error}")))
    }

    async fn revoke(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| classify_transport_error(&error))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_api_error(status, &body))
    }
}

impl<S: SessionPersistence> AuthProvider for SupabaseAuthProvider<S> {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "password")])
                .json(&payload),
        );

        let response = self
            .send_auth_request(request)
            .await
            .map_err(unavailable_as_network)?;
        let session = response.into_session()?.ok_or_else(|| {
            Error::Unknown("Sign-in response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        Ok(session.user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/signup", self.auth_url))
                .json(&payload),
        );
        let response = self
            .send_auth_request(request)
            .await
            .map_err(unavailable_as_network)?;
        match response.into_session()? {
            Some(session) => {
                self.store.save_session(&session)?;
                Ok(session.user)
            }
            None => Err(Error::ConfirmationRequired),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let remote = match self.store.load_session() {
            Ok(Some(session)) => self.revoke(&session.access_token).await,
            Ok(None) => Ok(()),
            Err(error) => {
                tracing::warn!("Discarding unreadable persisted session: {}", error);
                Ok(())
            }
        };

        self.store.clear_session()?;
        remote
    }

    async fn restore(&self) -> Result<Option<Identity>> {
        let stored_session = match self.store.load_session() {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(None),
            Err(error) => {
                tracing::warn!("Failed to read persisted session: {}", error);
                self.store.clear_session()?;
                return Ok(None);
            }
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session.user));
        }

        match self.refresh_session(&stored_session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed.user)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }
}

pub fn normalize_auth_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Configuration(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Configuration(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/auth/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/auth/v1"))
    }
}

/// Map a GoTrue error response to the error taxonomy.
///
/// Only the structured `error_code` / `error` fields and the HTTP status are
/// consulted; the human-readable message is kept as detail text.
pub fn classify_api_error(status: StatusCode, body: &str) -> Error {
    let payload = serde_json::from_str::<SupabaseErrorResponse>(body).ok();
    let code = payload
        .as_ref()
        .and_then(|payload| payload.error_code.clone().or_else(|| payload.error.clone()));
    let detail = describe_api_error(status, body, payload);

    match code.as_deref() {
        Some("invalid_credentials" | "invalid_grant" | "user_not_found") => {
            Error::InvalidCredentials
        }
        Some("email_exists" | "user_already_exists") => Error::EmailInUse,
        Some("email_address_invalid" | "validation_failed") => Error::InvalidEmail,
        Some("email_not_confirmed") => Error::ConfirmationRequired,
        Some("weak_password") => Error::validation(Field::Password, detail),
        _ if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
            Error::Unavailable(detail)
        }
        _ => Error::Unknown(detail),
    }
}

/// Sign-in and sign-up report an overloaded or rate-limited provider as a network failure.
fn unavailable_as_network(error: Error) -> Error {
    match error {
        Error::Unavailable(detail) => Error::Network(detail),
        other => other,
    }
}

fn classify_transport_error(error: &reqwest::Error) -> Error {
    if error.is_connect() || error.is_timeout() || error.is_request() {
        Error::Network(error.to_string())
    } else {
        Error::Unknown(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseAuthResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<SupabaseUser>,
    session: Option<SupabaseAuthResponseSession>,
}

impl SupabaseAuthResponse {
    fn into_session(self) -> Result<Option<AuthSession>> {
        let nested_session = self.session;
        let access_token = self.access_token.or_else(|| {
            nested_session
                .as_ref()
                .and_then(|session| session.access_token.clone())
        });
        let refresh_token = self.refresh_token.or_else(|| {
            nested_session
                .as_ref()
                .and_then(|session| session.refresh_token.clone())
        });
        let expires_at = self
            .expires_at
            .or_else(|| {
                nested_session
                    .as_ref()
                    .and_then(|session| session.expires_at)
            })
            .or_else(|| {
                self.expires_in
                    .or_else(|| {
                        nested_session
                            .as_ref()
                            .and_then(|session| session.expires_in)
                    })
                    .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
            });
        let user = self
            .user
            .or_else(|| nested_session.and_then(|session| session.user))
            .map(Into::into);

        match (access_token, refresh_token, expires_at, user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            (None, None, None, Some(_)) => Ok(None),
            _ => Err(Error::Unknown(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseAuthResponseSession {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<SupabaseUser>,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    email: Option<String>,
}

impl From<SupabaseUser> for Identity {
    fn from(value: SupabaseUser) -> Self {
        Self::new(value.id, value.email)
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseErrorResponse {
    error_code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn describe_api_error(
    status: StatusCode,
    body: &str,
    payload: Option<SupabaseErrorResponse>,
) -> String {
    if let Some(message) = payload.and_then(|payload| {
        payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
    }) {
        return format!("{} ({})", message.trim(), status.as_u16());
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_auth_url_appends_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn normalize_auth_url_keeps_existing_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co/auth/v1/").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn normalize_auth_url_rejects_missing_scheme() {
        assert!(matches!(
            normalize_auth_url("demo.supabase.co"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn response_without_session_fields_means_confirmation_required() {
        let response = SupabaseAuthResponse {
            access_token: None,
            refresh_token: None,
            expires_at: None,
            expires_in: None,
            user: Some(SupabaseUser {
                id: "user".to_string(),
                email: Some("user@example.com".to_string()),
            }),
            session: None,
        };
        assert!(response.into_session().unwrap().is_none());
    }

    #[test]
    fn response_with_expires_in_builds_session() {
        let response: SupabaseAuthResponse = serde_json::from_str(
            r#"{
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": 3600,
                "user": {"id": "uid-1", "email": "ada@example.com"}
            }"#,
        )
        .unwrap();

        let session = response.into_session().unwrap().unwrap();
        assert_eq!(session.user, Identity::new("uid-1", Some("ada@example.com".into())));
        assert!(!session.is_expired());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 1_700_000_000,
            user: Identity::new("user", None),
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn classify_uses_error_code_not_message() {
        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"anything at all"}"#;
        assert_eq!(
            classify_api_error(StatusCode::BAD_REQUEST, body),
            Error::InvalidCredentials
        );

        let misleading = r#"{"code":400,"msg":"email address is already in use"}"#;
        assert!(matches!(
            classify_api_error(StatusCode::BAD_REQUEST, misleading),
            Error::Unknown(_)
        ));
    }

    #[test]
    fn classify_legacy_invalid_grant() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            classify_api_error(StatusCode::BAD_REQUEST, body),
            Error::InvalidCredentials
        );
    }

    #[test]
    fn classify_sign_up_codes() {
        let exists = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert_eq!(
            classify_api_error(StatusCode::UNPROCESSABLE_ENTITY, exists),
            Error::EmailInUse
        );

        let invalid = r#"{"code":400,"error_code":"email_address_invalid","msg":"bad"}"#;
        assert_eq!(
            classify_api_error(StatusCode::BAD_REQUEST, invalid),
            Error::InvalidEmail
        );

        let weak = r#"{"code":422,"error_code":"weak_password","msg":"Password is too weak"}"#;
        assert_eq!(
            classify_api_error(StatusCode::UNPROCESSABLE_ENTITY, weak).field(),
            Some(Field::Password)
        );
    }

    #[test]
    fn classify_server_errors_as_unavailable() {
        assert!(matches!(
            classify_api_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            Error::Unavailable(_)
        ));
        assert!(matches!(
            classify_api_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            Error::Unavailable(message) if message == "slow down (429)"
        ));
    }

    #[test]
    fn sign_in_reports_overloaded_provider_as_network() {
        let overloaded = classify_api_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(
            unavailable_as_network(overloaded),
            Error::Network(message) if message == "slow down (429)"
        ));
        assert_eq!(
            unavailable_as_network(Error::InvalidCredentials),
            Error::InvalidCredentials
        );
    }
}
