//! Error types for journal-core

use std::fmt;

use thiserror::Error;

/// Result type alias using journal-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Input field a validation error is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Thoughts,
    Email,
    Password,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Thoughts => "thoughts",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in journal-core operations.
///
/// Backend adapters classify their native failures into one of these kinds at
/// the boundary; workflows re-surface them unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Local input check failed; no backend was contacted
    #[error("Invalid {field}: {reason}")]
    Validation { field: Field, reason: String },

    /// Unknown account or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Sign-up for an email that already has an account
    #[error("An account with this email already exists")]
    EmailInUse,

    /// Email rejected by the auth provider
    #[error("Email address is not valid")]
    InvalidEmail,

    /// Sign-up accepted but a confirmed email is needed before signing in
    #[error("Check your inbox to confirm your email before signing in")]
    ConfirmationRequired,

    /// A workflow was entered without an authenticated identity
    #[error("Not signed in")]
    NotSignedIn,

    /// Connectivity failure reaching a backend
    #[error("Network error: {0}")]
    Network(String),

    /// Backend refused the operation for the current identity
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Backend is reachable but temporarily cannot serve the request
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Collection or resource is missing (usually misconfiguration)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Blob transfer to storage failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Blob was stored but no retrieval URL could be issued
    #[error("Uploaded image URL could not be resolved: {0}")]
    UrlResolutionFailed(String),

    /// Adapter construction or environment problem
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Anything the boundary could not classify
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn validation(field: Field, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Field the error is scoped to, for validation errors.
    #[must_use]
    pub const fn field(&self) -> Option<Field> {
        match self {
            Self::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::InvalidCredentials
            | Self::EmailInUse
            | Self::InvalidEmail
            | Self::ConfirmationRequired
            | Self::NotSignedIn => ErrorCategory::Credential,
            Self::PermissionDenied(_) => ErrorCategory::Permission,
            Self::Network(_) | Self::Unavailable(_) => ErrorCategory::Availability,
            Self::NotFound(_) | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::UploadFailed(_) | Self::UrlResolutionFailed(_) => ErrorCategory::Storage,
            Self::Unknown(_) => ErrorCategory::Unknown,
        }
    }
}

/// Coarse, user-facing grouping of [`Error`] kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Credential,
    Permission,
    Availability,
    Configuration,
    Storage,
    Unknown,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Credential => "credential",
            Self::Permission => "permission",
            Self::Availability => "availability",
            Self::Configuration => "configuration",
            Self::Storage => "storage",
            Self::Unknown => "unknown",
        }
    }

    /// Actionable message suitable for showing to the user.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Validation => "Please fix the highlighted field and try again.",
            Self::Credential => "Please check your account details and sign in again.",
            Self::Permission => "Permission denied. Please check the backend access rules.",
            Self::Availability => {
                "The service is currently unavailable. Please check your connection and try again."
            }
            Self::Configuration => {
                "The backend is not configured correctly. Please check your configuration."
            }
            Self::Storage => "The image could not be uploaded. The entry was not saved.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
