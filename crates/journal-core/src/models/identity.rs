//! Authenticated identity model

use std::fmt;

use serde::{Deserialize, Serialize};

const FALLBACK_DISPLAY_NAME: &str = "User";

/// Opaque identifier of an entry owner, as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: OwnerId,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<OwnerId>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }

    /// Display identifier copied onto entries: the email, or `"User"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string()
    }
}

impl From<String> for OwnerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_email() {
        let identity = Identity::new("uid-1", Some("ada@example.com".to_string()));
        assert_eq!(identity.display_name(), "ada@example.com");
    }

    #[test]
    fn display_name_falls_back_to_user() {
        assert_eq!(Identity::new("uid-1", None).display_name(), "User");
        assert_eq!(
            Identity::new("uid-1", Some("  ".to_string())).display_name(),
            "User"
        );
    }

    #[test]
    fn owner_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&OwnerId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
