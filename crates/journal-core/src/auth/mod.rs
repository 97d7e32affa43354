//! Identity session on top of a pluggable auth provider.

mod supabase;

use tokio::sync::watch;

use crate::error::{Error, Field, Result};
use crate::models::Identity;

pub use supabase::{
    classify_api_error, normalize_auth_url, AuthSession, SessionPersistence, SupabaseAuthProvider,
};

/// Minimum accepted password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hosted identity backend.
///
/// Implementations classify every failure into the crate [`Error`] taxonomy
/// from typed provider codes.
#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    /// Authenticate an existing account
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    /// Create an account and authenticate it
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    /// Tell the provider the session is over and drop persisted credentials
    async fn sign_out(&self) -> Result<()>;

    /// Identity from persisted credentials, if any are still valid
    async fn restore(&self) -> Result<Option<Identity>>;
}

/// Process-lifetime holder of the current identity.
///
/// The session is passed explicitly to the workflows; they read
/// [`IdentitySession::current_identity`] at each entry point instead of
/// caching it.
pub struct IdentitySession<P> {
    provider: P,
    current: watch::Sender<Option<Identity>>,
}

impl<P: AuthProvider> IdentitySession<P> {
    pub fn new(provider: P) -> Self {
        let (current, _) = watch::channel(None);
        Self { provider, current }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Current identity or `None`. Side-effect free.
    pub fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Current identity, or [`Error::NotSignedIn`].
    pub fn require_identity(&self) -> Result<Identity> {
        self.current_identity().ok_or(Error::NotSignedIn)
    }

    /// Receiver notified on every sign-in, sign-up and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    /// Load the identity from persisted credentials at app start.
    pub async fn restore(&self) -> Result<Option<Identity>> {
        let identity = self.provider.restore().await?;
        if let Some(identity) = &identity {
            tracing::debug!("Restored session for {}", identity.id);
        }
        self.current.send_replace(identity.clone());
        Ok(identity)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let email = validate_credentials(email, password)?;
        let identity = self.provider.sign_in(email, password).await?;
        tracing::info!("Signed in as {}", identity.display_name());
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Create an account; the password length is checked before the provider
    /// is contacted.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let email = validate_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(
                Field::Password,
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let identity = self.provider.sign_up(email, password).await?;
        tracing::info!("Created account for {}", identity.display_name());
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Clear the current identity. Provider failures are logged, not returned.
    pub async fn sign_out(&self) {
        if let Err(error) = self.provider.sign_out().await {
            tracing::warn!("Provider sign-out failed, clearing local session anyway: {error}");
        }
        self.current.send_replace(None);
    }
}

/// Require a non-empty email and password; returns the trimmed email.
fn validate_credentials<'a>(email: &'a str, password: &str) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::validation(Field::Email, "Email is required"));
    }
    if password.trim().is_empty() {
        return Err(Error::validation(Field::Password, "Password is required"));
    }
    Ok(email)
}
