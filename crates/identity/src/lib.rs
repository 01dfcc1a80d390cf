//! Unilearn identity provider client
//!
//! Talks to the hosted identity service (credential verification, token
//! issuance and refresh, OAuth redirects) and pushes auth-state changes
//! to subscribers. Provides:
//! - GoTrue-style HTTP client for production
//! - Mock identity service for testing and development
//! - Provider error classification into fixed user-facing message keys

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

use tokio::sync::broadcast;

pub use client::GotrueClient;
pub use error::{user_message_key, IdentityError};
pub use mock::MockIdentityService;
pub use types::{
    AuthChange, AuthEventKind, IdentityUser, OAuthProvider, OtpKind, Session, SignUpResult,
    UserAttributes, UserMetadata,
};

/// Identity provider configuration.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Base URL of the hosted backend; auth endpoints live under `/auth/v1`
    pub base_url: String,
    /// Publishable API key sent as `apikey` with every request
    pub anon_key: String,
    /// Service-role key for administrative calls (identity deletion)
    pub service_role_key: Option<String>,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl IdentityConfig {
    pub fn from_config(config: &unilearn_common::Config) -> Self {
        Self {
            base_url: config.backend_url.clone(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }
}

/// Identity service trait for different implementations.
///
/// Every operation is a direct request/response call; the service also
/// emits [`AuthChange`] events (signed-in, signed-out, user-updated,
/// token-refreshed) over a broadcast channel, in emission order.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Session the provider currently considers live, if any.
    async fn current_session(&self) -> Result<Option<Session>, IdentityError>;

    /// User record behind the current session.
    async fn current_user(&self) -> Result<Option<IdentityUser>, IdentityError>;

    /// Verify credentials and establish a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// Build the OAuth authorize URL the host should navigate to.
    fn oauth_authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> String;

    /// Create a new identity. The session is absent while email
    /// confirmation is pending.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<SignUpResult, IdentityError>;

    /// Invalidate the current session on the provider side.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Exchange a refresh token for a renewed session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, IdentityError>;

    /// Re-establish a session from a persisted token pair.
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, IdentityError>;

    /// Send a password-recovery email.
    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError>;

    /// Update attributes (password, metadata) of the signed-in user.
    async fn update_user(&self, attributes: UserAttributes) -> Result<IdentityUser, IdentityError>;

    /// Verify a one-time code (email confirmation, recovery).
    async fn verify_otp(&self, token_hash: &str, kind: OtpKind) -> Result<Session, IdentityError>;

    /// Resend the signup confirmation email.
    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError>;

    /// Administrative identity deletion, used to roll back a sign-up
    /// whose profile insert failed.
    async fn delete_user(&self, id: uuid::Uuid) -> Result<(), IdentityError>;

    /// Subscribe to auth-state change events.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}
