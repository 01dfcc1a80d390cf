//! Identity provider wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unilearn_common::Role;
use uuid::Uuid;

/// Short-lived credential pair plus expiry, representing an
/// authenticated context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds, as the provider sends it
    pub expires_at: i64,
    pub user: IdentityUser,
}

impl Session {
    /// Whether `expires_at` is no longer in the future.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// User record owned by the identity provider.
///
/// Distinct from the application-level profile row; carries only what
/// the provider knows (credentials metadata, confirmation state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Optional metadata attached to the identity at sign-up.
///
/// Explicit optional fields with documented defaults: a missing full
/// name falls back to the local part of the email, a missing role to
/// student. The fallbacks are applied at profile-provisioning time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Outcome of identity creation.
#[derive(Debug, Clone)]
pub struct SignUpResult {
    pub user: IdentityUser,
    /// Absent while email confirmation is pending
    pub session: Option<Session>,
}

/// Attributes accepted by the update-user operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UserMetadata>,
}

/// OAuth providers the platform offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
        }
    }
}

/// One-time code flavours accepted by verify/resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpKind {
    Email,
    Signup,
    Recovery,
}

impl OtpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpKind::Email => "email",
            OtpKind::Signup => "signup",
            OtpKind::Recovery => "recovery",
        }
    }
}

/// Auth-state transitions pushed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    UserUpdated,
    TokenRefreshed,
}

impl std::fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventKind::SignedIn => write!(f, "signed_in"),
            AuthEventKind::SignedOut => write!(f, "signed_out"),
            AuthEventKind::UserUpdated => write!(f, "user_updated"),
            AuthEventKind::TokenRefreshed => write!(f, "token_refreshed"),
        }
    }
}

/// Event payload delivered to subscribers.
#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthEventKind,
    pub session: Option<Session>,
}
