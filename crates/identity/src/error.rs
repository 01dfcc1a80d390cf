//! Identity provider errors and user-facing message mapping

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Network-level failure before a provider response arrived
    #[error("identity request failed: {0}")]
    Transport(String),

    /// Error response from the provider
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// Operation requires a signed-in session
    #[error("no active session")]
    NoSession,

    /// Administrative call attempted without a service-role key
    #[error("service role key required for administrative calls")]
    MissingServiceRole,

    #[error("failed to decode identity response: {0}")]
    Decode(String),
}

impl IdentityError {
    /// Fixed user-facing message key for this error, if one applies.
    ///
    /// Callers render the key through the translation catalog and fall
    /// back to the raw provider message when `None`.
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            IdentityError::Provider { message, .. } => user_message_key(message),
            IdentityError::Transport(_) => Some("auth.networkError"),
            IdentityError::NoSession => Some("auth.sessionExpired"),
            IdentityError::MissingServiceRole | IdentityError::Decode(_) => None,
        }
    }
}

/// Map a raw provider error string to a fixed user-facing message key.
///
/// Matching is case-insensitive substring search, mirroring the loose
/// phrasing the provider uses across endpoints. Unmapped messages
/// return `None` and are shown verbatim.
pub fn user_message_key(provider_message: &str) -> Option<&'static str> {
    const MAPPINGS: [(&str, &str); 9] = [
        ("invalid login credentials", "auth.invalidCredentials"),
        ("email not confirmed", "auth.emailNotConfirmed"),
        ("user already registered", "auth.alreadyRegistered"),
        ("password should be at least", "auth.weakPassword"),
        ("invalid email", "auth.invalidEmail"),
        ("network request failed", "auth.networkError"),
        ("rate_limit", "auth.rateLimited"),
        ("user_not_found", "auth.userNotFound"),
        ("session_expired", "auth.sessionExpired"),
    ];

    let lowered = provider_message.to_lowercase();
    MAPPINGS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, key)| *key)
}
