//! Errors returned by user-initiated session operations
//!
//! Internal housekeeping (restore, periodic check, profile sync) never
//! surfaces errors; the explicit operations return this type so the
//! caller can render a user-facing message.

use thiserror::Error;
use unilearn_identity::IdentityError;
use unilearn_store::StoreError;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("not signed in")]
    NotSignedIn,
}

impl ActionError {
    /// Fixed user-facing message key, resolved through the translation
    /// catalog; `None` means the raw message is shown verbatim.
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            ActionError::Identity(e) => e.message_key(),
            // A conflicting profile insert during sign-up means the
            // account already exists
            ActionError::Store(StoreError::Conflict(_)) => Some("auth.alreadyRegistered"),
            ActionError::Store(StoreError::Transport(_)) => Some("auth.networkError"),
            ActionError::Store(_) => None,
            ActionError::NotSignedIn => Some("auth.notSignedIn"),
        }
    }
}
