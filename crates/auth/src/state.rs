//! Session state machine
//!
//! Defines the valid auth-status states, the events that move between
//! them, and the transition table. The tracker funnels every status
//! change through [`SessionStateMachine::transition`] so invalid moves
//! are caught in one place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot leave {from} via {event}")]
    InvalidTransition { from: String, event: String },
}

/// Session/auth status.
///
/// `Anonymous` is the initial state and the state reached by explicit
/// sign-out. `Authenticated` is re-entrant: profile updates and token
/// refreshes do not leave it. `Expired` is transient and always
/// resolves to `Anonymous` after cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    TokenRefreshing,
    Expired,
}

impl SessionState {
    /// Whether a session is currently live (periodic validation runs
    /// only in these states).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Authenticated | Self::TokenRefreshing)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::TokenRefreshing => write!(f, "token_refreshing"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Events that trigger session state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user-initiated sign-in began
    StartSignIn,
    /// A session was adopted (sign-in, restore, or provider push)
    SignedIn,
    /// The sign-in attempt failed
    SignInFailed,
    /// An explicit refresh attempt began
    StartRefresh,
    /// The refresh produced a renewed session
    RefreshSucceeded,
    /// The session can no longer be considered valid
    Expire,
    /// Explicit sign-out
    SignOut,
    /// Post-expiry cleanup finished
    Cleanup,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartSignIn => write!(f, "start_sign_in"),
            Self::SignedIn => write!(f, "signed_in"),
            Self::SignInFailed => write!(f, "sign_in_failed"),
            Self::StartRefresh => write!(f, "start_refresh"),
            Self::RefreshSucceeded => write!(f, "refresh_succeeded"),
            Self::Expire => write!(f, "expire"),
            Self::SignOut => write!(f, "sign_out"),
            Self::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Session state machine
pub struct SessionStateMachine;

impl SessionStateMachine {
    /// Attempt a state transition.
    pub fn transition(
        current: SessionState,
        event: SessionEvent,
    ) -> Result<SessionState, StateError> {
        use SessionEvent as E;
        use SessionState as S;

        let next = match (current, event) {
            (S::Anonymous, E::StartSignIn) => S::Authenticating,
            // Restoration and provider-pushed sign-in adopt directly
            (S::Anonymous, E::SignedIn) => S::Authenticated,

            (S::Authenticating, E::SignedIn) => S::Authenticated,
            (S::Authenticating, E::SignInFailed) => S::Anonymous,
            (S::Authenticating, E::SignOut) => S::Anonymous,

            // Re-entrant: token refreshes and user updates stay put
            (S::Authenticated, E::SignedIn) => S::Authenticated,
            (S::Authenticated, E::StartRefresh) => S::TokenRefreshing,
            (S::Authenticated, E::Expire) => S::Expired,
            (S::Authenticated, E::SignOut) => S::Anonymous,

            (S::TokenRefreshing, E::RefreshSucceeded) => S::Authenticated,
            (S::TokenRefreshing, E::SignedIn) => S::Authenticated,
            (S::TokenRefreshing, E::Expire) => S::Expired,
            (S::TokenRefreshing, E::SignOut) => S::Anonymous,

            (S::Expired, E::Cleanup) => S::Anonymous,

            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: SessionState, event: SessionEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
