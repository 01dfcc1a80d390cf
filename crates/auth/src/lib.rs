//! Session lifecycle tracking for the Unilearn client
//!
//! Keeps the in-memory notion of "current session/user" consistent with
//! the identity provider's live state and with the durable session
//! record that survives restarts, and proactively terminates the local
//! session when it can no longer be considered valid.
//!
//! One explicitly constructed [`SessionTracker`] is owned by the host
//! and handed to whatever UI layer needs it: initialized on startup,
//! torn down with the tab.

mod backend;
mod error;
mod navigator;
mod permissions;
mod session_store;
mod state;
mod tracker;

pub use backend::{AuthProfile, ProfileBackend, SignUpData};
pub use error::ActionError;
pub use navigator::{LoggingNavigator, Navigator, RecordingNavigator};
pub use permissions::{role_can_access, role_resources};
pub use session_store::{
    FileSessionStore, MemorySessionStore, SessionStore, SessionStoreError, StoredSession,
};
pub use state::{SessionEvent, SessionState, SessionStateMachine, StateError};
pub use tracker::{SessionTracker, SignUpOutcome, TrackerSettings};
