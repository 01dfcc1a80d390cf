//! Shared bearer-token cell
//!
//! The session tracker owns the session; every table and storage client
//! reads the access token through this cell so a sign-in or sign-out is
//! visible to all of them at once.

use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct AuthToken(Arc<RwLock<Option<String>>>);

impl AuthToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: &str) {
        *self
            .0
            .write()
            .expect("token lock poisoned — prior access panicked") = Some(token.to_string());
    }

    pub fn clear(&self) {
        *self
            .0
            .write()
            .expect("token lock poisoned — prior access panicked") = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .expect("token lock poisoned — prior access panicked")
            .clone()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuthToken")
            .field(&self.get().map(|_| "[REDACTED]"))
            .finish()
    }
}
