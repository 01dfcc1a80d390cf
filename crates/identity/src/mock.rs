//! Mock identity service implementation
//!
//! Scriptable in-memory provider for tests: registered credentials,
//! queued refresh outcomes and failure switches. Records calls and
//! deleted identities for assertions. Thread-safe via `Arc<Mutex<>>`.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::IdentityError;
use crate::types::{
    AuthChange, AuthEventKind, IdentityUser, OAuthProvider, OtpKind, Session, SignUpResult,
    UserAttributes, UserMetadata,
};
use crate::IdentityService;

/// Build a session for tests, expiring `expires_in_secs` from now
/// (negative values produce an already-expired session).
pub fn test_session(email: &str, expires_in_secs: i64) -> Session {
    Session {
        access_token: format!("access-{}", Uuid::new_v4()),
        refresh_token: format!("refresh-{}", Uuid::new_v4()),
        expires_at: Utc::now().timestamp() + expires_in_secs,
        user: IdentityUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            email_confirmed_at: None,
            user_metadata: UserMetadata::default(),
        },
    }
}

#[derive(Default)]
struct MockState {
    current_session: Option<Session>,
    password_users: HashMap<String, (String, Session)>,
    refresh_result: Option<Session>,
    set_session_result: Option<Session>,
    fail_sign_out: bool,
    sign_up_error: Option<String>,
    deleted_users: Vec<Uuid>,
    calls: Vec<String>,
}

/// Mock identity service that records interactions for test assertions.
#[derive(Clone)]
pub struct MockIdentityService {
    state: Arc<Mutex<MockState>>,
    events: broadcast::Sender<AuthChange>,
}

impl MockIdentityService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            events,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .expect("mock state lock poisoned — prior test panicked")
    }

    /// Session the provider reports from `current_session`.
    pub fn set_current_session(&self, session: Option<Session>) {
        self.lock().current_session = session;
    }

    /// Register credentials accepted by `sign_in_with_password`.
    pub fn register_password(&self, email: &str, password: &str, session: Session) {
        self.lock()
            .password_users
            .insert(email.to_string(), (password.to_string(), session));
    }

    /// Session returned by the next `refresh_session`; `None` makes the
    /// refresh fail with a session-expired provider error.
    pub fn set_refresh_result(&self, session: Option<Session>) {
        self.lock().refresh_result = session;
    }

    /// Session returned by `set_session`; `None` makes it fail.
    pub fn set_set_session_result(&self, session: Option<Session>) {
        self.lock().set_session_result = session;
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.lock().fail_sign_out = fail;
    }

    /// Make `sign_up` fail with the given provider message.
    pub fn fail_sign_up(&self, message: &str) {
        self.lock().sign_up_error = Some(message.to_string());
    }

    /// Push an auth-state change to subscribers, as the provider would.
    pub fn emit(&self, event: AuthEventKind, session: Option<Session>) {
        let _ = self.events.send(AuthChange { event, session });
    }

    /// Names of provider operations invoked, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Identities removed through the administrative delete.
    pub fn deleted_user_ids(&self) -> Vec<Uuid> {
        self.lock().deleted_users.clone()
    }

    fn record(&self, call: &str) {
        self.lock().calls.push(call.to_string());
    }
}

impl Default for MockIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityService for MockIdentityService {
    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        self.record("current_session");
        Ok(self.lock().current_session.clone())
    }

    async fn current_user(&self) -> Result<Option<IdentityUser>, IdentityError> {
        self.record("current_user");
        Ok(self.lock().current_session.as_ref().map(|s| s.user.clone()))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        self.record("sign_in_with_password");
        let session = {
            let mut state = self.lock();
            match state.password_users.get(email) {
                Some((expected, session)) if expected == password => {
                    let session = session.clone();
                    state.current_session = Some(session.clone());
                    session
                }
                _ => {
                    return Err(IdentityError::Provider {
                        status: 400,
                        message: "Invalid login credentials".to_string(),
                    })
                }
            }
        };
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> String {
        format!(
            "mock://authorize?provider={}&redirect_to={}",
            provider.as_str(),
            redirect_to
        )
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: UserMetadata,
    ) -> Result<SignUpResult, IdentityError> {
        self.record("sign_up");
        if let Some(message) = self.lock().sign_up_error.clone() {
            return Err(IdentityError::Provider {
                status: 400,
                message,
            });
        }

        // Confirmation pending: identity exists, session does not
        Ok(SignUpResult {
            user: IdentityUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                email_confirmed_at: None,
                user_metadata: metadata,
            },
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.record("sign_out");
        let fail = {
            let mut state = self.lock();
            state.current_session = None;
            state.fail_sign_out
        };
        self.emit(AuthEventKind::SignedOut, None);
        if fail {
            return Err(IdentityError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    async fn refresh_session(&self, _refresh_token: &str) -> Result<Session, IdentityError> {
        self.record("refresh_session");
        let result = self.lock().refresh_result.clone();
        match result {
            Some(session) => {
                self.lock().current_session = Some(session.clone());
                self.emit(AuthEventKind::TokenRefreshed, Some(session.clone()));
                Ok(session)
            }
            None => Err(IdentityError::Provider {
                status: 401,
                message: "session_expired".to_string(),
            }),
        }
    }

    async fn set_session(
        &self,
        _access_token: &str,
        _refresh_token: &str,
    ) -> Result<Session, IdentityError> {
        self.record("set_session");
        let result = self.lock().set_session_result.clone();
        match result {
            Some(session) => {
                self.lock().current_session = Some(session.clone());
                Ok(session)
            }
            None => Err(IdentityError::Provider {
                status: 401,
                message: "session_expired".to_string(),
            }),
        }
    }

    async fn reset_password_for_email(
        &self,
        _email: &str,
        _redirect_to: &str,
    ) -> Result<(), IdentityError> {
        self.record("reset_password_for_email");
        Ok(())
    }

    async fn update_user(&self, attributes: UserAttributes) -> Result<IdentityUser, IdentityError> {
        self.record("update_user");
        let session = {
            let mut state = self.lock();
            let session = state
                .current_session
                .as_mut()
                .ok_or(IdentityError::NoSession)?;
            if let Some(data) = attributes.data {
                session.user.user_metadata = data;
            }
            session.clone()
        };
        self.emit(AuthEventKind::UserUpdated, Some(session.clone()));
        Ok(session.user)
    }

    async fn verify_otp(&self, _token_hash: &str, _kind: OtpKind) -> Result<Session, IdentityError> {
        self.record("verify_otp");
        self.lock()
            .current_session
            .clone()
            .ok_or(IdentityError::NoSession)
    }

    async fn resend_confirmation(&self, _email: &str) -> Result<(), IdentityError> {
        self.record("resend_confirmation");
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError> {
        self.record("delete_user");
        self.lock().deleted_users.push(id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}
