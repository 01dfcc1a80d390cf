//! Session lifecycle tracker
//!
//! The single owner of "who is signed in right now". Funnels every
//! status change through the state machine, mirrors the current session
//! into the shared token cell and the durable record, listens to
//! provider-pushed auth changes, and validates the session on a fixed
//! interval while one is active. When validity cannot be re-established
//! the tracker tears the local session down and redirects to the login
//! page exactly once.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use unilearn_common::Role;
use unilearn_identity::{
    AuthChange, AuthEventKind, IdentityService, IdentityUser, OAuthProvider, OtpKind, Session,
    UserAttributes, UserMetadata,
};
use unilearn_store::{ActivityLog, AuthToken};

use crate::backend::{AuthProfile, ProfileBackend, SignUpData};
use crate::error::ActionError;
use crate::navigator::Navigator;
use crate::permissions::role_can_access;
use crate::session_store::{SessionStore, StoredSession};
use crate::state::{SessionEvent, SessionState, SessionStateMachine};

/// Tuning knobs and navigation targets.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// How often an active session is re-validated
    pub check_interval: Duration,
    pub login_path: String,
    pub teacher_home: String,
    pub student_home: String,
    pub oauth_callback_path: String,
    pub reset_password_path: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5 * 60),
            login_path: "/login.html".to_string(),
            teacher_home: "/teacher-dashboard.html".to_string(),
            student_home: "/student-lessons.html".to_string(),
            oauth_callback_path: "/oauth-callback.html".to_string(),
            reset_password_path: "/reset-password.html".to_string(),
        }
    }
}

/// What the caller gets back from registration.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: IdentityUser,
    /// The account exists but cannot sign in until the email is confirmed
    pub confirmation_pending: bool,
    pub message_key: &'static str,
}

#[derive(Default)]
struct TrackerInner {
    state: SessionState,
    session: Option<Session>,
    profile: Option<AuthProfile>,
}

/// See the module docs. Construct once with [`SessionTracker::new`],
/// call [`initialize`](Self::initialize) on startup.
pub struct SessionTracker {
    identity: Arc<dyn IdentityService>,
    profiles: ProfileBackend,
    activity: ActivityLog,
    session_store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    auth_token: AuthToken,
    settings: TrackerSettings,
    // Held only for synchronous reads and writes, never across an await
    inner: Mutex<TrackerInner>,
    check_task: Mutex<Option<JoinHandle<()>>>,
    listener_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionTracker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        profiles: ProfileBackend,
        activity: ActivityLog,
        session_store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        auth_token: AuthToken,
        settings: TrackerSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            identity,
            profiles,
            activity,
            session_store,
            navigator,
            auth_token,
            settings,
            inner: Mutex::new(TrackerInner::default()),
            check_task: Mutex::new(None),
            listener_task: Mutex::new(None),
        })
    }

    /// Establish the session on startup.
    ///
    /// Subscribes to provider auth changes, then adopts the provider's
    /// live session if it has one, falling back to the durable record.
    /// Returns whether a session is active afterwards.
    pub async fn initialize(self: &Arc<Self>) -> bool {
        self.start_change_listener();

        let live = match self.identity.current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "could not query provider session on startup");
                None
            }
        };

        match live {
            Some(session) if !session.is_expired() => {
                self.adopt_session(session).await;
                true
            }
            _ => self.restore_session().await,
        }
    }

    /// Re-establish a session from the durable record.
    ///
    /// A record with future expiry is handed back to the provider as-is;
    /// an expired record is worth one refresh attempt. Every failure
    /// path discards the record and leaves the tracker anonymous.
    async fn restore_session(self: &Arc<Self>) -> bool {
        let stored = match self.session_store.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session record");
                if let Err(e) = self.session_store.clear() {
                    tracing::warn!(error = %e, "failed to clear session record");
                }
                return false;
            }
        };

        let restored = if !stored.is_expired() {
            self.identity
                .set_session(&stored.access_token, &stored.refresh_token)
                .await
        } else {
            self.identity.refresh_session(&stored.refresh_token).await
        };

        match restored {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "session restored from durable record");
                self.adopt_session(session).await;
                true
            }
            Err(e) => {
                tracing::info!(error = %e, "persisted session could not be restored");
                if let Err(e) = self.session_store.clear() {
                    tracing::warn!(error = %e, "failed to clear session record");
                }
                false
            }
        }
    }

    /// Verify credentials, adopt the session and route to the
    /// role-appropriate home page.
    pub async fn sign_in_with_password(
        self: &Arc<Self>,
        email: &str,
        password: &str,
    ) -> Result<(), ActionError> {
        self.advance(SessionEvent::StartSignIn);

        match self.identity.sign_in_with_password(email, password).await {
            Ok(session) => {
                let user_id = session.user.id;
                let profile = self.adopt_session(session).await;
                self.activity
                    .record(
                        user_id,
                        "login",
                        None,
                        None,
                        serde_json::json!({ "method": "password" }),
                    )
                    .await;
                self.navigator.navigate(self.home_path(profile.as_ref()));
                Ok(())
            }
            Err(e) => {
                self.advance(SessionEvent::SignInFailed);
                Err(e.into())
            }
        }
    }

    /// URL the host should navigate to for the OAuth flow. The session
    /// arrives later as a provider-pushed signed-in event.
    pub fn sign_in_with_oauth(&self, provider: OAuthProvider) -> String {
        self.identity
            .oauth_authorize_url(provider, &self.settings.oauth_callback_path)
    }

    /// Create the identity and its profile row.
    ///
    /// If the profile insert fails the orphaned identity is deleted so
    /// the email can register again.
    pub async fn sign_up(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        data: SignUpData,
    ) -> Result<SignUpOutcome, ActionError> {
        let metadata = UserMetadata {
            full_name: Some(data.full_name.clone()),
            role: Some(data.role),
        };
        let result = self.identity.sign_up(email, password, metadata).await?;

        if let Err(e) = self.profiles.create_profile(&result.user, &data).await {
            tracing::warn!(error = %e, user_id = %result.user.id, "rolling back identity after failed profile insert");
            if let Err(del) = self.identity.delete_user(result.user.id).await {
                tracing::warn!(error = %del, user_id = %result.user.id, "sign-up rollback failed, identity is orphaned");
            }
            return Err(e.into());
        }

        self.activity
            .record(
                result.user.id,
                "signup",
                None,
                None,
                serde_json::json!({ "role": data.role.as_str() }),
            )
            .await;

        let confirmation_pending = result.session.is_none();
        if let Some(session) = result.session {
            self.adopt_session(session).await;
        }

        Ok(SignUpOutcome {
            user: result.user,
            confirmation_pending,
            message_key: if confirmation_pending {
                "auth.confirmationSent"
            } else {
                "auth.accountCreated"
            },
        })
    }

    /// Sign out, tearing local state down before the provider call so a
    /// network failure cannot leave credentials behind.
    pub async fn sign_out(&self) {
        if let Some(user) = self.current_user() {
            self.activity
                .record(user.id, "logout", None, None, serde_json::json!({}))
                .await;
        }

        self.advance(SessionEvent::SignOut);
        self.clear_local_state();

        if let Err(e) = self.identity.sign_out().await {
            tracing::warn!(error = %e, "provider sign-out failed, local session already cleared");
        }

        self.navigator.navigate(&self.settings.login_path);
    }

    /// Canonical validity check: ask the provider, refresh once if the
    /// answer is stale, expire if that fails too.
    pub async fn check_session(self: &Arc<Self>) -> Option<IdentityUser> {
        let live = match self.identity.current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "session check could not reach the provider");
                // Indistinguishable from a dead session only after the
                // refresh below also fails
                None
            }
        };

        if let Some(session) = live {
            if !session.is_expired() {
                self.store_session(&session);
                return Some(session.user);
            }
        }

        let refresh_token = self.inner().session.as_ref().map(|s| s.refresh_token.clone());
        let Some(refresh_token) = refresh_token else {
            self.expire();
            return None;
        };

        self.advance(SessionEvent::StartRefresh);
        match self.identity.refresh_session(&refresh_token).await {
            Ok(renewed) => {
                self.advance(SessionEvent::RefreshSucceeded);
                self.store_session(&renewed);
                Some(renewed.user)
            }
            Err(e) => {
                tracing::info!(error = %e, "session refresh failed");
                self.expire();
                None
            }
        }
    }

    /// Sign-out path for a session that died underneath us. Runs the
    /// teardown and login redirect at most once per expiry.
    fn expire(&self) {
        // Only the transition into Expired proceeds; concurrent or
        // repeated callers find another state and stop here
        if !self.advance(SessionEvent::Expire) {
            return;
        }
        tracing::info!("session expired, signing out locally");
        self.clear_local_state();
        self.advance(SessionEvent::Cleanup);
        self.navigator.navigate(&self.settings.login_path);
    }

    /// React to a provider-pushed auth change.
    async fn apply_auth_change(self: &Arc<Self>, change: AuthChange) {
        tracing::debug!(event = %change.event, "auth change received");
        match change.event {
            AuthEventKind::SignedIn => {
                // Also fires for the session we just adopted ourselves;
                // adopting again is harmless
                if let Some(session) = change.session {
                    self.adopt_session(session).await;
                }
            }
            AuthEventKind::SignedOut => {
                if self.state().is_active() {
                    self.advance(SessionEvent::SignOut);
                    self.clear_local_state();
                    self.navigator.navigate(&self.settings.login_path);
                }
            }
            AuthEventKind::UserUpdated => {
                if let Some(session) = change.session {
                    let user_id = session.user.id;
                    self.store_session(&session);
                    match self.profiles.find_profile(user_id).await {
                        Ok(profile) => self.inner().profile = profile,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to reload profile after user update")
                        }
                    }
                }
            }
            AuthEventKind::TokenRefreshed => {
                if let Some(session) = change.session {
                    self.store_session(&session);
                }
            }
        }
    }

    /// Take a verified session as the current one: state, token cell,
    /// durable record, profile, periodic check.
    async fn adopt_session(self: &Arc<Self>, session: Session) -> Option<AuthProfile> {
        self.advance(SessionEvent::SignedIn);
        self.store_session(&session);

        let profile = self.profiles.ensure_profile(&session.user).await;
        self.inner().profile = profile.clone();

        self.start_session_check();
        profile
    }

    /// Mirror a session into the in-memory copy, the token cell and the
    /// durable record.
    fn store_session(&self, session: &Session) {
        self.auth_token.set(&session.access_token);
        if let Err(e) = self.session_store.save(&StoredSession::from(session)) {
            tracing::warn!(error = %e, "failed to persist session record");
        }
        self.inner().session = Some(session.clone());
    }

    fn clear_local_state(&self) {
        self.auth_token.clear();
        if let Err(e) = self.session_store.clear() {
            tracing::warn!(error = %e, "failed to clear session record");
        }
        {
            let mut inner = self.inner();
            inner.session = None;
            inner.profile = None;
        }
        self.stop_session_check();
    }

    /// Spawn the periodic validity check if it is not already running.
    fn start_session_check(self: &Arc<Self>) {
        let mut guard = self
            .check_task
            .lock()
            .expect("check task lock poisoned — prior access panicked");
        if guard.is_some() {
            return;
        }

        let weak = Arc::downgrade(self);
        let period = self.settings.check_interval;
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The immediate first tick; adoption already validated
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(tracker) = weak.upgrade() else { break };
                // A sign-out can race the tick
                if !tracker.state().is_active() {
                    continue;
                }
                tracker.check_session().await;
            }
        }));
    }

    fn stop_session_check(&self) {
        let handle = self
            .check_task
            .lock()
            .expect("check task lock poisoned — prior access panicked")
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn start_change_listener(self: &Arc<Self>) {
        let mut guard = self
            .listener_task
            .lock()
            .expect("listener task lock poisoned — prior access panicked");
        if guard.is_some() {
            return;
        }

        let weak = Arc::downgrade(self);
        let mut rx = self.identity.subscribe();
        *guard = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        let Some(tracker) = weak.upgrade() else { break };
                        tracker.apply_auth_change(change).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth change stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Move the state machine; invalid transitions are dropped with a
    /// debug log and leave the state unchanged.
    fn advance(&self, event: SessionEvent) -> bool {
        let mut inner = self.inner();
        match SessionStateMachine::transition(inner.state, event) {
            Ok(next) => {
                tracing::debug!(from = %inner.state, to = %next, %event, "session state change");
                inner.state = next;
                true
            }
            Err(e) => {
                tracing::debug!(%event, error = %e, "ignoring session event");
                false
            }
        }
    }

    fn inner(&self) -> MutexGuard<'_, TrackerInner> {
        self.inner
            .lock()
            .expect("tracker state lock poisoned — prior access panicked")
    }

    fn home_path(&self, profile: Option<&AuthProfile>) -> &str {
        match profile.map(|p| p.role) {
            Some(Role::Teacher) | Some(Role::Admin) => &self.settings.teacher_home,
            _ => &self.settings.student_home,
        }
    }

    // Queries

    pub fn state(&self) -> SessionState {
        self.inner().state
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn current_user(&self) -> Option<IdentityUser> {
        self.inner().session.as_ref().map(|s| s.user.clone())
    }

    pub fn profile(&self) -> Option<AuthProfile> {
        self.inner().profile.clone()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.inner().profile.as_ref().map(|p| p.role) == Some(role)
    }

    pub fn can_access(&self, resource: &str) -> bool {
        self.inner()
            .profile
            .as_ref()
            .map(|p| role_can_access(p.role, resource))
            .unwrap_or(false)
    }

    // Account operations

    /// Send the password-recovery email.
    pub async fn reset_password(&self, email: &str) -> Result<(), ActionError> {
        self.identity
            .reset_password_for_email(email, &self.settings.reset_password_path)
            .await?;
        Ok(())
    }

    /// Change the signed-in user's password.
    pub async fn update_password(&self, new_password: &str) -> Result<(), ActionError> {
        let user = self.current_user().ok_or(ActionError::NotSignedIn)?;
        self.identity
            .update_user(UserAttributes {
                password: Some(new_password.to_string()),
                data: None,
            })
            .await?;
        self.activity
            .record(user.id, "password_change", None, None, serde_json::json!({}))
            .await;
        Ok(())
    }

    /// Patch profile columns and reload the cached profile.
    pub async fn update_profile(&self, updates: &serde_json::Value) -> Result<(), ActionError> {
        let user = self.current_user().ok_or(ActionError::NotSignedIn)?;
        self.profiles.update_profile(user.id, updates).await?;
        match self.profiles.find_profile(user.id).await {
            Ok(profile) => self.inner().profile = profile,
            Err(e) => tracing::warn!(error = %e, "failed to reload profile after update"),
        }
        self.activity
            .record(user.id, "profile_update", None, None, serde_json::json!({}))
            .await;
        Ok(())
    }

    /// Confirm the signup one-time code, adopt the resulting session and
    /// mark the profile verified.
    pub async fn verify_email(self: &Arc<Self>, token_hash: &str) -> Result<(), ActionError> {
        let session = self.identity.verify_otp(token_hash, OtpKind::Signup).await?;
        let user_id = session.user.id;
        self.adopt_session(session).await;
        self.profiles.mark_email_verified(user_id).await;
        // Adoption cached the profile before the row was flipped
        if let Some(profile) = self.inner().profile.as_mut() {
            profile.email_verified = true;
        }
        Ok(())
    }

    pub async fn resend_confirmation(&self, email: &str) -> Result<(), ActionError> {
        self.identity.resend_confirmation(email).await?;
        Ok(())
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        for slot in [&self.check_task, &self.listener_task] {
            if let Some(handle) = slot.lock().ok().and_then(|mut guard| guard.take()) {
                handle.abort();
            }
        }
    }
}
