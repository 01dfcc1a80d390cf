//! End-to-end session lifecycle against the stub backend

use std::sync::Arc;

use unilearn_auth::{
    FileSessionStore, ProfileBackend, RecordingNavigator, SessionState, SessionTracker,
    SignUpData, StoredSession, TrackerSettings,
};
use unilearn_common::{Config, Role};
use unilearn_identity::{GotrueClient, IdentityConfig, IdentityService};
use unilearn_integration_tests::StubBackend;
use unilearn_store::{ActivityLog, AuthToken, TableClient};
use uuid::Uuid;

fn config_for(stub: &StubBackend, dir: &tempfile::TempDir) -> Config {
    Config {
        backend_url: stub.base_url(),
        anon_key: "anon".to_string(),
        service_role_key: Some("service".to_string()),
        materials_bucket: "materials".to_string(),
        session_file: dir
            .path()
            .join("session.json")
            .to_string_lossy()
            .into_owned(),
        language_file: dir.path().join("language").to_string_lossy().into_owned(),
        log_level: "debug".to_string(),
    }
}

fn build_tracker(config: &Config) -> (Arc<SessionTracker>, RecordingNavigator, AuthToken) {
    let token = AuthToken::new();
    let tables = TableClient::new(config, token.clone());
    let identity: Arc<dyn IdentityService> =
        Arc::new(GotrueClient::new(IdentityConfig::from_config(config)));
    let navigator = RecordingNavigator::new();
    let tracker = SessionTracker::new(
        identity,
        ProfileBackend::new(tables.clone()),
        ActivityLog::new(tables),
        Arc::new(FileSessionStore::new(&config.session_file)),
        Arc::new(navigator.clone()),
        token.clone(),
        TrackerSettings::default(),
    );
    (tracker, navigator, token)
}

#[test_log::test(tokio::test)]
async fn test_password_login_provisions_profile_and_logs_activity() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&stub, &dir);
    stub.add_account("jana@uni.edu", "secret1");

    let (tracker, navigator, token) = build_tracker(&config);
    assert!(!tracker.initialize().await);

    tracker
        .sign_in_with_password("jana@uni.edu", "secret1")
        .await
        .unwrap();

    assert_eq!(tracker.state(), SessionState::Authenticated);
    assert!(token.get().is_some());

    // First login provisioned a defaulted profile row
    let users = stub.rows("users");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "jana@uni.edu");
    assert_eq!(users[0]["full_name"], "jana");
    assert_eq!(users[0]["role"], "student");
    assert_eq!(users[0]["email_verified"], false);

    let profile = tracker.profile().expect("profile loaded");
    assert_eq!(profile.role, Role::Student);
    assert!(tracker.can_access("lessons"));
    assert!(!tracker.can_access("students"));

    // The login left an audit record and routed to the student home
    let activity = stub.rows("activity_log");
    assert!(activity.iter().any(|row| row["action"] == "login"));
    assert_eq!(navigator.paths(), vec!["/student-lessons.html"]);
}

#[test_log::test(tokio::test)]
async fn test_session_restores_across_restart() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&stub, &dir);
    stub.add_account("jana@uni.edu", "secret1");

    let user_id = {
        let (tracker, _, _) = build_tracker(&config);
        tracker.initialize().await;
        tracker
            .sign_in_with_password("jana@uni.edu", "secret1")
            .await
            .unwrap();
        tracker.current_user().unwrap().id
    };

    // A fresh process with the same session file picks the session up
    let (tracker, navigator, token) = build_tracker(&config);
    assert!(tracker.initialize().await);
    assert_eq!(tracker.state(), SessionState::Authenticated);
    assert_eq!(tracker.current_user().map(|u| u.id), Some(user_id));
    assert!(token.get().is_some());
    // Restoration never navigates
    assert!(navigator.paths().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_sign_out_clears_the_durable_record() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&stub, &dir);
    stub.add_account("jana@uni.edu", "secret1");

    let (tracker, navigator, token) = build_tracker(&config);
    tracker.initialize().await;
    tracker
        .sign_in_with_password("jana@uni.edu", "secret1")
        .await
        .unwrap();

    tracker.sign_out().await;

    assert_eq!(tracker.state(), SessionState::Anonymous);
    assert_eq!(token.get(), None);
    assert_eq!(
        navigator.paths(),
        vec!["/student-lessons.html", "/login.html"]
    );

    // A restart finds nothing to restore
    let (tracker, _, _) = build_tracker(&config);
    assert!(!tracker.initialize().await);
}

#[test_log::test(tokio::test)]
async fn test_dead_refresh_token_degrades_to_anonymous() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&stub, &dir);

    use unilearn_auth::SessionStore;
    let store = FileSessionStore::new(&config.session_file);
    store
        .save(&StoredSession {
            access_token: "stale".to_string(),
            refresh_token: "unknown-refresh".to_string(),
            expires_at: chrono::Utc::now().timestamp() - 600,
            user_id: Uuid::new_v4(),
        })
        .unwrap();

    let (tracker, navigator, _) = build_tracker(&config);
    assert!(!tracker.initialize().await);
    assert_eq!(tracker.state(), SessionState::Anonymous);
    assert_eq!(store.load().unwrap(), None);
    assert!(navigator.paths().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_sign_up_pending_confirmation_creates_profile() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&stub, &dir);

    let (tracker, _, _) = build_tracker(&config);
    tracker.initialize().await;

    let outcome = tracker
        .sign_up(
            "prof@uni.edu",
            "secret1",
            SignUpData {
                full_name: "Prof Amina".to_string(),
                role: Role::Teacher,
                phone: None,
                university: Some("University of Tunis".to_string()),
                department: Some("Mathematics".to_string()),
                year_of_study: None,
            },
        )
        .await
        .unwrap();

    assert!(outcome.confirmation_pending);
    assert_eq!(outcome.message_key, "auth.confirmationSent");
    // No session until the email is confirmed
    assert_eq!(tracker.state(), SessionState::Anonymous);

    let users = stub.rows("users");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["role"], "teacher");
    assert_eq!(users[0]["full_name"], "Prof Amina");
    assert_eq!(users[0]["email_verified"], false);
}

#[test_log::test(tokio::test)]
async fn test_sign_up_rolls_back_identity_when_profile_insert_fails() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&stub, &dir);
    stub.fail_inserts_into("users");

    let (tracker, _, _) = build_tracker(&config);
    tracker.initialize().await;

    let err = tracker
        .sign_up(
            "prof@uni.edu",
            "secret1",
            SignUpData {
                full_name: "Prof Amina".to_string(),
                role: Role::Teacher,
                phone: None,
                university: None,
                department: None,
                year_of_study: None,
            },
        )
        .await
        .unwrap_err();

    // The orphaned identity was deleted so the email can try again
    assert_eq!(stub.lock().deleted_identities.len(), 1);
    assert!(stub.rows("users").is_empty());
    assert!(matches!(err, unilearn_auth::ActionError::Store(_)));
}

#[test_log::test(tokio::test)]
async fn test_email_verification_flags_the_cached_profile() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&stub, &dir);

    let (tracker, _, _) = build_tracker(&config);
    tracker.initialize().await;
    tracker
        .sign_up(
            "jana@uni.edu",
            "secret1",
            SignUpData {
                full_name: "Jana".to_string(),
                role: Role::Student,
                phone: None,
                university: None,
                department: None,
                year_of_study: Some(2),
            },
        )
        .await
        .unwrap();

    tracker
        .verify_email(&stub.confirmation_token("jana@uni.edu"))
        .await
        .unwrap();

    assert_eq!(tracker.state(), SessionState::Authenticated);
    assert_eq!(stub.rows("users")[0]["email_verified"], true);
    // The copy cached at adoption reflects the verification too
    assert!(tracker.profile().expect("profile loaded").email_verified);
}
