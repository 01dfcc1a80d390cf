//! Notification scenarios against the stub backend

use unilearn_common::Config;
use unilearn_integration_tests::StubBackend;
use unilearn_notifications::{NewNotification, NotificationKind, NotificationRepository};
use unilearn_store::{AuthToken, TableClient};
use uuid::Uuid;

fn repository_for(stub: &StubBackend) -> NotificationRepository {
    let config = Config {
        backend_url: stub.base_url(),
        anon_key: "anon".to_string(),
        service_role_key: None,
        materials_bucket: "materials".to_string(),
        session_file: "unused".to_string(),
        language_file: "unused".to_string(),
        log_level: "debug".to_string(),
    };
    NotificationRepository::new(TableClient::new(&config, AuthToken::new()))
}

fn announcement(user_id: Uuid, title: &str) -> NewNotification {
    NewNotification {
        user_id,
        title: title.to_string(),
        message: "details".to_string(),
        kind: NotificationKind::Announcement,
        related_id: None,
    }
}

#[test_log::test(tokio::test)]
async fn test_mark_all_read_is_idempotent() {
    let stub = StubBackend::spawn().await;
    let repo = repository_for(&stub);
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();

    for title in ["one", "two", "three"] {
        repo.create(&announcement(user_id, title)).await.unwrap();
    }
    repo.create(&announcement(other_user, "not yours"))
        .await
        .unwrap();

    assert_eq!(repo.for_user(user_id, true).await.unwrap().len(), 3);

    repo.mark_all_read(user_id).await.unwrap();
    assert!(repo.for_user(user_id, true).await.unwrap().is_empty());
    assert_eq!(repo.for_user(user_id, false).await.unwrap().len(), 3);

    // Matching zero rows, the repeat call still succeeds
    repo.mark_all_read(user_id).await.unwrap();
    assert!(repo.for_user(user_id, true).await.unwrap().is_empty());

    // Another user's notifications are untouched
    assert_eq!(repo.for_user(other_user, true).await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_mark_single_notification_read() {
    let stub = StubBackend::spawn().await;
    let repo = repository_for(&stub);
    let user_id = Uuid::new_v4();

    let first = repo.create(&announcement(user_id, "one")).await.unwrap();
    repo.create(&announcement(user_id, "two")).await.unwrap();

    repo.mark_read(first.id).await.unwrap();

    let unread = repo.for_user(user_id, true).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].title, "two");
}
