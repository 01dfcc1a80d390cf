//! Lesson domain scenarios against the stub backend

use unilearn_common::Config;
use unilearn_integration_tests::StubBackend;
use unilearn_lessons::{
    CommentRepository, EnrollmentRepository, LessonError, LessonFilters, LessonRepository,
    NewComment, NewLesson,
};
use unilearn_notifications::NotificationRepository;
use unilearn_store::{ActivityLog, AuthToken, TableClient};
use uuid::Uuid;

fn tables_for(stub: &StubBackend) -> TableClient {
    let config = Config {
        backend_url: stub.base_url(),
        anon_key: "anon".to_string(),
        service_role_key: None,
        materials_bucket: "materials".to_string(),
        session_file: "unused".to_string(),
        language_file: "unused".to_string(),
        log_level: "debug".to_string(),
    };
    TableClient::new(&config, AuthToken::new())
}

fn new_lesson(teacher_id: Uuid, title: &str) -> NewLesson {
    NewLesson {
        teacher_id,
        title: title.to_string(),
        description: Some("Basics".to_string()),
        subject: "Mathematics".to_string(),
        year_level: 1,
        duration_minutes: Some(60),
    }
}

#[test_log::test(tokio::test)]
async fn test_enroll_notifies_teacher_and_rejects_duplicates() {
    let stub = StubBackend::spawn().await;
    let tables = tables_for(&stub);
    let lessons = LessonRepository::new(tables.clone(), ActivityLog::new(tables.clone()));
    let enrollments = EnrollmentRepository::new(
        tables.clone(),
        ActivityLog::new(tables.clone()),
        NotificationRepository::new(tables.clone()),
    );

    let teacher_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let lesson = lessons
        .create(&new_lesson(teacher_id, "Linear Algebra"))
        .await
        .unwrap();

    let enrollment = enrollments.enroll(lesson.id, student_id).await.unwrap();
    assert_eq!(enrollment.progress, 0);

    // The teacher got an in-app notification pointing at the lesson
    let notifications = stub.rows("notifications");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["user_id"], teacher_id.to_string());
    assert_eq!(notifications[0]["type"], "enrollment");

    // Enrolling twice is reported, not silently duplicated
    let err = enrollments.enroll(lesson.id, student_id).await.unwrap_err();
    assert!(matches!(err, LessonError::AlreadyEnrolled));
    assert_eq!(stub.rows("enrollments").len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_progress_100_stamps_completion() {
    let stub = StubBackend::spawn().await;
    let tables = tables_for(&stub);
    let lessons = LessonRepository::new(tables.clone(), ActivityLog::new(tables.clone()));
    let enrollments = EnrollmentRepository::new(
        tables.clone(),
        ActivityLog::new(tables.clone()),
        NotificationRepository::new(tables.clone()),
    );

    let lesson = lessons
        .create(&new_lesson(Uuid::new_v4(), "Calculus"))
        .await
        .unwrap();
    let student_id = Uuid::new_v4();
    enrollments.enroll(lesson.id, student_id).await.unwrap();

    enrollments
        .update_progress(lesson.id, student_id, 250)
        .await
        .unwrap();

    let rows = stub.rows("enrollments");
    assert_eq!(rows[0]["progress"], 100);
    assert!(!rows[0]["completed_at"].is_null());

    let mine = enrollments.for_student(student_id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(mine[0].completed_at.is_some());
}

#[test_log::test(tokio::test)]
async fn test_publication_filtering() {
    let stub = StubBackend::spawn().await;
    let tables = tables_for(&stub);
    let lessons = LessonRepository::new(tables.clone(), ActivityLog::new(tables.clone()));

    let teacher_id = Uuid::new_v4();
    let draft = lessons
        .create(&new_lesson(teacher_id, "Draft lesson"))
        .await
        .unwrap();
    let published = lessons
        .create(&new_lesson(teacher_id, "Published lesson"))
        .await
        .unwrap();
    lessons.set_published(published.id, true).await.unwrap();

    let visible = lessons
        .list(&LessonFilters {
            published: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, published.id);

    let all = lessons
        .list(&LessonFilters {
            teacher_id: Some(teacher_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|l| l.id == draft.id));
}

#[test_log::test(tokio::test)]
async fn test_comment_editing_and_threading() {
    let stub = StubBackend::spawn().await;
    let tables = tables_for(&stub);
    let comments = CommentRepository::new(tables.clone(), ActivityLog::new(tables.clone()));

    let lesson_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let top = comments
        .add(&NewComment {
            lesson_id,
            user_id,
            content: "Great lesson".to_string(),
            parent_comment_id: None,
        })
        .await
        .unwrap();
    comments
        .add(&NewComment {
            lesson_id,
            user_id,
            content: "Agreed".to_string(),
            parent_comment_id: Some(top.id),
        })
        .await
        .unwrap();

    // Top-level listing excludes replies
    let top_level = comments.for_lesson(lesson_id).await.unwrap();
    assert_eq!(top_level.len(), 1);
    assert!(!top_level[0].is_edited);

    let replies = comments.replies(top.id).await.unwrap();
    assert_eq!(replies.len(), 1);

    let edited = comments.update(top.id, "Great lesson indeed").await.unwrap();
    assert!(edited.is_edited);
    assert_eq!(edited.content, "Great lesson indeed");

    comments.delete(top.id, user_id).await.unwrap();
    assert!(comments.for_lesson(lesson_id).await.unwrap().is_empty());
}
