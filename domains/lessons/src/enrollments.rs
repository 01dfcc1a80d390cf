//! Enrollment repository

use chrono::Utc;
use unilearn_notifications::{NewNotification, NotificationKind, NotificationRepository};
use unilearn_store::{ActivityLog, StoreError, TableClient};
use uuid::Uuid;

use crate::entity::{Enrollment, Lesson};
use crate::error::LessonError;

#[derive(Clone)]
pub struct EnrollmentRepository {
    tables: TableClient,
    activity: ActivityLog,
    notifications: NotificationRepository,
}

impl EnrollmentRepository {
    pub fn new(
        tables: TableClient,
        activity: ActivityLog,
        notifications: NotificationRepository,
    ) -> Self {
        Self {
            tables,
            activity,
            notifications,
        }
    }

    /// Enroll a student. A duplicate enrollment is reported as such, and
    /// the lesson's teacher is notified on success (best-effort).
    pub async fn enroll(
        &self,
        lesson_id: Uuid,
        student_id: Uuid,
    ) -> Result<Enrollment, LessonError> {
        let lesson: Lesson = self
            .tables
            .from("lessons")
            .select("*")
            .eq("id", lesson_id)
            .fetch_one()
            .await?;

        let row = serde_json::json!({
            "lesson_id": lesson_id,
            "student_id": student_id,
            "enrolled_at": Utc::now(),
            "progress": 0,
        });
        let enrollment: Enrollment = match self.tables.from("enrollments").insert(&row).await {
            Ok(enrollment) => enrollment,
            Err(StoreError::Conflict(_)) => return Err(LessonError::AlreadyEnrolled),
            Err(e) => return Err(e.into()),
        };

        self.activity
            .record(
                student_id,
                "enroll",
                Some("lesson"),
                Some(lesson_id),
                serde_json::json!({}),
            )
            .await;

        let notification = NewNotification {
            user_id: lesson.teacher_id,
            title: "lessons.enroll".to_string(),
            message: lesson.title.clone(),
            kind: NotificationKind::Enrollment,
            related_id: Some(lesson_id),
        };
        if let Err(e) = self.notifications.create(&notification).await {
            tracing::warn!(error = %e, %lesson_id, "failed to notify teacher of enrollment");
        }

        Ok(enrollment)
    }

    pub async fn unenroll(&self, lesson_id: Uuid, student_id: Uuid) -> Result<(), StoreError> {
        self.tables
            .from("enrollments")
            .eq("lesson_id", lesson_id)
            .eq("student_id", student_id)
            .delete()
            .await?;
        self.activity
            .record(
                student_id,
                "unenroll",
                Some("lesson"),
                Some(lesson_id),
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }

    /// A student's enrollments, most recent first.
    pub async fn for_student(&self, student_id: Uuid) -> Result<Vec<Enrollment>, StoreError> {
        self.tables
            .from("enrollments")
            .select("*")
            .eq("student_id", student_id)
            .order("enrolled_at", false)
            .fetch()
            .await
    }

    /// A lesson's roster, oldest enrollment first.
    pub async fn for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Enrollment>, StoreError> {
        self.tables
            .from("enrollments")
            .select("*")
            .eq("lesson_id", lesson_id)
            .order("enrolled_at", true)
            .fetch()
            .await
    }

    /// Set progress, clamped to 0..=100; reaching 100 stamps completion.
    pub async fn update_progress(
        &self,
        lesson_id: Uuid,
        student_id: Uuid,
        progress: i32,
    ) -> Result<(), StoreError> {
        let progress = progress.clamp(0, 100);
        let patch = if progress == 100 {
            serde_json::json!({ "progress": progress, "completed_at": Utc::now() })
        } else {
            serde_json::json!({ "progress": progress })
        };

        self.tables
            .from("enrollments")
            .eq("lesson_id", lesson_id)
            .eq("student_id", student_id)
            .update_void(&patch)
            .await?;

        self.activity
            .record(
                student_id,
                "progress_update",
                Some("lesson"),
                Some(lesson_id),
                serde_json::json!({ "progress": progress }),
            )
            .await;
        Ok(())
    }
}
