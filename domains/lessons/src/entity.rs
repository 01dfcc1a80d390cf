//! Lesson domain entities and validated inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One row of the `lessons` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub subject: String,
    pub year_level: i32,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a lesson. Lessons start unpublished.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewLesson {
    pub teacher_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(range(min = 1, max = 8))]
    pub year_level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
}

/// Editable lesson fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct LessonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 8))]
    pub year_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
}

/// Narrowing and paging options for lesson listings.
#[derive(Debug, Clone, Default)]
pub struct LessonFilters {
    pub teacher_id: Option<Uuid>,
    pub subject: Option<String>,
    pub year_level: Option<i32>,
    pub published: Option<bool>,
    /// Case-insensitive substring match on title or description
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One row of the `enrollments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub student_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    /// 0 to 100
    pub progress: i32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One row of the `materials` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub file_path: String,
    pub file_url: String,
    pub file_size: i64,
    #[serde(default)]
    pub file_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Material {
    /// Human readable size for material listings ("2.5 MB").
    pub fn file_size_label(&self) -> String {
        unilearn_common::format_file_size(self.file_size.max(0) as u64)
    }
}

/// One row of the `comments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub parent_comment_id: Option<Uuid>,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for posting a comment.
#[derive(Debug, Clone, Validate)]
pub struct NewComment {
    pub lesson_id: Uuid,
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}
