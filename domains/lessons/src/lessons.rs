//! Lesson repository

use chrono::Utc;
use unilearn_store::{ActivityLog, StoreError, TableClient};
use uuid::Uuid;
use validator::Validate;

use crate::entity::{Lesson, LessonFilters, LessonUpdate, NewLesson};
use crate::error::LessonError;

#[derive(Clone)]
pub struct LessonRepository {
    tables: TableClient,
    activity: ActivityLog,
}

impl LessonRepository {
    pub fn new(tables: TableClient, activity: ActivityLog) -> Self {
        Self { tables, activity }
    }

    /// Create an unpublished lesson.
    pub async fn create(&self, new: &NewLesson) -> Result<Lesson, LessonError> {
        new.validate()?;
        let mut row = serde_json::to_value(new).map_err(|e| StoreError::Decode(e.to_string()))?;
        row["is_published"] = serde_json::json!(false);
        row["created_at"] = serde_json::json!(Utc::now());

        let lesson: Lesson = self.tables.from("lessons").insert(&row).await?;
        self.activity
            .record(
                lesson.teacher_id,
                "lesson_create",
                Some("lesson"),
                Some(lesson.id),
                serde_json::json!({ "title": lesson.title }),
            )
            .await;
        Ok(lesson)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Lesson>, StoreError> {
        self.tables
            .from("lessons")
            .select("*")
            .eq("id", id)
            .fetch_optional()
            .await
    }

    /// Filtered listing, newest first.
    pub async fn list(&self, filters: &LessonFilters) -> Result<Vec<Lesson>, StoreError> {
        let mut query = self.tables.from("lessons").select("*");

        if let Some(teacher_id) = filters.teacher_id {
            query = query.eq("teacher_id", teacher_id);
        }
        if let Some(subject) = &filters.subject {
            query = query.eq("subject", subject);
        }
        if let Some(year_level) = filters.year_level {
            query = query.eq("year_level", year_level);
        }
        if let Some(published) = filters.published {
            query = query.eq("is_published", published);
        }
        if let Some(term) = filters.search.as_deref() {
            let term = sanitize_search_term(term);
            if !term.is_empty() {
                query = query.or(&format!(
                    "(title.ilike.*{term}*,description.ilike.*{term}*)"
                ));
            }
        }

        query = query.order("created_at", false);
        if let Some(limit) = filters.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = filters.offset {
            query = query.offset(offset);
        }

        query.fetch().await
    }

    pub async fn update(&self, id: Uuid, update: &LessonUpdate) -> Result<Lesson, LessonError> {
        update.validate()?;
        let mut patch =
            serde_json::to_value(update).map_err(|e| StoreError::Decode(e.to_string()))?;
        patch["updated_at"] = serde_json::json!(Utc::now());

        let lesson: Lesson = self
            .tables
            .from("lessons")
            .eq("id", id)
            .update(&patch)
            .await?;
        self.activity
            .record(
                lesson.teacher_id,
                "lesson_update",
                Some("lesson"),
                Some(id),
                serde_json::json!({}),
            )
            .await;
        Ok(lesson)
    }

    pub async fn delete(&self, id: Uuid, teacher_id: Uuid) -> Result<(), StoreError> {
        self.tables.from("lessons").eq("id", id).delete().await?;
        self.activity
            .record(
                teacher_id,
                "lesson_delete",
                Some("lesson"),
                Some(id),
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }

    /// Flip publication and return the stored row.
    pub async fn set_published(&self, id: Uuid, published: bool) -> Result<Lesson, StoreError> {
        let lesson: Lesson = self
            .tables
            .from("lessons")
            .eq("id", id)
            .update(&serde_json::json!({
                "is_published": published,
                "updated_at": Utc::now(),
            }))
            .await?;
        self.activity
            .record(
                lesson.teacher_id,
                if published {
                    "lesson_publish"
                } else {
                    "lesson_unpublish"
                },
                Some("lesson"),
                Some(id),
                serde_json::json!({}),
            )
            .await;
        Ok(lesson)
    }
}

/// Strip the characters that delimit the REST API's or-filter syntax so
/// a search term cannot break out of its pattern.
fn sanitize_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, '(' | ')' | ',' | '*' | '.'))
        .collect::<String>()
        .trim()
        .to_string()
}
