//! Comment repository

use chrono::Utc;
use unilearn_store::{ActivityLog, StoreError, TableClient};
use uuid::Uuid;
use validator::Validate;

use crate::entity::{Comment, NewComment};
use crate::error::LessonError;

#[derive(Clone)]
pub struct CommentRepository {
    tables: TableClient,
    activity: ActivityLog,
}

impl CommentRepository {
    pub fn new(tables: TableClient, activity: ActivityLog) -> Self {
        Self { tables, activity }
    }

    pub async fn add(&self, new: &NewComment) -> Result<Comment, LessonError> {
        new.validate()?;
        let row = serde_json::json!({
            "lesson_id": new.lesson_id,
            "user_id": new.user_id,
            "content": new.content,
            "parent_comment_id": new.parent_comment_id,
            "is_edited": false,
            "created_at": Utc::now(),
        });
        let comment: Comment = self.tables.from("comments").insert(&row).await?;

        self.activity
            .record(
                new.user_id,
                "comment_add",
                Some("comment"),
                Some(comment.id),
                serde_json::json!({ "lesson_id": new.lesson_id }),
            )
            .await;
        Ok(comment)
    }

    /// Top-level comments on a lesson, oldest first. Replies are fetched
    /// separately by parent.
    pub async fn for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        self.tables
            .from("comments")
            .select("*")
            .eq("lesson_id", lesson_id)
            .is_null("parent_comment_id")
            .order("created_at", true)
            .fetch()
            .await
    }

    pub async fn replies(&self, parent_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        self.tables
            .from("comments")
            .select("*")
            .eq("parent_comment_id", parent_id)
            .order("created_at", true)
            .fetch()
            .await
    }

    /// Replace the content, flagging the comment as edited.
    pub async fn update(&self, id: Uuid, content: &str) -> Result<Comment, StoreError> {
        self.tables
            .from("comments")
            .eq("id", id)
            .update(&serde_json::json!({
                "content": content,
                "is_edited": true,
            }))
            .await
    }

    pub async fn delete(&self, id: Uuid, remover_id: Uuid) -> Result<(), StoreError> {
        self.tables.from("comments").eq("id", id).delete().await?;
        self.activity
            .record(
                remover_id,
                "comment_delete",
                Some("comment"),
                Some(id),
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }
}
