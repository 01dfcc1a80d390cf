//! Notification repository

use chrono::Utc;
use unilearn_store::{StoreError, TableClient};
use uuid::Uuid;

use crate::entity::{NewNotification, Notification};

#[derive(Clone)]
pub struct NotificationRepository {
    tables: TableClient,
}

impl NotificationRepository {
    pub fn new(tables: TableClient) -> Self {
        Self { tables }
    }

    pub async fn create(&self, new: &NewNotification) -> Result<Notification, StoreError> {
        let row = serde_json::json!({
            "user_id": new.user_id,
            "title": new.title,
            "message": new.message,
            "type": new.kind,
            "related_id": new.related_id,
            "is_read": false,
            "created_at": Utc::now(),
        });
        self.tables.from("notifications").insert(&row).await
    }

    /// Newest first; `unread_only` narrows to unseen ones.
    pub async fn for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut query = self
            .tables
            .from("notifications")
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", false);
        if unread_only {
            query = query.eq("is_read", false);
        }
        query.fetch().await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<(), StoreError> {
        self.tables
            .from("notifications")
            .eq("id", id)
            .update_void(&serde_json::json!({ "is_read": true }))
            .await
    }

    /// Mark every unread notification for the user as read. Filtering on
    /// `is_read = false` makes a repeat call match zero rows and succeed,
    /// so the operation is idempotent.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.tables
            .from("notifications")
            .eq("user_id", user_id)
            .eq("is_read", false)
            .update_void(&serde_json::json!({ "is_read": true }))
            .await
    }
}
