//! Append-only activity log
//!
//! Every user-initiated mutation appends an audit record. Writes are
//! best-effort: a failed append is logged and never fails the action
//! that triggered it.

use chrono::Utc;
use uuid::Uuid;

use crate::table::TableClient;

#[derive(Clone)]
pub struct ActivityLog {
    tables: TableClient,
}

impl ActivityLog {
    pub fn new(tables: TableClient) -> Self {
        Self { tables }
    }

    /// Append one audit record.
    pub async fn record(
        &self,
        user_id: Uuid,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<Uuid>,
        metadata: serde_json::Value,
    ) {
        let row = serde_json::json!({
            "user_id": user_id,
            "action": action,
            "entity_type": entity_type,
            "entity_id": entity_id,
            "metadata": metadata,
            "created_at": Utc::now(),
        });

        if let Err(e) = self.tables.from("activity_log").insert_void(&row).await {
            tracing::warn!(error = %e, action, "failed to append activity record");
        }
    }
}
