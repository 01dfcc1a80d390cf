//! Material repository
//!
//! Materials pair a table row with an uploaded file in object storage.
//! Stored paths carry an upload timestamp so two files with the same
//! name never collide.

use chrono::Utc;
use unilearn_store::{ActivityLog, StorageClient, StoreError, TableClient};
use uuid::Uuid;

use crate::entity::Material;

/// File handed over for upload.
#[derive(Debug, Clone)]
pub struct MaterialUpload {
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct MaterialRepository {
    tables: TableClient,
    storage: StorageClient,
    activity: ActivityLog,
    bucket: String,
}

impl MaterialRepository {
    pub fn new(
        tables: TableClient,
        storage: StorageClient,
        activity: ActivityLog,
        bucket: String,
    ) -> Self {
        Self {
            tables,
            storage,
            activity,
            bucket,
        }
    }

    /// Upload the file, then insert the row pointing at it.
    pub async fn add(
        &self,
        lesson_id: Uuid,
        uploader_id: Uuid,
        upload: MaterialUpload,
    ) -> Result<Material, StoreError> {
        let path = format!(
            "{}/{}_{}",
            lesson_id,
            Utc::now().timestamp(),
            upload.file_name
        );
        let file_size = upload.bytes.len() as i64;
        let stored = self
            .storage
            .upload(&self.bucket, &path, upload.bytes, &upload.content_type)
            .await?;

        let row = serde_json::json!({
            "lesson_id": lesson_id,
            "title": upload.title,
            "file_path": stored.path,
            "file_url": stored.url,
            "file_size": file_size,
            "file_type": upload.content_type,
            "uploaded_at": Utc::now(),
        });
        let material: Material = match self.tables.from("materials").insert(&row).await {
            Ok(material) => material,
            Err(e) => {
                // Do not leave an unreferenced file behind
                if let Err(remove) = self.storage.remove(&self.bucket, &stored.path).await {
                    tracing::warn!(error = %remove, path = %stored.path, "failed to remove orphaned upload");
                }
                return Err(e);
            }
        };

        self.activity
            .record(
                uploader_id,
                "material_add",
                Some("material"),
                Some(material.id),
                serde_json::json!({ "lesson_id": lesson_id, "title": material.title }),
            )
            .await;
        Ok(material)
    }

    /// A lesson's materials, newest first.
    pub async fn for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Material>, StoreError> {
        self.tables
            .from("materials")
            .select("*")
            .eq("lesson_id", lesson_id)
            .order("uploaded_at", false)
            .fetch()
            .await
    }

    /// Delete the row, then the stored file (best-effort).
    pub async fn delete(&self, id: Uuid, remover_id: Uuid) -> Result<(), StoreError> {
        let material: Material = self
            .tables
            .from("materials")
            .select("*")
            .eq("id", id)
            .fetch_one()
            .await?;

        self.tables.from("materials").eq("id", id).delete().await?;

        if let Err(e) = self.storage.remove(&self.bucket, &material.file_path).await {
            tracing::warn!(error = %e, path = %material.file_path, "failed to remove stored file");
        }

        self.activity
            .record(
                remover_id,
                "material_delete",
                Some("material"),
                Some(id),
                serde_json::json!({ "lesson_id": material.lesson_id }),
            )
            .await;
        Ok(())
    }
}
