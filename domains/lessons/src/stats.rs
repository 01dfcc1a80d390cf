//! Aggregated statistics via stored procedures
//!
//! The counts are computed server-side; the client calls the RPC
//! endpoints and decodes the result rows.

use serde::Deserialize;
use unilearn_store::{StoreError, TableClient};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherStats {
    pub total_lessons: i64,
    pub published_lessons: i64,
    pub total_students: i64,
    pub total_materials: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentStats {
    pub enrolled_lessons: i64,
    pub completed_lessons: i64,
    pub average_progress: f64,
}

#[derive(Clone)]
pub struct StatsRepository {
    tables: TableClient,
}

impl StatsRepository {
    pub fn new(tables: TableClient) -> Self {
        Self { tables }
    }

    pub async fn teacher_stats(&self, teacher_id: Uuid) -> Result<TeacherStats, StoreError> {
        self.tables
            .rpc(
                "get_teacher_stats",
                &serde_json::json!({ "p_teacher_id": teacher_id }),
            )
            .await
    }

    pub async fn student_stats(&self, student_id: Uuid) -> Result<StudentStats, StoreError> {
        self.tables
            .rpc(
                "get_student_stats",
                &serde_json::json!({ "p_student_id": student_id }),
            )
            .await
    }
}
