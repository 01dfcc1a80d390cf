//! Profile repository

use chrono::Utc;
use thiserror::Error;
use unilearn_store::{StoreError, TableClient};
use uuid::Uuid;
use validator::Validate;

use crate::entity::{LoginProfile, ProfileUpdate, UserProfile};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid profile input: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ProfileRepository {
    tables: TableClient,
}

impl ProfileRepository {
    pub fn new(tables: TableClient) -> Self {
        Self { tables }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        self.tables
            .from("users")
            .select("*")
            .eq("id", id)
            .fetch_optional()
            .await
    }

    /// Active teachers, for the public teacher directory.
    pub async fn list_teachers(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.tables
            .from("users")
            .select("*")
            .eq("role", "teacher")
            .eq("is_active", true)
            .order("full_name", true)
            .fetch()
            .await
    }

    /// Apply a validated partial update and return the stored row.
    pub async fn update(&self, id: Uuid, update: &ProfileUpdate) -> Result<UserProfile, ProfileError> {
        update.validate()?;
        let profile = self
            .tables
            .from("users")
            .eq("id", id)
            .update(update)
            .await?;
        Ok(profile)
    }

    pub async fn update_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        self.tables
            .from("users")
            .eq("id", id)
            .update_void(&serde_json::json!({ "last_login": Utc::now() }))
            .await
    }

    /// Materialize or refresh the profile row after a completed login.
    /// The upsert keys on the id, so repeated logins touch the same row.
    pub async fn create_or_update(&self, login: &LoginProfile) -> Result<UserProfile, ProfileError> {
        login.validate()?;
        let row = serde_json::json!({
            "id": login.id,
            "email": login.email,
            "full_name": login.full_name,
            "role": login.role,
            "is_active": true,
            "email_verified": login.email_verified,
            "last_login": Utc::now(),
        });
        let profile = self.tables.from("users").upsert(&row).await?;
        Ok(profile)
    }
}
