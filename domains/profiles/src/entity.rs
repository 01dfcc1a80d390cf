//! Profile entities and validated inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unilearn_common::Role;
use uuid::Uuid;
use validator::Validate;

/// One row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub year_of_study: Option<i32>,
    #[serde(default)]
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Editable profile fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 8))]
    pub year_of_study: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub profile_image: Option<String>,
}

/// What a completed login knows about the user; upserted into the
/// profile row so a first OAuth login materializes one.
#[derive(Debug, Clone, Validate)]
pub struct LoginProfile {
    pub id: Uuid,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    pub role: Role,
    pub email_verified: bool,
}
