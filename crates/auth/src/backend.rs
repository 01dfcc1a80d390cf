//! Profile access for the session tracker
//!
//! Wraps the table client and owns the auth-specific profile reads and
//! writes: a lightweight read model of the same `users` rows the
//! profiles domain manages in full. Provisions a defaulted row lazily
//! when an authenticated id has none.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use unilearn_common::Role;
use unilearn_identity::IdentityUser;
use unilearn_store::{StoreError, TableClient};
use uuid::Uuid;

/// Lightweight profile view for auth decisions.
///
/// Carries only the fields role checks and routing need; callers
/// needing the full profile load it from the profiles domain.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields collected by the registration form.
#[derive(Debug, Clone)]
pub struct SignUpData {
    pub full_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub year_of_study: Option<i32>,
}

/// Profile store access scoped to what session tracking needs.
#[derive(Clone)]
pub struct ProfileBackend {
    tables: TableClient,
}

impl ProfileBackend {
    pub fn new(tables: TableClient) -> Self {
        Self { tables }
    }

    /// Find a profile row by the identity provider's user id.
    pub async fn find_profile(&self, id: Uuid) -> Result<Option<AuthProfile>, StoreError> {
        self.tables
            .from("users")
            .select("*")
            .eq("id", id)
            .fetch_optional()
            .await
    }

    /// Load the profile for a signed-in user, creating a defaulted row
    /// if none exists yet.
    ///
    /// Never fails the caller: a missing or unloadable profile leaves
    /// the user authenticated with no profile.
    pub async fn ensure_profile(&self, user: &IdentityUser) -> Option<AuthProfile> {
        match self.find_profile(user.id).await {
            Ok(Some(profile)) => {
                self.touch_last_login(user.id).await;
                Some(profile)
            }
            Ok(None) => {
                tracing::info!(user_id = %user.id, "profile row missing, provisioning defaults");
                if let Err(e) = self.provision_profile(user).await {
                    // A concurrent first-login may have won the insert
                    if !matches!(e, StoreError::Conflict(_)) {
                        tracing::warn!(error = %e, user_id = %user.id, "failed to provision profile");
                        return None;
                    }
                }
                match self.find_profile(user.id).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        tracing::warn!(error = %e, user_id = %user.id, "failed to re-read provisioned profile");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user.id, "failed to load profile");
                None
            }
        }
    }

    /// Insert the defaulted profile row for an authenticated identity.
    ///
    /// Full name falls back to the local part of the email, role to
    /// student; verification state comes from the provider.
    async fn provision_profile(&self, user: &IdentityUser) -> Result<(), StoreError> {
        let full_name = user
            .user_metadata
            .full_name
            .clone()
            .unwrap_or_else(|| email_local_part(&user.email));
        let role = user.user_metadata.role.unwrap_or_default();

        let row = serde_json::json!({
            "id": user.id,
            "email": user.email,
            "full_name": full_name,
            "role": role,
            "created_at": Utc::now(),
            "is_active": true,
            "email_verified": user.email_confirmed_at.is_some(),
        });
        self.tables.from("users").insert_void(&row).await
    }

    /// Insert the full profile row collected at registration.
    ///
    /// Unlike [`ensure_profile`](Self::ensure_profile) this propagates
    /// failure: sign-up compensates by deleting the identity.
    pub async fn create_profile(
        &self,
        user: &IdentityUser,
        data: &SignUpData,
    ) -> Result<(), StoreError> {
        let row = serde_json::json!({
            "id": user.id,
            "email": user.email,
            "full_name": data.full_name,
            "role": data.role,
            "phone": data.phone,
            "university": data.university,
            "department": data.department,
            "year_of_study": data.year_of_study,
            "created_at": Utc::now(),
            "is_active": true,
            "email_verified": false,
        });
        self.tables.from("users").insert_void(&row).await
    }

    /// Patch profile columns for a signed-in user.
    pub async fn update_profile(
        &self,
        id: Uuid,
        updates: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.tables
            .from("users")
            .eq("id", id)
            .update_void(updates)
            .await
    }

    /// Record the login moment; best-effort.
    pub async fn touch_last_login(&self, id: Uuid) {
        let patch = serde_json::json!({ "last_login": Utc::now() });
        if let Err(e) = self
            .tables
            .from("users")
            .eq("id", id)
            .update_void(&patch)
            .await
        {
            tracing::warn!(error = %e, user_id = %id, "failed to update last_login");
        }
    }

    /// Flip the verification flag after a confirmed one-time code;
    /// best-effort.
    pub async fn mark_email_verified(&self, id: Uuid) {
        let patch = serde_json::json!({ "email_verified": true });
        if let Err(e) = self
            .tables
            .from("users")
            .eq("id", id)
            .update_void(&patch)
            .await
        {
            tracing::warn!(error = %e, user_id = %id, "failed to mark email verified");
        }
    }
}

fn email_local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
