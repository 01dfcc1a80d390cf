//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the hosted backend (identity provider + tables + storage)
    pub backend_url: String,
    /// Publishable API key sent with every request
    pub anon_key: String,
    /// Service-role key, required only for administrative calls
    /// (sign-up rollback deletes the orphaned identity)
    pub service_role_key: Option<String>,

    /// Object storage bucket for lesson materials
    pub materials_bucket: String,

    /// Path of the durable session record on disk
    pub session_file: String,
    /// Path of the persisted language preference
    pub language_file: String,

    /// Runtime configuration
    pub log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("backend_url", &self.backend_url)
            .field("anon_key", &"[REDACTED]")
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("materials_bucket", &self.materials_bucket)
            .field("session_file", &self.session_file)
            .field("language_file", &self.language_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            backend_url: env::var("UNILEARN_BACKEND_URL")
                .map_err(|_| anyhow::anyhow!("UNILEARN_BACKEND_URL is required"))?,
            anon_key: env::var("UNILEARN_ANON_KEY")
                .map_err(|_| anyhow::anyhow!("UNILEARN_ANON_KEY is required"))?,
            service_role_key: env::var("UNILEARN_SERVICE_ROLE_KEY").ok(),

            materials_bucket: env::var("UNILEARN_MATERIALS_BUCKET")
                .unwrap_or_else(|_| "materials".to_string()),

            session_file: env::var("UNILEARN_SESSION_FILE")
                .unwrap_or_else(|_| ".unilearn/session.json".to_string()),
            language_file: env::var("UNILEARN_LANGUAGE_FILE")
                .unwrap_or_else(|_| ".unilearn/language".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        Ok(config)
    }
}
