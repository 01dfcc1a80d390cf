//! Object storage client
//!
//! Lesson materials are uploaded to the hosted object storage under
//! `{base_url}/storage/v1`. Files are publicly readable once stored;
//! the public URL scheme is fixed by the backend.

use reqwest::Method;

use crate::error::{classify_error, ErrorBody, StoreError};
use crate::token::AuthToken;
use unilearn_common::Config;

/// Stored file reference handed back to the caller.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    storage_url: String,
    api_key: String,
    token: AuthToken,
}

impl StorageClient {
    pub fn new(config: &Config, token: AuthToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            storage_url: format!("{}/storage/v1", config.backend_url.trim_end_matches('/')),
            api_key: config.anon_key.clone(),
            token,
        }
    }

    /// Upload file contents and return the stored path plus public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        let url = format!("{}/object/{}/{}", self.storage_url, bucket, path);
        let bearer = self.token.get().unwrap_or_else(|| self.api_key.clone());

        let response = self
            .http
            .request(Method::POST, &url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), body));
        }

        Ok(StoredObject {
            path: path.to_string(),
            url: self.public_url(bucket, path),
        })
    }

    /// Remove a stored file.
    pub async fn remove(&self, bucket: &str, path: &str) -> Result<(), StoreError> {
        let url = format!("{}/object/{}/{}", self.storage_url, bucket, path);
        let bearer = self.token.get().unwrap_or_else(|| self.api_key.clone());

        let response = self
            .http
            .request(Method::DELETE, &url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), body));
        }
        Ok(())
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.storage_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_layout() {
        let config = Config {
            backend_url: "https://project.example.co/".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: None,
            materials_bucket: "materials".to_string(),
            session_file: "session.json".to_string(),
            language_file: "language".to_string(),
            log_level: "info".to_string(),
        };
        let storage = StorageClient::new(&config, AuthToken::new());

        assert_eq!(
            storage.public_url("materials", "lessons/42/notes.pdf"),
            "https://project.example.co/storage/v1/object/public/materials/lessons/42/notes.pdf"
        );
    }
}
