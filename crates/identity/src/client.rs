//! GoTrue-style HTTP client implementation
//!
//! Real HTTP client against the hosted identity endpoints under
//! `{base_url}/auth/v1`. Keeps the established session in memory,
//! mirrors every transition to subscribers, and never interprets token
//! contents beyond the unverified expiry claim.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::IdentityError;
use crate::types::{
    AuthChange, AuthEventKind, IdentityUser, OAuthProvider, OtpKind, Session, SignUpResult,
    UserAttributes, UserMetadata,
};
use crate::{IdentityConfig, IdentityService};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Token grant response from the provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: IdentityUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + self.expires_in);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up response; the session block is absent while email
/// confirmation is pending, in which case the user comes top-level.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: IdentityUser,
}

/// Provider error body; field name varies by endpoint.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Real identity client for the hosted auth API.
pub struct GotrueClient {
    http: reqwest::Client,
    config: IdentityConfig,
    auth_url: String,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthChange>,
}

impl GotrueClient {
    /// Create a new identity client from configuration.
    pub fn new(config: IdentityConfig) -> Self {
        let auth_url = format!("{}/auth/v1", config.base_url.trim_end_matches('/'));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            config,
            auth_url,
            session: Mutex::new(None),
            events,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.auth_url, path))
            .header("apikey", &self.config.anon_key)
    }

    fn bearer(&self) -> Option<String> {
        self.stored_session().map(|s| s.access_token)
    }

    fn stored_session(&self) -> Option<Session> {
        self.session
            .lock()
            .expect("session lock poisoned — prior access panicked")
            .clone()
    }

    fn store_session(&self, session: Option<Session>) {
        *self
            .session
            .lock()
            .expect("session lock poisoned — prior access panicked") = session;
    }

    fn emit(&self, event: AuthEventKind, session: Option<Session>) {
        // Send fails only when nobody subscribed, which is fine
        let _ = self.events.send(AuthChange { event, session });
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, IdentityError> {
        let response = builder
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::message)
                .unwrap_or_else(|| format!("identity provider returned {}", status));
            return Err(IdentityError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))
    }

    async fn send_no_body(&self, builder: RequestBuilder) -> Result<(), IdentityError> {
        let response = builder
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::message)
                .unwrap_or_else(|| format!("identity provider returned {}", status));
            return Err(IdentityError::Provider {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn fetch_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        self.send(
            self.request(Method::GET, "/user")
                .bearer_auth(access_token),
        )
        .await
    }
}

#[async_trait::async_trait]
impl IdentityService for GotrueClient {
    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        Ok(self.stored_session())
    }

    async fn current_user(&self) -> Result<Option<IdentityUser>, IdentityError> {
        match self.bearer() {
            Some(token) => Ok(Some(self.fetch_user(&token).await?)),
            None => Ok(None),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response: TokenResponse = self
            .send(
                self.request(Method::POST, "/token?grant_type=password")
                    .json(&serde_json::json!({ "email": email, "password": password })),
            )
            .await?;

        let session = response.into_session();
        self.store_session(Some(session.clone()));
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        tracing::debug!(user_id = %session.user.id, "password sign-in succeeded");
        Ok(session)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> String {
        let mut url = url::Url::parse(&format!("{}/authorize", self.auth_url))
            .unwrap_or_else(|_| url::Url::parse("about:blank").expect("static url"));
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        url.to_string()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<SignUpResult, IdentityError> {
        let response: SignUpResponse = self
            .send(self.request(Method::POST, "/signup").json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            })))
            .await?;

        let session = match (response.access_token, response.refresh_token) {
            (Some(access_token), Some(refresh_token)) => {
                let expires_at = response.expires_at.unwrap_or_else(|| {
                    Utc::now().timestamp() + response.expires_in.unwrap_or(3600)
                });
                Some(Session {
                    access_token,
                    refresh_token,
                    expires_at,
                    user: response.user.clone(),
                })
            }
            _ => None,
        };

        if let Some(session) = &session {
            self.store_session(Some(session.clone()));
            self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        }

        Ok(SignUpResult {
            user: response.user,
            session,
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let bearer = self.bearer();
        // Local state clears before the network call: the provider being
        // unreachable must not keep a dead session alive
        self.store_session(None);
        self.emit(AuthEventKind::SignedOut, None);

        if let Some(token) = bearer {
            self.send_no_body(self.request(Method::POST, "/logout").bearer_auth(token))
                .await?;
        }
        Ok(())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let response: TokenResponse = self
            .send(
                self.request(Method::POST, "/token?grant_type=refresh_token")
                    .json(&serde_json::json!({ "refresh_token": refresh_token })),
            )
            .await?;

        let session = response.into_session();
        self.store_session(Some(session.clone()));
        self.emit(AuthEventKind::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, IdentityError> {
        // Expiry comes from the unverified token payload; the provider
        // remains the authority on token validity
        let expires_at = decode_expiry(access_token);
        let stale = expires_at
            .map(|at| at <= Utc::now().timestamp())
            .unwrap_or(true);

        if stale {
            return self.refresh_session(refresh_token).await;
        }

        let user = self.fetch_user(access_token).await?;
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: expires_at.unwrap_or_else(|| Utc::now().timestamp()),
            user,
        };
        self.store_session(Some(session.clone()));
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError> {
        self.send_no_body(
            self.request(Method::POST, "/recover")
                .query(&[("redirect_to", redirect_to)])
                .json(&serde_json::json!({ "email": email })),
        )
        .await
    }

    async fn update_user(&self, attributes: UserAttributes) -> Result<IdentityUser, IdentityError> {
        let token = self.bearer().ok_or(IdentityError::NoSession)?;
        let user: IdentityUser = self
            .send(
                self.request(Method::PUT, "/user")
                    .bearer_auth(token)
                    .json(&attributes),
            )
            .await?;

        let session = {
            let mut guard = self
                .session
                .lock()
                .expect("session lock poisoned — prior access panicked");
            if let Some(session) = guard.as_mut() {
                session.user = user.clone();
            }
            guard.clone()
        };
        self.emit(AuthEventKind::UserUpdated, session);
        Ok(user)
    }

    async fn verify_otp(&self, token_hash: &str, kind: OtpKind) -> Result<Session, IdentityError> {
        let response: TokenResponse = self
            .send(self.request(Method::POST, "/verify").json(&serde_json::json!({
                "token_hash": token_hash,
                "type": kind.as_str(),
            })))
            .await?;

        let session = response.into_session();
        self.store_session(Some(session.clone()));
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError> {
        self.send_no_body(self.request(Method::POST, "/resend").json(&serde_json::json!({
            "email": email,
            "type": "signup",
        })))
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError> {
        let service_key = self
            .config
            .service_role_key
            .as_ref()
            .ok_or(IdentityError::MissingServiceRole)?;

        self.send_no_body(
            self.http
                .request(
                    Method::DELETE,
                    format!("{}/admin/users/{}", self.auth_url, id),
                )
                .header("apikey", service_key)
                .bearer_auth(service_key),
        )
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

/// Read the `exp` claim out of a JWT payload without verifying the
/// signature. Returns `None` for anything that does not look like a JWT.
fn decode_expiry(access_token: &str) -> Option<i64> {
    let payload = access_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}
