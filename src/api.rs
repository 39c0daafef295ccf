//! # Gallery API Client
//!
//! One method per passkey endpoint. Each method turns a non-ok status into a
//! [`PasskeyError`] carrying the server's text, and lets transport failures
//! through as [`PasskeyError::Network`].
//!
//! ## Routes
//! | Method | Path | Body |
//! |---|---|---|
//! | POST | /api/auth/webauthn/register/begin | `{label?}` |
//! | POST | /api/auth/webauthn/register/finish | `{sessionId, credential, label}` |
//! | POST | /api/auth/webauthn/login/begin | none |
//! | POST | /api/auth/webauthn/login/finish | `{sessionId, credential}` |
//! | GET | /api/auth/webauthn/passkeys | none |
//! | DELETE | /api/auth/webauthn/passkeys | `{id}` |
//! | GET | availability path from config | none |

use crate::config::ClientConfig;
use crate::error::{PasskeyError, PasskeyResult};
use crate::webauthn::types::*;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct GalleryApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl GalleryApi {
    pub fn new(config: ClientConfig) -> PasskeyResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> PasskeyResult<RequestBuilder> {
        let url = self.config.endpoint(path)?;
        debug!(%method, %url, "gallery request");

        let mut builder = self.client.request(method, url);
        if let Some(cookie) = &self.config.session_cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        Ok(builder)
    }

    // Registration

    pub async fn register_begin(
        &self,
        label: Option<&str>,
    ) -> PasskeyResult<BeginResponse<CreationOptionsJson>> {
        let response = self
            .request(Method::POST, &self.config.endpoints.register_begin)?
            .json(&RegisterBeginRequest { label })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to start registration").await);
        }
        read_json(response).await
    }

    pub async fn register_finish(
        &self,
        body: &RegisterFinishRequest<'_>,
    ) -> PasskeyResult<RegistrationOutcome> {
        let response = self
            .request(Method::POST, &self.config.endpoints.register_finish)?
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Registration failed").await);
        }
        read_json(response).await
    }

    // Authentication

    /// A 404 means the deployment has no passkeys to offer
    pub async fn login_begin(&self) -> PasskeyResult<BeginResponse<RequestOptionsJson>> {
        let response = self
            .request(Method::POST, &self.config.endpoints.login_begin)?
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(PasskeyError::NoPasskeysRegistered),
            status if status.is_success() => read_json(response).await,
            _ => Err(rejection(response, "Failed to start authentication").await),
        }
    }

    pub async fn login_finish(&self, body: &LoginFinishRequest<'_>) -> PasskeyResult<LoginOutcome> {
        let response = self
            .request(Method::POST, &self.config.endpoints.login_finish)?
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Authentication failed").await);
        }
        read_json(response).await
    }

    // Management

    pub async fn list_passkeys(&self) -> PasskeyResult<Vec<Passkey>> {
        let response = self
            .request(Method::GET, &self.config.endpoints.passkeys)?
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to load passkeys").await);
        }
        let list: PasskeyList = read_json(response).await?;
        Ok(list.into_passkeys())
    }

    pub async fn delete_passkey(&self, id: &str) -> PasskeyResult<DeleteOutcome> {
        let response = self
            .request(Method::DELETE, &self.config.endpoints.passkeys)?
            .json(&DeletePasskeyRequest { id })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to delete passkey").await);
        }
        read_json(response).await
    }

    pub async fn availability(&self) -> PasskeyResult<Availability> {
        let response = self
            .request(Method::GET, &self.config.endpoints.availability)?
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to check passkey availability").await);
        }
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> PasskeyResult<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn rejection(response: Response, fallback: &str) -> PasskeyError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = server_message(&body).unwrap_or_else(|| fallback.to_string());

    warn!(%status, %message, "gallery rejected request");
    PasskeyError::ServerRejected(message)
}

/// Extract the message from an error body: `{"error": "..."}`, else the raw text
fn server_message(body: &str) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        return map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string);
    }

    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
