//! Backend request/response channel: `POST /send_message` and `POST /control`.

use std::time::Duration;

use async_trait::async_trait;
use jide_core::{ApiResponse, ControlCommand, ControlRequest, SendMessageRequest, SessionId};
use serde::Serialize;
use thiserror::Error;
use url::Url;

pub const SEND_MESSAGE_PATH: &str = "send_message";
pub const CONTROL_PATH: &str = "control";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed response (HTTP {status}): {reason}")]
    Decode { status: u16, reason: String },
}

/// The conversation backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send_message(
        &self,
        session: &SessionId,
        message: &str,
    ) -> Result<ApiResponse, BackendError>;

    async fn send_control(
        &self,
        session: &SessionId,
        command: ControlCommand,
    ) -> Result<ApiResponse, BackendError>;
}

/// Parses a server base URL so that relative endpoints resolve beneath it,
/// including when the base carries a path prefix.
pub fn parse_base_url(raw: &str) -> Result<Url, BackendError> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).map_err(|e| BackendError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(BackendError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a base url".to_string(),
        });
    }
    Ok(url)
}

pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base = parse_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The body is decoded whatever the HTTP status; rejections come back
    /// as `{"status":"error",...}` with a 4xx code.
    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<ApiResponse, BackendError> {
        let url = self.base.join(path).map_err(|e| BackendError::InvalidUrl {
            url: self.base.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode {
            status,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send_message(
        &self,
        session: &SessionId,
        message: &str,
    ) -> Result<ApiResponse, BackendError> {
        let request = SendMessageRequest {
            message: message.to_string(),
            session_id: session.clone(),
        };
        self.post(SEND_MESSAGE_PATH, &request).await
    }

    async fn send_control(
        &self,
        session: &SessionId,
        command: ControlCommand,
    ) -> Result<ApiResponse, BackendError> {
        let request = ControlRequest {
            command,
            session_id: session.clone(),
        };
        self.post(CONTROL_PATH, &request).await
    }
}
