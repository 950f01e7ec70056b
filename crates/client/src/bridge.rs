//! Host bridge: fire-and-forget requests to the embedding application.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jide_core::StatusIndicator;
use thiserror::Error;
use tracing::debug;

use crate::events::{ClientEvent, EventSender};

/// Code reported when the host could not be reached at all.
pub const TRANSPORT_FAILURE_CODE: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host error {code}: {message}")]
pub struct BridgeFailure {
    pub code: i32,
    pub message: String,
}

impl BridgeFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The embedding host. Accepts one encoded request and answers with text.
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn call(&self, request: &str) -> Result<String, BridgeFailure>;
}

/// What a bridge call was made for, so its result can be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeCall {
    Link,
    Status(StatusIndicator),
}

/// Gate in front of the host. Calls are dropped while the host is hidden.
pub struct TransportBridge {
    host: Arc<dyn HostBridge>,
    visible: bool,
}

impl TransportBridge {
    pub fn new(host: Arc<dyn HostBridge>, visible: bool) -> Self {
        Self { host, visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Issues `request` to the host in the background. The answer arrives as
    /// [`ClientEvent::BridgeResolved`]. Returns `false` when the call was
    /// dropped because the host is hidden.
    pub fn call(&self, request: String, call: BridgeCall, events: &EventSender) -> bool {
        if !self.visible {
            debug!(request = %request, "host hidden, dropping bridge call");
            return false;
        }

        let host = Arc::clone(&self.host);
        let events = events.clone();
        tokio::spawn(async move {
            let result = host.call(&request).await;
            let _ = events.send(ClientEvent::BridgeResolved { call, result });
        });
        true
    }
}

/// Host reachable over HTTP: each request is POSTed as plain text and the
/// response body is the answer.
pub struct HttpHostBridge {
    client: reqwest::Client,
    url: String,
}

impl HttpHostBridge {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BridgeFailure> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeFailure::new(TRANSPORT_FAILURE_CODE, e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl HostBridge for HttpHostBridge {
    async fn call(&self, request: &str) -> Result<String, BridgeFailure> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(request.to_string())
            .send()
            .await
            .map_err(|e| BridgeFailure::new(TRANSPORT_FAILURE_CODE, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BridgeFailure::new(TRANSPORT_FAILURE_CODE, e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            Err(BridgeFailure::new(i32::from(status.as_u16()), message))
        }
    }
}

/// Used when no host is configured. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

#[async_trait]
impl HostBridge for DetachedHost {
    async fn call(&self, _request: &str) -> Result<String, BridgeFailure> {
        Err(BridgeFailure::new(TRANSPORT_FAILURE_CODE, "no host attached"))
    }
}
