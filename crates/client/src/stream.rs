//! Server push channel (`GET /events?session_id=...`).

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use jide_core::SessionId;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use crate::backend::parse_base_url;
use crate::events::{ClientEvent, EventSender};
use crate::sse::SseDecoder;

pub const EVENTS_PATH: &str = "events";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// What a reader task reports about its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Opened,
    /// One event payload (the joined `data` lines).
    Data(String),
    /// The connection is gone, including an orderly end of stream.
    Failed(String),
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid events url: {0}")]
    InvalidUrl(String),
    #[error("failed to open push channel: {0}")]
    Connect(String),
}

/// Reader-side handle tagging every signal with its connection generation.
#[derive(Debug, Clone)]
pub struct StreamSink {
    generation: u64,
    events: EventSender,
}

impl StreamSink {
    pub fn new(generation: u64, events: EventSender) -> Self {
        Self { generation, events }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the session is gone.
    pub fn send(&self, signal: StreamSignal) -> bool {
        self.events
            .send(ClientEvent::Stream {
                generation: self.generation,
                signal,
            })
            .is_ok()
    }
}

/// Opens push channels. The returned task owns the connection; aborting it
/// closes the connection.
pub trait StreamConnector: Send + Sync {
    fn open(&self, url: &Url, sink: StreamSink) -> Result<JoinHandle<()>, StreamError>;
}

/// SSE over HTTP.
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    /// Only connection setup is bounded; the stream itself is long-lived.
    pub fn new(connect_timeout: Duration) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

impl StreamConnector for HttpConnector {
    fn open(&self, url: &Url, sink: StreamSink) -> Result<JoinHandle<()>, StreamError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        let request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream");
        Ok(runtime.spawn(read_events(request, sink)))
    }
}

async fn read_events(request: reqwest::RequestBuilder, sink: StreamSink) {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            sink.send(StreamSignal::Failed(e.to_string()));
            return;
        }
    };
    if !response.status().is_success() {
        sink.send(StreamSignal::Failed(format!(
            "unexpected status {}",
            response.status()
        )));
        return;
    }
    if !sink.send(StreamSignal::Opened) {
        return;
    }

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for payload in decoder.push(&bytes) {
                    if !sink.send(StreamSignal::Data(payload)) {
                        return;
                    }
                }
            }
            Err(e) => {
                sink.send(StreamSignal::Failed(format!("stream read error: {e}")));
                return;
            }
        }
    }
    sink.send(StreamSignal::Failed("stream closed by server".to_string()));
}

/// The single live push channel of a session.
///
/// Every [`connect`](Self::connect) starts a new generation; signals from
/// earlier generations are discarded by [`accept`](Self::accept).
pub struct StreamConnection {
    base_url: String,
    session: SessionId,
    connector: Arc<dyn StreamConnector>,
    state: ChannelState,
    generation: u64,
    reader: Option<JoinHandle<()>>,
}

impl StreamConnection {
    pub fn new(base_url: impl Into<String>, session: SessionId, connector: Arc<dyn StreamConnector>) -> Self {
        Self {
            base_url: base_url.into(),
            session,
            connector,
            state: ChannelState::Closed,
            generation: 0,
            reader: None,
        }
    }

    pub fn events_url(base_url: &str, session: &SessionId) -> Result<Url, StreamError> {
        let base = parse_base_url(base_url).map_err(|e| StreamError::InvalidUrl(e.to_string()))?;
        let mut url = base
            .join(EVENTS_PATH)
            .map_err(|e| StreamError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("session_id", session.as_str());
        Ok(url)
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces any existing connection with a new one.
    pub fn connect(&mut self, events: &EventSender) -> Result<(), StreamError> {
        self.abort_reader();
        self.generation += 1;
        self.state = ChannelState::Connecting;

        let opened = Self::events_url(&self.base_url, &self.session).and_then(|url| {
            info!(url = %url, generation = self.generation, "opening push channel");
            self.connector
                .open(&url, StreamSink::new(self.generation, events.clone()))
        });
        match opened {
            Ok(reader) => {
                self.reader = Some(reader);
                Ok(())
            }
            Err(e) => {
                self.state = ChannelState::Closed;
                Err(e)
            }
        }
    }

    /// Applies a reader signal. Returns it only when it belongs to the live
    /// connection.
    pub fn accept(&mut self, generation: u64, signal: StreamSignal) -> Option<StreamSignal> {
        if generation != self.generation || self.state == ChannelState::Closed {
            debug!(generation, current = self.generation, "stale stream signal");
            return None;
        }
        match &signal {
            StreamSignal::Opened | StreamSignal::Data(_) => self.state = ChannelState::Open,
            StreamSignal::Failed(_) => {
                self.state = ChannelState::Closed;
                self.reader = None;
            }
        }
        Some(signal)
    }

    /// Closes the connection; nothing it sent afterwards is accepted.
    pub fn close(&mut self) {
        self.abort_reader();
        self.generation += 1;
        self.state = ChannelState::Closed;
    }

    fn abort_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.abort_reader();
    }
}
