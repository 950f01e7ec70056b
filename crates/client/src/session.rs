//! The chat session controller.

use std::sync::Arc;
use std::time::Duration;

use jide_core::{
    ApiResponse, ClientConfig, ControlCommand, DisplayLog, EventKind, HostCommand,
    MessageCategory, ServerEvent, SessionId, StatusIndicator,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError, HttpBackend};
use crate::bridge::{BridgeCall, BridgeFailure, DetachedHost, HostBridge, HttpHostBridge, TransportBridge};
use crate::dispatcher::{CommandDispatcher, LinkActivation, is_soft_error};
use crate::events::{ClientEvent, EventReceiver, EventSender, event_channel, schedule};
use crate::lifecycle::{ConversationLifecycle, ConversationState};
use crate::renderer::{CommonMarkRenderer, MarkdownRenderer, MessageRenderer};
use crate::scroll::ScrollSuppression;
use crate::stream::{ChannelState, HttpConnector, StreamConnection, StreamConnector, StreamError, StreamSignal};
use crate::view::ChatView;

pub const SEND_FAILED_TEXT: &str = "Error: Failed to send message";
pub const CONTROL_FAILED_TEXT: &str = "Error: Failed to send command";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("host bridge: {0}")]
    Bridge(#[from] BridgeFailure),
}

/// External collaborators of a session.
pub struct SessionParts {
    pub backend: Arc<dyn Backend>,
    pub host: Arc<dyn HostBridge>,
    pub connector: Arc<dyn StreamConnector>,
    pub markdown: Arc<dyn MarkdownRenderer>,
}

impl SessionParts {
    /// HTTP implementations for everything; the host is detached unless a
    /// bridge URL is configured.
    pub fn http(config: &ClientConfig) -> Result<Self, SetupError> {
        let timeout = Duration::from_secs(config.server.request_timeout_secs);
        let host: Arc<dyn HostBridge> = match &config.host.bridge_url {
            Some(url) => Arc::new(HttpHostBridge::new(url.clone(), timeout)?),
            None => Arc::new(DetachedHost),
        };
        Ok(Self {
            backend: Arc::new(HttpBackend::new(&config.server.base_url, timeout)?),
            host,
            connector: Arc::new(HttpConnector::new(timeout)?),
            markdown: Arc::new(CommonMarkRenderer),
        })
    }
}

/// Owns all client state. Every change happens in [`handle`](Self::handle),
/// called from a single task.
pub struct ChatSession<V: ChatView> {
    config: ClientConfig,
    session_id: SessionId,
    view: V,
    backend: Arc<dyn Backend>,
    bridge: TransportBridge,
    stream: StreamConnection,
    renderer: MessageRenderer,
    lifecycle: ConversationLifecycle,
    suppression: ScrollSuppression,
    dispatcher: CommandDispatcher,
    events_tx: EventSender,
    events_rx: EventReceiver,
    reconnect: Option<JoinHandle<()>>,
    status: Option<StatusIndicator>,
    send_in_flight: bool,
    ended_before_ack: bool,
    last_turn: Option<bool>,
    disposed: bool,
}

impl<V: ChatView> ChatSession<V> {
    pub fn new(config: ClientConfig, session_id: SessionId, view: V, parts: SessionParts) -> Self {
        let (events_tx, events_rx) = event_channel();
        let stream = StreamConnection::new(
            config.server.base_url.clone(),
            session_id.clone(),
            parts.connector,
        );
        Self {
            bridge: TransportBridge::new(parts.host, config.host.start_visible),
            renderer: MessageRenderer::new(parts.markdown),
            suppression: ScrollSuppression::new(
                config.scroll.bottom_threshold,
                config.scroll.suppression_window(),
            ),
            dispatcher: CommandDispatcher::new(config.input.stop_sentinel.clone()),
            backend: parts.backend,
            lifecycle: ConversationLifecycle::new(),
            stream,
            config,
            session_id,
            view,
            events_tx,
            events_rx,
            reconnect: None,
            status: None,
            send_in_flight: false,
            ended_before_ack: false,
            last_turn: None,
            disposed: false,
        }
    }

    /// Opens the push channel.
    pub fn init(&mut self) {
        info!(session = %self.session_id, "chat session starting");
        self.connect_stream();
    }

    /// Closes the push channel and cancels all timers. Later events are
    /// ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.stream.close();
        self.suppression.cancel_timer();
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
        }
        info!(session = %self.session_id, "chat session disposed");
    }

    pub fn sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        self.events_rx.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<ClientEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Handles every queued event without waiting. Returns how many ran.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.try_next_event() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn conversation_state(&self) -> ConversationState {
        self.lifecycle.state()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.stream.state()
    }

    pub fn status(&self) -> Option<StatusIndicator> {
        self.status
    }

    pub fn log(&self) -> &DisplayLog {
        self.renderer.log()
    }

    pub fn is_autoscroll_suppressed(&self) -> bool {
        self.suppression.is_suppressed()
    }

    pub fn is_host_visible(&self) -> bool {
        self.bridge.is_visible()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// A message is on its way or a turn is running.
    pub fn is_awaiting_reply(&self) -> bool {
        self.send_in_flight || self.lifecycle.is_active()
    }

    /// Outcome of the most recently finished turn.
    pub fn last_turn_outcome(&self) -> Option<bool> {
        self.last_turn
    }

    pub fn handle(&mut self, event: ClientEvent) {
        if self.disposed {
            debug!(?event, "session disposed, ignoring event");
            return;
        }

        match event {
            ClientEvent::Submit(text) => self.submit(&text),
            ClientEvent::StopPressed => self.request_stop(),
            ClientEvent::LinkActivated(activation) => self.activate_link(&activation),
            ClientEvent::Wheel(metrics) => {
                self.suppression.on_wheel(metrics, &self.events_tx);
            }
            ClientEvent::HostShown => self.bridge.show(),
            ClientEvent::HostHidden => self.bridge.hide(),
            ClientEvent::Stream { generation, signal } => {
                if let Some(signal) = self.stream.accept(generation, signal) {
                    self.on_stream_signal(signal);
                }
            }
            ClientEvent::ReconnectDue => self.on_reconnect_due(),
            ClientEvent::SuppressionExpired { generation } => {
                if self.suppression.on_expired(generation) {
                    debug!("auto-scroll resumed");
                }
            }
            ClientEvent::MessageSent(result) => self.on_message_sent(result),
            ClientEvent::ControlSent(result) => self.on_control_sent(result),
            ClientEvent::BridgeResolved { call, result } => self.on_bridge_resolved(call, result),
        }
    }

    // ── Sending ─────────────────────────────────────────────────────

    fn submit(&mut self, text: &str) {
        let message = text.trim();
        if message.is_empty() {
            return;
        }
        if self.dispatcher.is_stop_request(message) {
            self.view.clear_input();
            self.request_stop();
            return;
        }
        if self.is_awaiting_reply() {
            debug!("turn in flight, ignoring submit");
            return;
        }

        self.renderer.clear(&mut self.view);
        self.lifecycle.clear_outcome();
        self.append(message, MessageCategory::User, None);

        self.send_in_flight = true;
        self.ended_before_ack = false;
        let backend = Arc::clone(&self.backend);
        let session = self.session_id.clone();
        let message = message.to_string();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.send_message(&session, &message).await;
            let _ = events.send(ClientEvent::MessageSent(result));
        });
    }

    fn on_message_sent(&mut self, result: Result<ApiResponse, BackendError>) {
        self.send_in_flight = false;
        let ended_early = std::mem::take(&mut self.ended_before_ack);
        match result {
            Ok(response) if response.is_success() => {
                if ended_early {
                    debug!("turn ended before the send was acknowledged");
                } else {
                    self.lifecycle.start(&mut self.view);
                }
            }
            Ok(response) => {
                warn!(message = ?response.message, "message rejected");
                self.last_turn = Some(false);
                self.append(&response.rejection_text(), MessageCategory::Error, None);
            }
            Err(e) => {
                warn!(error = %e, "send_message failed");
                self.last_turn = Some(false);
                self.append(SEND_FAILED_TEXT, MessageCategory::Error, None);
                self.set_status(StatusIndicator::SendError);
            }
        }
    }

    fn request_stop(&mut self) {
        self.view.set_stop_loading(true);
        let backend = Arc::clone(&self.backend);
        let session = self.session_id.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.send_control(&session, ControlCommand::Stop).await;
            let _ = events.send(ClientEvent::ControlSent(result));
        });
    }

    /// A stop the backend took keeps its loading decoration until the turn
    /// ends.
    fn on_control_sent(&mut self, result: Result<ApiResponse, BackendError>) {
        match result {
            Ok(response) if response.is_success() => debug!("stop accepted"),
            Ok(response) => {
                warn!(message = ?response.message, "stop rejected");
                self.view.set_stop_loading(false);
                self.append(&response.rejection_text(), MessageCategory::Error, None);
            }
            Err(e) => {
                warn!(error = %e, "control failed");
                self.view.set_stop_loading(false);
                self.append(CONTROL_FAILED_TEXT, MessageCategory::Error, None);
            }
        }
    }

    // ── Host ────────────────────────────────────────────────────────

    fn activate_link(&mut self, activation: &LinkActivation) {
        let Some(command) = self.dispatcher.resolve_link(activation) else {
            debug!(href = %activation.href, "not a command link");
            return;
        };
        self.bridge
            .call(command.encode(), BridgeCall::Link, &self.events_tx);
    }

    fn on_bridge_resolved(&mut self, call: BridgeCall, result: Result<String, BridgeFailure>) {
        match (call, result) {
            (BridgeCall::Link, Ok(answer)) => {
                if is_soft_error(&answer) {
                    self.append(&answer, MessageCategory::Error, None);
                }
            }
            (BridgeCall::Link, Err(failure)) => {
                warn!(code = failure.code, "host command failed");
                self.append(&format!("Error:{}", failure.message), MessageCategory::Error, None);
            }
            (BridgeCall::Status(_), Ok(_)) => {}
            (BridgeCall::Status(indicator), Err(failure)) => {
                warn!(code = failure.code, message = %failure.message, "host rejected status update");
                self.view.set_connection_status(&indicator);
            }
        }
    }

    /// Shows a status change, locally or through the host when embedded.
    fn set_status(&mut self, indicator: StatusIndicator) {
        if self.status == Some(indicator) {
            return;
        }
        self.status = Some(indicator);

        if !self.config.host.embedded {
            self.view.set_connection_status(&indicator);
            return;
        }
        let request = HostCommand::status(indicator).encode();
        if !self
            .bridge
            .call(request, BridgeCall::Status(indicator), &self.events_tx)
        {
            self.view.set_connection_status(&indicator);
        }
    }

    // ── Push channel ────────────────────────────────────────────────

    fn connect_stream(&mut self) {
        if let Err(e) = self.stream.connect(&self.events_tx) {
            self.on_channel_failure(StatusIndicator::FailedToConnect, &e.to_string());
        }
    }

    fn on_stream_signal(&mut self, signal: StreamSignal) {
        match signal {
            StreamSignal::Opened => {
                info!(generation = self.stream.generation(), "push channel open");
                self.set_status(StatusIndicator::Connected);
            }
            StreamSignal::Data(payload) => self.on_push_payload(&payload),
            StreamSignal::Failed(reason) => {
                self.on_channel_failure(StatusIndicator::ConnectionError, &reason)
            }
        }
    }

    fn on_push_payload(&mut self, payload: &str) {
        let event = match ServerEvent::parse(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "unparseable push event");
                self.append(&format!("Error:{e}"), MessageCategory::Error, None);
                return;
            }
        };
        self.set_status(StatusIndicator::Connected);
        self.on_server_event(event);
    }

    fn on_server_event(&mut self, event: ServerEvent) {
        let timestamp = event.timestamp_utc();
        match event.kind {
            EventKind::Status => self.view.set_project_status(event.message_or_empty()),
            EventKind::Heartbeat => {}
            EventKind::End => {
                if let Some(message) = event.message.as_deref() {
                    self.append(message, MessageCategory::Finished, timestamp);
                }
                self.finish_turn();
            }
            kind => {
                self.lifecycle.observe(kind);
                if let Some(category) = kind.display_category() {
                    self.append(event.message_or_empty(), category, timestamp);
                }
            }
        }
    }

    /// An end event with no turn in flight is only rendered.
    fn finish_turn(&mut self) {
        if !self.is_awaiting_reply() {
            debug!("end event outside a turn");
            return;
        }
        if self.send_in_flight && !self.lifecycle.is_active() {
            self.ended_before_ack = true;
        }
        let success = self.lifecycle.inferred_success();
        self.last_turn = Some(success);
        self.lifecycle.end(success, &mut self.view);
    }

    fn on_channel_failure(&mut self, indicator: StatusIndicator, reason: &str) {
        warn!(reason, status = indicator.label(), "push channel failed");
        if self.is_awaiting_reply() {
            self.last_turn = Some(false);
        }
        if self.send_in_flight {
            self.ended_before_ack = true;
        }
        self.lifecycle.end(false, &mut self.view);
        self.set_status(indicator);
        self.schedule_reconnect();
    }

    /// At most one reconnect is pending at a time.
    fn schedule_reconnect(&mut self) {
        if self.reconnect.is_some() {
            debug!("reconnect already scheduled");
            return;
        }
        self.reconnect = Some(schedule(
            &self.events_tx,
            self.config.stream.reconnect_delay(),
            ClientEvent::ReconnectDue,
        ));
    }

    fn on_reconnect_due(&mut self) {
        self.reconnect = None;
        match self.stream.state() {
            ChannelState::Closed => {
                info!("reconnecting push channel");
                self.connect_stream();
            }
            state => debug!(?state, "channel not closed, skipping reconnect"),
        }
    }

    fn append(&mut self, message: &str, category: MessageCategory, timestamp: Option<chrono::DateTime<chrono::Utc>>) {
        let autoscroll = !self.suppression.is_suppressed();
        self.renderer
            .append(message, category, timestamp, autoscroll, &mut self.view);
    }
}

impl<V: ChatView> Drop for ChatSession<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}
