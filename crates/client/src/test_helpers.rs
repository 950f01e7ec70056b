//! Test doubles for the session seams.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use jide_core::{
    ApiResponse, ControlCommand, DisplayMessage, MessageCategory, SessionId, StatusIndicator,
};
use tokio::task::JoinHandle;
use url::Url;

use crate::backend::{Backend, BackendError};
use crate::bridge::{BridgeFailure, HostBridge};
use crate::stream::{StreamConnector, StreamError, StreamSink};
use crate::view::ChatView;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOp {
    InputVisible(bool),
    ClearInput,
    StopVisible(bool),
    StopLoading(bool),
    ClearLog,
    Append(MessageCategory),
    ScrollToBottom,
    Status(StatusIndicator),
    Project(String),
}

/// Records every view call and mirrors the resulting state.
#[derive(Debug)]
pub struct RecordingView {
    pub ops: Vec<ViewOp>,
    pub messages: Vec<DisplayMessage>,
    pub input: String,
    pub input_visible: bool,
    pub stop_visible: bool,
    pub stop_loading: bool,
    pub status: Option<StatusIndicator>,
    pub project: Option<String>,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            messages: Vec::new(),
            input: String::new(),
            input_visible: true,
            stop_visible: false,
            stop_loading: false,
            status: None,
            project: None,
        }
    }
}

impl RecordingView {
    pub fn bodies(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.body.as_str()).collect()
    }

    pub fn categories(&self) -> Vec<MessageCategory> {
        self.messages.iter().map(|m| m.category).collect()
    }

    pub fn count(&self, op: &ViewOp) -> usize {
        self.ops.iter().filter(|o| *o == op).count()
    }
}

impl ChatView for RecordingView {
    fn set_input_visible(&mut self, visible: bool) {
        self.input_visible = visible;
        self.ops.push(ViewOp::InputVisible(visible));
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.ops.push(ViewOp::ClearInput);
    }

    fn set_stop_visible(&mut self, visible: bool) {
        self.stop_visible = visible;
        self.ops.push(ViewOp::StopVisible(visible));
    }

    fn set_stop_loading(&mut self, loading: bool) {
        self.stop_loading = loading;
        self.ops.push(ViewOp::StopLoading(loading));
    }

    fn clear_log(&mut self) {
        self.messages.clear();
        self.ops.push(ViewOp::ClearLog);
    }

    fn append_message(&mut self, message: &DisplayMessage) {
        self.messages.push(message.clone());
        self.ops.push(ViewOp::Append(message.category));
    }

    fn scroll_to_bottom(&mut self) {
        self.ops.push(ViewOp::ScrollToBottom);
    }

    fn set_connection_status(&mut self, status: &StatusIndicator) {
        self.status = Some(*status);
        self.ops.push(ViewOp::Status(*status));
    }

    fn set_project_status(&mut self, text: &str) {
        self.project = Some(text.to_string());
        self.ops.push(ViewOp::Project(text.to_string()));
    }
}

/// Backend answering from a queue; an empty queue answers success.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<ApiResponse, BackendError>>>,
    pub messages: Mutex<Vec<(String, String)>>,
    pub controls: Mutex<Vec<(String, ControlCommand)>>,
}

impl ScriptedBackend {
    pub fn reply(&self, reply: Result<ApiResponse, BackendError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn control_count(&self) -> usize {
        self.controls.lock().unwrap().len()
    }

    fn next_reply(&self) -> Result<ApiResponse, BackendError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::success()))
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn send_message(
        &self,
        session: &SessionId,
        message: &str,
    ) -> Result<ApiResponse, BackendError> {
        self.messages
            .lock()
            .unwrap()
            .push((session.to_string(), message.to_string()));
        self.next_reply()
    }

    async fn send_control(
        &self,
        session: &SessionId,
        command: ControlCommand,
    ) -> Result<ApiResponse, BackendError> {
        self.controls.lock().unwrap().push((session.to_string(), command));
        self.next_reply()
    }
}

/// Host answering from a queue; an empty queue answers `"ok"`.
#[derive(Default)]
pub struct ScriptedHost {
    replies: Mutex<VecDeque<Result<String, BridgeFailure>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn reply(&self, reply: Result<String, BridgeFailure>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostBridge for ScriptedHost {
    async fn call(&self, request: &str) -> Result<String, BridgeFailure> {
        self.requests.lock().unwrap().push(request.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Connector whose connections are driven by hand through the kept sinks.
#[derive(Default)]
pub struct ManualConnector {
    opens: AtomicUsize,
    fail_next: AtomicBool,
    sinks: Mutex<Vec<StreamSink>>,
    urls: Mutex<Vec<String>>,
}

impl ManualConnector {
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn fail_next_open(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn last_sink(&self) -> StreamSink {
        self.sinks.lock().unwrap().last().cloned().unwrap()
    }

    pub fn last_url(&self) -> String {
        self.urls.lock().unwrap().last().cloned().unwrap()
    }
}

impl StreamConnector for ManualConnector {
    fn open(&self, url: &Url, sink: StreamSink) -> Result<JoinHandle<()>, StreamError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StreamError::Connect("refused".to_string()));
        }
        self.urls.lock().unwrap().push(url.to_string());
        self.sinks.lock().unwrap().push(sink);
        Ok(tokio::spawn(std::future::pending::<()>()))
    }
}
