//! Wire contracts with the backend and the embedding host.

use serde::{Deserialize, Serialize};

use crate::SessionId;

pub const STATUS_SUCCESS: &str = "success";

/// Marker that turns an in-message link into a host command.
pub const COMMAND_MARKER: &str = "#call:";

/// Separator between a host action and its arguments.
pub const HOST_ARG_SEPARATOR: &str = "//";

pub const OPEN_FILE_ACTION: &str = "jide_open_file";
pub const OPEN_DIFF_FILE_ACTION: &str = "jide_open_diff_file";
pub const STATUS_ACTION: &str = "jide_status";

/// Body of `POST /send_message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    pub session_id: SessionId,
}

/// Body of `POST /control`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub command: ControlCommand,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Stop,
}

impl ControlCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
        }
    }
}

/// Response of both backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Text rendered when the backend rejects a request.
    pub fn rejection_text(&self) -> String {
        format!("Error: {}", self.message.as_deref().unwrap_or("unknown error"))
    }
}

/// A host action with its arguments, encoded as `action//arg1//arg2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub action: String,
    pub args: Vec<String>,
}

impl HostCommand {
    pub fn new(action: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            action: action.into(),
            args,
        }
    }

    /// Splits an encoded request. Returns `None` for an empty action.
    pub fn decode(encoded: &str) -> Option<Self> {
        let mut parts = encoded.split(HOST_ARG_SEPARATOR);
        let action = parts.next()?.trim();
        if action.is_empty() {
            return None;
        }
        Some(Self {
            action: action.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }

    pub fn encode(&self) -> String {
        let mut out = self.action.clone();
        for arg in &self.args {
            out.push_str(HOST_ARG_SEPARATOR);
            out.push_str(arg);
        }
        out
    }

    /// Status notification forwarded to an embedding host.
    pub fn status(indicator: StatusIndicator) -> Self {
        Self::new(
            STATUS_ACTION,
            vec![
                indicator.label().to_string(),
                indicator.class_name().to_string(),
            ],
        )
    }
}

/// Connection status shown in the title bar (or forwarded to the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusIndicator {
    Connected,
    ConnectionError,
    FailedToConnect,
    SendError,
}

impl StatusIndicator {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::ConnectionError => "Connection Error",
            Self::FailedToConnect => "Failed to Connect",
            Self::SendError => "Send Error",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::ConnectionError | Self::FailedToConnect | Self::SendError => "disconnected",
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_request_wire_shape() {
        let req = SendMessageRequest {
            message: "hello".to_string(),
            session_id: SessionId::new("abc").unwrap(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, serde_json::json!({"message": "hello", "session_id": "abc"}));
    }

    #[test]
    fn test_control_request_wire_shape() {
        let req = ControlRequest {
            command: ControlCommand::Stop,
            session_id: SessionId::new("abc").unwrap(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, serde_json::json!({"command": "stop", "session_id": "abc"}));
    }

    #[test]
    fn test_api_response_success_sentinel() {
        let ok: ApiResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(ok.is_success());
        let err: ApiResponse =
            serde_json::from_str(r#"{"status":"error","message":"Session is locked"}"#).unwrap();
        assert!(!err.is_success());
        assert_eq!(err.rejection_text(), "Error: Session is locked");
        let odd: ApiResponse = serde_json::from_str(r#"{"status":"SUCCESS"}"#).unwrap();
        assert!(!odd.is_success());
    }

    #[test]
    fn test_host_command_decode_and_encode() {
        let cmd = HostCommand::decode("jide_open_file//src/main.rs///tmp/cache.txt").unwrap();
        assert_eq!(cmd.action, OPEN_FILE_ACTION);
        assert_eq!(cmd.args, vec!["src/main.rs", "/tmp/cache.txt"]);
        assert_eq!(cmd.encode(), "jide_open_file//src/main.rs///tmp/cache.txt");
        assert!(HostCommand::decode("").is_none());
        assert!(HostCommand::decode("//x").is_none());
    }

    #[test]
    fn test_status_host_command() {
        let cmd = HostCommand::status(StatusIndicator::ConnectionError);
        assert_eq!(cmd.encode(), "jide_status//Connection Error//disconnected");
    }
}
