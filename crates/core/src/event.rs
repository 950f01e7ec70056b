//! Push-channel events.
//!
//! Every event arrives as one JSON object `{type, message?, timestamp?}`.
//! Unknown or missing `type` values fall into [`EventKind::Text`], which
//! renders as plain bot text.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{EventParseError, MessageCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Status,
    End,
    Error,
    Warning,
    Heartbeat,
    Markdown,
    Html,
    /// Unclassified assistant text.
    Text,
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "status" => Self::Status,
            "end" => Self::End,
            "error" => Self::Error,
            "warning" => Self::Warning,
            "heartbeat" => Self::Heartbeat,
            "markdown" => Self::Markdown,
            "html" => Self::Html,
            _ => Self::Text,
        }
    }

    /// Display category for kinds that append to the log.
    ///
    /// `status` and `heartbeat` never render; `end` renders as `finished`.
    pub fn display_category(self) -> Option<MessageCategory> {
        match self {
            Self::Status | Self::Heartbeat => None,
            Self::End => Some(MessageCategory::Finished),
            Self::Error => Some(MessageCategory::Error),
            Self::Warning => Some(MessageCategory::Warning),
            Self::Markdown => Some(MessageCategory::Markdown),
            Self::Html => Some(MessageCategory::Html),
            Self::Text => Some(MessageCategory::Bot),
        }
    }

    /// Whether an event of this kind, seen last before `end`, marks the turn
    /// as failed. `None` for kinds that carry no outcome.
    pub fn turn_outcome(self) -> Option<bool> {
        match self {
            Self::Error | Self::Warning => Some(false),
            Self::Markdown | Self::Html | Self::Text => Some(true),
            Self::Status | Self::Heartbeat | Self::End => None,
        }
    }
}

/// Fields are loosely typed so one odd value never drops the whole event.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    role: Option<Value>,
}

/// Strings pass through, `null` is absent, anything else keeps its JSON text.
fn value_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// One decoded push-channel event.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEvent {
    pub kind: EventKind,
    pub message: Option<String>,
    /// Unix epoch seconds, fractional part allowed.
    pub timestamp: Option<f64>,
    pub role: Option<String>,
}

impl ServerEvent {
    pub fn new(kind: EventKind, message: Option<&str>) -> Self {
        Self {
            kind,
            message: message.map(str::to_string),
            timestamp: None,
            role: None,
        }
    }

    pub fn parse(data: &str) -> Result<Self, EventParseError> {
        let raw: RawEvent = serde_json::from_str(data)?;
        let kind = match raw.kind {
            Some(Value::String(tag)) => EventKind::from_tag(&tag),
            _ => EventKind::Text,
        };
        Ok(Self {
            kind,
            message: value_text(raw.message),
            timestamp: raw.timestamp.as_ref().and_then(Value::as_f64),
            role: value_text(raw.role),
        })
    }

    pub fn message_or_empty(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(epoch_seconds_to_utc)
    }
}

pub fn epoch_seconds_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(whole, nanos)
}
