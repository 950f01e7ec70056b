//! Display messages and the display log.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Visual category of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    User,
    Bot,
    Markdown,
    Html,
    Error,
    Warning,
    Finished,
}

impl MessageCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Finished => "finished",
        }
    }
}

/// Class list attached to a rendered message.
///
/// User messages take the `html` render path and carry `user-message` only
/// as a modifier on top of `html-message`.
pub fn message_classes(category: MessageCategory) -> Vec<String> {
    match category {
        MessageCategory::User => vec![
            "message".to_string(),
            "html-message".to_string(),
            "user-message".to_string(),
        ],
        other => vec!["message".to_string(), format!("{}-message", other.as_str())],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Plain text; the view must not interpret markup in it.
    Text(String),
    /// Markup inserted as-is.
    Html(String),
}

impl MessageBody {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Html(s) => s,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Self::Html(_))
    }
}

/// A rendered unit in the log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMessage {
    pub category: MessageCategory,
    pub classes: Vec<String>,
    pub body: MessageBody,
    pub timestamp: Option<DateTime<Utc>>,
}

impl DisplayMessage {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Local time-of-day shown beneath the message.
    pub fn time_label(&self) -> Option<String> {
        self.timestamp
            .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
    }
}

/// Messages of the current turn. Cleared wholesale when a new turn begins.
#[derive(Debug, Clone, Default)]
pub struct DisplayLog {
    messages: Vec<DisplayMessage>,
}

impl DisplayLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: DisplayMessage) -> &DisplayMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&DisplayMessage> {
        self.messages.last()
    }
}
