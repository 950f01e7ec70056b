//! Turns event payloads into display messages.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jide_core::{DisplayLog, DisplayMessage, MessageBody, MessageCategory, message_classes};
use pulldown_cmark::{Options, Parser, html};

use crate::view::ChatView;

/// Markdown to HTML conversion.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

/// CommonMark with tables, strikethrough and task lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMarkRenderer;

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, source: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        let parser = Parser::new_ext(source, options);
        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Builds display messages, keeps the log and pushes each message to the view.
pub struct MessageRenderer {
    markdown: Arc<dyn MarkdownRenderer>,
    log: DisplayLog,
}

impl MessageRenderer {
    pub fn new(markdown: Arc<dyn MarkdownRenderer>) -> Self {
        Self {
            markdown,
            log: DisplayLog::new(),
        }
    }

    pub fn log(&self) -> &DisplayLog {
        &self.log
    }

    /// Body rules: user text is escaped and kept preformatted, markdown is
    /// converted, html is inserted as given, anything else is plain text.
    pub fn build(
        &self,
        message: &str,
        category: MessageCategory,
        timestamp: Option<DateTime<Utc>>,
    ) -> DisplayMessage {
        let body = match category {
            MessageCategory::User => MessageBody::Html(format!("<pre>{}</pre>", escape_html(message))),
            MessageCategory::Markdown => MessageBody::Html(self.markdown.render(message)),
            MessageCategory::Html => MessageBody::Html(message.to_string()),
            _ => MessageBody::Text(message.to_string()),
        };
        DisplayMessage {
            category,
            classes: message_classes(category),
            body,
            timestamp,
        }
    }

    pub fn append(
        &mut self,
        message: &str,
        category: MessageCategory,
        timestamp: Option<DateTime<Utc>>,
        autoscroll: bool,
        view: &mut dyn ChatView,
    ) -> &DisplayMessage {
        let display = self.build(message, category, timestamp);
        view.append_message(&display);
        if autoscroll {
            view.scroll_to_bottom();
        }
        self.log.push(display)
    }

    pub fn clear(&mut self, view: &mut dyn ChatView) {
        self.log.clear();
        view.clear_log();
    }
}
