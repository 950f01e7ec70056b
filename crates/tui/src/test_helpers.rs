//! Shared test helpers for TUI sub-module tests.

use ratatui::buffer::Buffer;
use ratatui::text::Line;

use jide_core::{DisplayMessage, MessageBody, MessageCategory, message_classes};

pub fn line_plain(line: &Line<'_>) -> String {
    line.spans
        .iter()
        .map(|s| s.content.as_ref())
        .collect::<String>()
}

pub fn buffer_text(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

pub fn text_message(category: MessageCategory, body: &str) -> DisplayMessage {
    DisplayMessage {
        category,
        classes: message_classes(category),
        body: MessageBody::Text(body.to_string()),
        timestamp: None,
    }
}
