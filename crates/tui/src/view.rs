//! Terminal presentation state behind the session's view seam.

use jide_client::ChatView;
use jide_core::{DisplayMessage, StatusIndicator};

use super::{
    ChatEntry, TranscriptLine, TuiSessionViewState, TuiTheme, push_chat_entry, style_chat_entries,
};

#[derive(Debug)]
pub struct TerminalView {
    pub entries: Vec<ChatEntry>,
    pub input: String,
    pub input_visible: bool,
    pub stop_visible: bool,
    pub stop_loading: bool,
    pub status: Option<StatusIndicator>,
    pub project: Option<String>,
    pub session_view: TuiSessionViewState,
    /// Rows of the last render, used to resolve clicks.
    pub transcript: Vec<TranscriptLine>,
    /// Screen row of the first body line in the last render.
    pub body_top: u16,
    pub body_width: usize,
}

impl Default for TerminalView {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            input: String::new(),
            input_visible: true,
            stop_visible: false,
            stop_loading: false,
            status: None,
            project: None,
            session_view: TuiSessionViewState::default(),
            transcript: Vec::new(),
            body_top: 0,
            body_width: 80,
        }
    }
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-renders the transcript for the given body width.
    pub fn relayout(&mut self, width: usize, theme: &TuiTheme) {
        self.body_width = width.max(1);
        self.transcript = style_chat_entries(&self.entries, theme, self.body_width);
    }

    pub fn line_count(&self) -> usize {
        self.transcript.len()
    }

    /// Link under a screen row of the body, given the current scroll.
    pub fn link_at_row(&self, row: u16, scroll: usize) -> Option<&str> {
        let offset = row.checked_sub(self.body_top)? as usize;
        if offset >= self.session_view.body_height {
            return None;
        }
        self.transcript.get(scroll + offset)?.link.as_deref()
    }
}

impl ChatView for TerminalView {
    fn set_input_visible(&mut self, visible: bool) {
        self.input_visible = visible;
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn set_stop_visible(&mut self, visible: bool) {
        self.stop_visible = visible;
    }

    fn set_stop_loading(&mut self, loading: bool) {
        self.stop_loading = loading;
    }

    fn clear_log(&mut self) {
        self.entries.clear();
        self.transcript.clear();
        self.session_view.scroll_offset = 0;
    }

    fn append_message(&mut self, message: &DisplayMessage) {
        push_chat_entry(&mut self.entries, ChatEntry::from_message(message));
        let theme = TuiTheme::default_dark();
        self.relayout(self.body_width, &theme);
    }

    fn scroll_to_bottom(&mut self) {
        self.session_view.auto_follow = true;
    }

    fn set_connection_status(&mut self, status: &StatusIndicator) {
        self.status = Some(*status);
    }

    fn set_project_status(&mut self, text: &str) {
        self.project = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jide_core::{MessageBody, MessageCategory, message_classes};

    fn html_message(body: &str) -> DisplayMessage {
        DisplayMessage {
            category: MessageCategory::Html,
            classes: message_classes(MessageCategory::Html),
            body: MessageBody::Html(body.to_string()),
            timestamp: None,
        }
    }

    #[test]
    fn test_append_does_not_move_pinned_viewport() {
        let mut view = TerminalView::new();
        view.session_view.auto_follow = false;
        view.session_view.scroll_offset = 2;
        view.append_message(&html_message("<p>hello</p>"));
        assert!(!view.session_view.auto_follow);
        assert_eq!(view.session_view.scroll_offset, 2);

        view.scroll_to_bottom();
        assert!(view.session_view.auto_follow);
    }

    #[test]
    fn test_link_at_row_maps_screen_rows() {
        let mut view = TerminalView::new();
        view.body_top = 3;
        view.session_view.body_height = 10;
        view.append_message(&html_message(
            r##"<p>open <a href="#call:jide_open_file//a.rs">a.rs</a></p>"##,
        ));
        // header, body, link row, spacer
        assert_eq!(view.line_count(), 4);
        assert_eq!(view.link_at_row(5, 0), Some("#call:jide_open_file//a.rs"));
        assert_eq!(view.link_at_row(4, 0), None);
        assert_eq!(view.link_at_row(1, 0), None);
        assert_eq!(view.link_at_row(4, 1), Some("#call:jide_open_file//a.rs"));
    }

    #[test]
    fn test_clear_log_resets_transcript() {
        let mut view = TerminalView::new();
        view.append_message(&html_message("<p>x</p>"));
        view.clear_log();
        assert!(view.entries.is_empty());
        assert_eq!(view.line_count(), 0);
    }
}
