//! Conversation lifecycle: whether a turn is in flight, and how the controls
//! look in each state.

use jide_core::EventKind;

use crate::view::ChatView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Default)]
pub struct ConversationLifecycle {
    state: ConversationState,
    last_outcome: Option<bool>,
}

impl ConversationLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConversationState::Active
    }

    /// Hides the input and shows the stop control.
    pub fn start(&mut self, view: &mut dyn ChatView) {
        view.set_input_visible(false);
        view.set_stop_visible(true);
        self.state = ConversationState::Active;
    }

    /// Restores the input. The input text is cleared only on success so a
    /// failed turn can be retried.
    pub fn end(&mut self, success: bool, view: &mut dyn ChatView) {
        view.set_stop_loading(false);
        view.set_stop_visible(false);
        view.set_input_visible(true);
        if success {
            view.clear_input();
        }
        view.scroll_to_bottom();
        self.state = ConversationState::Idle;
        self.last_outcome = None;
    }

    /// Records the outcome implied by a content event of the current turn.
    pub fn observe(&mut self, kind: EventKind) {
        if let Some(outcome) = kind.turn_outcome() {
            self.last_outcome = Some(outcome);
        }
    }

    pub fn clear_outcome(&mut self) {
        self.last_outcome = None;
    }

    /// Success of the turn as judged by its last content event. A turn with
    /// no content events counts as successful.
    pub fn inferred_success(&self) -> bool {
        self.last_outcome.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{RecordingView, ViewOp};

    #[test]
    fn test_start_hides_input_and_shows_stop() {
        let mut view = RecordingView::default();
        let mut lifecycle = ConversationLifecycle::new();
        lifecycle.start(&mut view);

        assert!(lifecycle.is_active());
        assert!(!view.input_visible);
        assert!(view.stop_visible);
    }

    #[test]
    fn test_end_success_clears_input() {
        let mut view = RecordingView::default();
        view.input = "draft".to_string();
        let mut lifecycle = ConversationLifecycle::new();
        lifecycle.start(&mut view);
        lifecycle.end(true, &mut view);

        assert_eq!(lifecycle.state(), ConversationState::Idle);
        assert!(view.input_visible);
        assert!(!view.stop_visible);
        assert!(!view.stop_loading);
        assert!(view.input.is_empty());
        assert_eq!(view.ops.last(), Some(&ViewOp::ScrollToBottom));
    }

    #[test]
    fn test_end_failure_keeps_input() {
        let mut view = RecordingView::default();
        view.input = "retry me".to_string();
        let mut lifecycle = ConversationLifecycle::new();
        lifecycle.start(&mut view);
        lifecycle.end(false, &mut view);

        assert!(view.input_visible);
        assert_eq!(view.input, "retry me");
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut view = RecordingView::default();
        let mut lifecycle = ConversationLifecycle::new();
        lifecycle.end(false, &mut view);
        lifecycle.end(false, &mut view);
        assert_eq!(lifecycle.state(), ConversationState::Idle);
        assert!(view.input_visible);
    }

    #[test]
    fn test_inferred_success_follows_last_content_event() {
        let mut lifecycle = ConversationLifecycle::new();
        assert!(lifecycle.inferred_success());

        lifecycle.observe(EventKind::Markdown);
        lifecycle.observe(EventKind::Error);
        lifecycle.observe(EventKind::Heartbeat);
        assert!(!lifecycle.inferred_success());

        lifecycle.observe(EventKind::Text);
        assert!(lifecycle.inferred_success());
    }
}
