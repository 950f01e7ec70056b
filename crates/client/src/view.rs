//! Presentation seam.

use jide_core::{DisplayMessage, StatusIndicator};

/// Everything the session needs from a presentation surface.
///
/// Implementations only render; they never call back into the session.
/// User input reaches the session as [`ClientEvent`](crate::ClientEvent)s.
pub trait ChatView {
    fn set_input_visible(&mut self, visible: bool);
    fn clear_input(&mut self);
    fn set_stop_visible(&mut self, visible: bool);
    /// Loading decoration on the stop control while a stop is in flight.
    fn set_stop_loading(&mut self, loading: bool);
    fn clear_log(&mut self);
    fn append_message(&mut self, message: &DisplayMessage);
    fn scroll_to_bottom(&mut self);
    fn set_connection_status(&mut self, status: &StatusIndicator);
    /// The project line pushed by the server's `status` event.
    fn set_project_status(&mut self, text: &str);
}
