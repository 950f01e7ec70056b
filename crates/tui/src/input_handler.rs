//! Input Handler — key, mouse and focus mapping for the chat screen.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use jide_client::ScrollMetrics;

use super::{TUI_SCROLL_STEP, TuiSessionViewState, calc_log_scroll_usize, effective_log_scroll};

/// What a terminal event asks the chat screen to do.
#[derive(Debug, Clone, PartialEq)]
pub enum TuiAction {
    Submit,
    InsertChar(char),
    InsertNewline,
    Paste(String),
    Backspace,
    Stop,
    Quit,
    /// Keyboard scroll, already applied to the view state.
    Scrolled,
    /// Wheel scroll, already applied; carries the resulting position.
    Wheel(ScrollMetrics),
    /// Left click on a body row.
    Click { row: u16, secondary: bool },
    FocusGained,
    FocusLost,
}

pub fn key_is_ctrl_char(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&ch))
}

/// Maps a key press. Editing keys only apply while the input is shown;
/// Esc stops a running turn.
pub fn map_key_event(
    key: &KeyEvent,
    input_visible: bool,
    stop_visible: bool,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> Option<TuiAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key_is_ctrl_char(key, 'c') {
        return Some(TuiAction::Quit);
    }
    if key_is_ctrl_char(key, 's') || (key.code == KeyCode::Esc && stop_visible) {
        return stop_visible.then_some(TuiAction::Stop);
    }
    if handle_session_scroll_key(key, session_view, log_count) {
        return Some(TuiAction::Scrolled);
    }
    if !input_visible {
        return None;
    }

    match key.code {
        KeyCode::Enter
            if key.modifiers.contains(KeyModifiers::SHIFT)
                || key.modifiers.contains(KeyModifiers::ALT) =>
        {
            Some(TuiAction::InsertNewline)
        }
        KeyCode::Enter => Some(TuiAction::Submit),
        KeyCode::Backspace => Some(TuiAction::Backspace),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TuiAction::InsertChar(ch))
        }
        _ => None,
    }
}

pub fn map_terminal_event(
    event: &Event,
    input_visible: bool,
    stop_visible: bool,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> Option<TuiAction> {
    match event {
        Event::Key(key) => map_key_event(key, input_visible, stop_visible, session_view, log_count),
        Event::Mouse(mouse) => map_mouse_event(mouse, session_view, log_count),
        Event::FocusGained => Some(TuiAction::FocusGained),
        Event::FocusLost => Some(TuiAction::FocusLost),
        Event::Paste(text) if input_visible => Some(TuiAction::Paste(text.clone())),
        _ => None,
    }
}

pub fn map_mouse_event(
    mouse: &MouseEvent,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> Option<TuiAction> {
    if handle_session_scroll_mouse(mouse, session_view, log_count) {
        return Some(TuiAction::Wheel(scroll_metrics(session_view, log_count)));
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(TuiAction::Click {
            row: mouse.row,
            secondary: mouse.modifiers.contains(KeyModifiers::CONTROL),
        }),
        _ => None,
    }
}

/// Viewport position in rendered lines, as seen by scroll suppression.
pub fn scroll_metrics(session_view: &TuiSessionViewState, log_count: usize) -> ScrollMetrics {
    ScrollMetrics::new(
        effective_log_scroll(log_count, session_view) as f64,
        session_view.body_height as f64,
        log_count as f64,
    )
}

pub fn move_session_scroll(session_view: &mut TuiSessionViewState, log_count: usize, delta: isize) {
    let max_scroll = calc_log_scroll_usize(log_count, session_view.body_height);
    let current = effective_log_scroll(log_count, session_view) as isize;
    let next = (current + delta).clamp(0, max_scroll as isize) as usize;
    session_view.scroll_offset = next;
    session_view.auto_follow = next >= max_scroll;
}

pub fn handle_session_scroll_key(
    key: &KeyEvent,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> bool {
    let page = (session_view.body_height / 2).max(1) as isize;
    match key.code {
        KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
            move_session_scroll(session_view, log_count, -1);
            true
        }
        KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
            move_session_scroll(session_view, log_count, 1);
            true
        }
        KeyCode::PageUp => {
            move_session_scroll(session_view, log_count, -page);
            true
        }
        KeyCode::PageDown => {
            move_session_scroll(session_view, log_count, page);
            true
        }
        _ => false,
    }
}

pub fn handle_session_scroll_mouse(
    mouse: &MouseEvent,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> bool {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            move_session_scroll(session_view, log_count, -(TUI_SCROLL_STEP as isize));
            true
        }
        MouseEventKind::ScrollDown => {
            move_session_scroll(session_view, log_count, TUI_SCROLL_STEP as isize);
            true
        }
        _ => false,
    }
}
