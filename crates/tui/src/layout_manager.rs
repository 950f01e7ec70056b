//! Layout Manager — TUI layout calculation and the title/hint bars.

use ratatui::layout::Constraint;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use jide_core::StatusIndicator;

use super::TuiTheme;

pub const TUI_SCROLL_STEP: usize = 3;

#[derive(Debug, Clone)]
pub struct TuiSessionViewState {
    pub scroll_offset: usize,
    pub auto_follow: bool,
    pub body_height: usize,
}

impl Default for TuiSessionViewState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            auto_follow: true,
            body_height: 1,
        }
    }
}

pub fn short_session_id(value: &str) -> String {
    let max = 12usize;
    if value.chars().count() <= max {
        return value.to_string();
    }
    let prefix = value.chars().take(max).collect::<String>();
    format!("{}…", prefix)
}

/// Title bar: product name, project line, session and connection status.
pub fn build_title_bar<'a>(
    status: Option<StatusIndicator>,
    project: Option<&str>,
    session_id: &str,
    theme: &TuiTheme,
) -> Line<'a> {
    let (status_text, status_color) = match status {
        Some(s) if s.is_connected() => (s.label(), theme.success),
        Some(s) => (s.label(), theme.danger),
        None => ("Connecting…", theme.text_muted),
    };

    Line::from(vec![
        Span::styled(
            " JIDE ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ", Style::default()),
        Span::styled(
            project.unwrap_or("-").to_string(),
            Style::default().fg(theme.primary),
        ),
        Span::styled(
            format!("  {}  ", short_session_id(session_id)),
            Style::default().fg(theme.text_dim),
        ),
        Span::styled(status_text.to_string(), Style::default().fg(status_color)),
    ])
}

pub fn build_status_hint_bar<'a>(
    input_visible: bool,
    stop_visible: bool,
    stop_loading: bool,
    autoscroll_paused: bool,
    theme: &TuiTheme,
) -> Line<'a> {
    let mut spans: Vec<Span<'a>> = vec![Span::raw(" ")];
    // first, so narrow terminals never cut it off
    if autoscroll_paused {
        spans.push(Span::styled(
            "(auto-scroll paused)",
            Style::default()
                .fg(theme.warning)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("  "));
    }
    if stop_visible {
        let (label, color) = if stop_loading {
            ("[stopping…]", theme.warning)
        } else {
            ("[Ctrl+S stop]", theme.danger)
        };
        spans.push(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("  "));
    }
    if input_visible {
        spans.push(Span::styled(
            "Enter send · Alt+Enter newline",
            Style::default().fg(theme.text_muted),
        ));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        "PgUp/PgDn scroll · click [n] links · Ctrl+C quit",
        Style::default().fg(theme.text_dim),
    ));
    Line::from(spans)
}

pub fn input_line_count(input: &str) -> u16 {
    let lines = input.chars().filter(|c| *c == '\n').count() as u16 + 1;
    lines.clamp(1, 4)
}

/// Title, body, hint bar, and the input box when it is shown.
pub fn tui_layout_constraints(input_visible: bool, input_lines: u16) -> Vec<Constraint> {
    let mut c = vec![Constraint::Length(1), Constraint::Min(5), Constraint::Length(1)];
    if input_visible {
        c.push(Constraint::Length(input_lines + 2));
    }
    c
}

pub fn calc_log_scroll_usize(log_count: usize, body_height: usize) -> usize {
    log_count.saturating_sub(body_height)
}

pub fn effective_log_scroll(log_count: usize, session_view: &TuiSessionViewState) -> usize {
    let max_scroll = calc_log_scroll_usize(log_count, session_view.body_height);
    if session_view.auto_follow {
        max_scroll
    } else {
        session_view.scroll_offset.min(max_scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::line_plain;

    #[test]
    fn test_short_session_id() {
        assert_eq!(short_session_id("abc"), "abc");
        assert_eq!(
            short_session_id("ba7816bf8f01cfea414140de5dae2223"),
            "ba7816bf8f01…"
        );
    }

    #[test]
    fn test_title_bar_shows_status_label() {
        let theme = TuiTheme::default_dark();
        let line = build_title_bar(
            Some(StatusIndicator::FailedToConnect),
            Some("/home/me/project"),
            "sess",
            &theme,
        );
        let text = line_plain(&line);
        assert!(text.contains("/home/me/project"));
        assert!(text.contains("Failed to Connect"));

        let pending = line_plain(&build_title_bar(None, None, "sess", &theme));
        assert!(pending.contains("Connecting"));
    }

    #[test]
    fn test_hint_bar_leads_with_paused_indicator() {
        let theme = TuiTheme::default_dark();
        let text = line_plain(&build_status_hint_bar(true, false, false, true, &theme));
        assert!(text.starts_with(" (auto-scroll paused)"));

        let text = line_plain(&build_status_hint_bar(true, false, false, false, &theme));
        assert!(!text.contains("auto-scroll paused"));
        assert!(text.starts_with(" Enter send"));
    }

    #[test]
    fn test_layout_drops_input_row_when_hidden() {
        assert_eq!(tui_layout_constraints(true, 1).len(), 4);
        assert_eq!(tui_layout_constraints(false, 1).len(), 3);
        assert_eq!(input_line_count("a\nb\nc\nd\ne"), 4);
    }

    #[test]
    fn test_effective_log_scroll() {
        let mut view = TuiSessionViewState {
            scroll_offset: 3,
            auto_follow: false,
            body_height: 10,
        };
        assert_eq!(effective_log_scroll(30, &view), 3);
        view.scroll_offset = 99;
        assert_eq!(effective_log_scroll(30, &view), 20);
        view.auto_follow = true;
        assert_eq!(effective_log_scroll(30, &view), 20);
        assert_eq!(effective_log_scroll(5, &view), 0);
    }
}
