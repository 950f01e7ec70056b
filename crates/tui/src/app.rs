//! TUI application loop — the ratatui event loop for an interactive chat.

use std::io;
use std::time::Duration;

use crossterm::event::{
    self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
    EnableFocusChange, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::{Frame, Terminal};

use jide_client::{ChatSession, ClientEvent, LinkActivation, SessionParts};
use jide_core::{ClientConfig, SessionId};
use tracing::{debug, info};

use super::*;

type ChatTerminal = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run_chat_tui(
    config: ClientConfig,
    session_id: SessionId,
    parts: SessionParts,
) -> io::Result<()> {
    let tick = Duration::from_millis(config.ui.tick_ms.max(1));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut session = ChatSession::new(config, session_id, TerminalView::new(), parts);
    session.init();
    let result = chat_loop(&mut terminal, &mut session, tick).await;
    session.dispose();
    info!("terminal chat closed");

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    result
}

async fn chat_loop(
    terminal: &mut ChatTerminal,
    session: &mut ChatSession<TerminalView>,
    tick: Duration,
) -> io::Result<()> {
    let theme = TuiTheme::default_dark();
    let session_label = session.session_id().to_string();

    loop {
        session.drain();

        let autoscroll_paused = session.is_autoscroll_suppressed();
        let view = session.view_mut();
        terminal.draw(|f| draw_chat(f, view, &session_label, autoscroll_paused, &theme))?;

        if event::poll(tick)? {
            let terminal_event = event::read()?;
            let view = session.view_mut();
            let line_count = view.line_count();
            let action = map_terminal_event(
                &terminal_event,
                view.input_visible,
                view.stop_visible,
                &mut view.session_view,
                line_count,
            );
            if let Some(action) = action
                && apply_tui_action(action, session)
            {
                return Ok(());
            }
        }

        tokio::task::yield_now().await;
    }
}

/// Applies one action. Returns `true` when the user asked to quit.
pub fn apply_tui_action(action: TuiAction, session: &mut ChatSession<TerminalView>) -> bool {
    match action {
        TuiAction::Quit => return true,
        TuiAction::Submit => {
            let text = session.view().input.clone();
            session.handle(ClientEvent::Submit(text));
        }
        TuiAction::InsertChar(ch) => session.view_mut().input.push(ch),
        TuiAction::InsertNewline => session.view_mut().input.push('\n'),
        TuiAction::Paste(text) => session.view_mut().input.push_str(&text),
        TuiAction::Backspace => {
            session.view_mut().input.pop();
        }
        TuiAction::Stop => session.handle(ClientEvent::StopPressed),
        TuiAction::Scrolled => {}
        TuiAction::Wheel(metrics) => session.handle(ClientEvent::Wheel(metrics)),
        TuiAction::Click { row, secondary } => {
            let view = session.view();
            let scroll = effective_log_scroll(view.line_count(), &view.session_view);
            if let Some(href) = view.link_at_row(row, scroll).map(str::to_string) {
                debug!(%href, secondary, "link clicked");
                let activation = LinkActivation::new(href, secondary);
                session.handle(ClientEvent::LinkActivated(activation));
            }
        }
        TuiAction::FocusGained => session.handle(ClientEvent::HostShown),
        TuiAction::FocusLost => session.handle(ClientEvent::HostHidden),
    }
    false
}

pub fn draw_chat(
    f: &mut Frame<'_>,
    view: &mut TerminalView,
    session_label: &str,
    autoscroll_paused: bool,
    theme: &TuiTheme,
) {
    let il = input_line_count(&view.input);
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(tui_layout_constraints(view.input_visible, il))
        .split(f.area());

    // [0] Title bar
    let title_bar = build_title_bar(view.status, view.project.as_deref(), session_label, theme);
    f.render_widget(
        Paragraph::new(title_bar).style(Style::default().bg(Color::Rgb(30, 30, 30))),
        areas[0],
    );

    // [1] Conversation body
    let body_block = Block::default()
        .title(Span::styled(
            " Conversation ",
            Style::default().fg(theme.primary),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_normal));
    let inner = body_block.inner(areas[1]);
    view.session_view.body_height = (inner.height as usize).max(1);
    view.body_top = inner.y;
    // one column is kept free for the scrollbar
    let width = (inner.width as usize).saturating_sub(1).max(1);
    if width != view.body_width {
        view.relayout(width, theme);
    }
    let line_count = view.line_count();
    let scroll = effective_log_scroll(line_count, &view.session_view);
    let lines: Vec<Line<'static>> = view
        .transcript
        .iter()
        .skip(scroll)
        .take(view.session_view.body_height)
        .map(|row| row.line.clone())
        .collect();
    f.render_widget(Paragraph::new(Text::from(lines)).block(body_block), areas[1]);
    if line_count > view.session_view.body_height {
        let mut scrollbar_state = ScrollbarState::new(line_count).position(scroll);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .thumb_style(Style::default().fg(theme.text_muted));
        f.render_stateful_widget(scrollbar, areas[1], &mut scrollbar_state);
    }

    // [2] Status / hint bar
    let hint_line = build_status_hint_bar(
        view.input_visible,
        view.stop_visible,
        view.stop_loading,
        autoscroll_paused,
        theme,
    );
    f.render_widget(
        Paragraph::new(hint_line).style(Style::default().bg(Color::Rgb(25, 25, 25))),
        areas[2],
    );

    // [3] Input area (multiline), absent while a turn runs
    if view.input_visible && areas.len() > 3 {
        let input_area = areas[3];
        let multiline_hint = if view.input.contains('\n') {
            " (multiline) "
        } else {
            ""
        };
        let input_block = Block::default()
            .title(Span::styled(
                format!(" > {}", multiline_hint),
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border_active));
        let input_lines: Vec<Line<'_>> = view
            .input
            .split('\n')
            .map(|l| Line::from(l.to_string()))
            .collect();
        f.render_widget(
            Paragraph::new(Text::from(input_lines)).block(input_block),
            input_area,
        );
        // Cursor at end of last line
        let last_line = view.input.rsplit('\n').next().unwrap_or(&view.input);
        let cursor_line_offset = view.input.chars().filter(|c| *c == '\n').count() as u16;
        let x = input_area.x + 1 + last_line.chars().count() as u16;
        let y = input_area.y + 1 + cursor_line_offset.min(input_area.height.saturating_sub(3));
        f.set_cursor_position((x, y));
    }
}
