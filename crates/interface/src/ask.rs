//! One-shot mode: send a single message and print the reply.

use std::io::Write;
use std::time::Duration;

use jide_client::{ChannelState, ChatSession, ChatView, ClientEvent};
use jide_core::{DisplayMessage, MessageCategory, StatusIndicator};
use jide_tui::{ChatEntry, header_label};
use tracing::{debug, info, warn};

use crate::cli::CliError;

/// Headless view that writes every rendered message to `out`.
pub struct PrintView<W: Write> {
    out: W,
}

impl<W: Write> PrintView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    fn write_message(&mut self, message: &DisplayMessage) -> std::io::Result<()> {
        let entry = ChatEntry::from_message(message);
        let label = header_label(message.category);
        let prefix = format!("{label}:");
        let mut lines = entry.lines.iter();
        match lines.next() {
            // error bodies already carry their own "Error:" prefix
            Some(first) if first.starts_with(&prefix) => writeln!(self.out, "{first}")?,
            Some(first) => writeln!(self.out, "{prefix} {first}")?,
            None => writeln!(self.out, "{prefix}")?,
        }
        for line in lines {
            if line.is_empty() {
                writeln!(self.out)?;
            } else {
                writeln!(self.out, "  {line}")?;
            }
        }
        for link in &entry.links {
            writeln!(self.out, "  [{}] {}", link.index, link.href)?;
        }
        self.out.flush()
    }
}

impl<W: Write> ChatView for PrintView<W> {
    fn set_input_visible(&mut self, _visible: bool) {}

    fn clear_input(&mut self) {}

    fn set_stop_visible(&mut self, _visible: bool) {}

    fn set_stop_loading(&mut self, _loading: bool) {}

    fn clear_log(&mut self) {}

    fn append_message(&mut self, message: &DisplayMessage) {
        // the user's own text is echoed by the shell already
        if message.category == MessageCategory::User {
            return;
        }
        if let Err(e) = self.write_message(message) {
            warn!(error = %e, "failed to print message");
        }
    }

    fn scroll_to_bottom(&mut self) {}

    fn set_connection_status(&mut self, status: &StatusIndicator) {
        info!(status = status.label(), "connection status");
    }

    fn set_project_status(&mut self, text: &str) {
        debug!(project = text, "project status");
    }
}

/// Waits for the push channel, sends `message`, and runs the session until
/// the turn ends. Fails when the turn fails or `timeout` runs out first.
pub async fn run_ask<V: ChatView>(
    session: &mut ChatSession<V>,
    message: &str,
    timeout: Duration,
) -> Result<(), CliError> {
    let outcome = tokio::time::timeout(timeout, drive_turn(session, message)).await;
    session.dispose();
    match outcome {
        Ok(Some(true)) | Ok(None) => Ok(()),
        Ok(Some(false)) => Err(CliError::TurnFailed),
        Err(_) => Err(CliError::Timeout(timeout.as_secs())),
    }
}

async fn drive_turn<V: ChatView>(session: &mut ChatSession<V>, message: &str) -> Option<bool> {
    session.init();
    while session.channel_state() != ChannelState::Open {
        let event = session.next_event().await?;
        session.handle(event);
    }

    session.handle(ClientEvent::Submit(message.to_string()));
    while session.is_awaiting_reply() {
        let event = session.next_event().await?;
        session.handle(event);
    }
    session.last_turn_outcome()
}
