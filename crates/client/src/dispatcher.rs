//! Command links embedded in messages, and the typed stop sentinel.

use jide_core::{COMMAND_MARKER, HostCommand, OPEN_DIFF_FILE_ACTION, OPEN_FILE_ACTION};

/// Substring that marks a host answer as a soft failure.
pub const SOFT_ERROR_MARKER: &str = "error:";

/// A click on a link inside a rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkActivation {
    pub href: String,
    /// Ctrl/Cmd was held.
    pub secondary: bool,
}

impl LinkActivation {
    pub fn new(href: impl Into<String>, secondary: bool) -> Self {
        Self {
            href: href.into(),
            secondary,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    stop_sentinel: Option<String>,
}

impl CommandDispatcher {
    pub fn new(stop_sentinel: Option<String>) -> Self {
        Self {
            stop_sentinel: stop_sentinel.filter(|s| !s.trim().is_empty()),
        }
    }

    /// The host command behind a link, if it is a command link. With the
    /// secondary modifier, opening a file becomes opening its diff.
    pub fn resolve_link(&self, activation: &LinkActivation) -> Option<HostCommand> {
        let (_, encoded) = activation.href.split_once(COMMAND_MARKER)?;
        let mut command = HostCommand::decode(encoded)?;
        if activation.secondary && command.action == OPEN_FILE_ACTION {
            command.action = OPEN_DIFF_FILE_ACTION.to_string();
        }
        Some(command)
    }

    /// Whether submitted text is the stop sentinel rather than a message.
    pub fn is_stop_request(&self, input: &str) -> bool {
        self.stop_sentinel
            .as_deref()
            .is_some_and(|sentinel| input.trim() == sentinel)
    }
}

/// A successful host answer that still reports a failure.
pub fn is_soft_error(answer: &str) -> bool {
    answer.contains(SOFT_ERROR_MARKER)
}
