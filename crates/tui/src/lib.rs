//! JIDE TUI — Terminal User Interface for the JIDE chat client.
//!
//! This crate provides the ratatui-based chat screen. It renders whatever
//! the `jide-client` session pushes through the `ChatView` seam and turns
//! terminal input into session events.

mod app;
mod chat_renderer;
mod input_handler;
mod layout_manager;
mod view;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use app::*;
pub use chat_renderer::*;
pub use input_handler::*;
pub use layout_manager::*;
pub use view::*;
