//! JIDE Client — the session/streaming state machine of the chat client.
//!
//! A [`ChatSession`] owns all mutable client state and is driven by a single
//! task feeding it [`ClientEvent`]s. Network calls, the push-channel reader
//! and timers run as spawned tasks that report back through the same event
//! channel, so session state is only ever touched from one place.
//!
//! Presentation is abstracted behind [`ChatView`]; the host application
//! behind [`HostBridge`]; the backend behind [`Backend`].

pub mod backend;
pub mod bridge;
pub mod dispatcher;
pub mod events;
pub mod lifecycle;
pub mod renderer;
pub mod scroll;
pub mod session;
pub mod sse;
pub mod stream;
pub mod view;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use backend::{Backend, BackendError, HttpBackend};
pub use bridge::{BridgeCall, BridgeFailure, DetachedHost, HostBridge, HttpHostBridge, TransportBridge};
pub use dispatcher::{CommandDispatcher, LinkActivation};
pub use events::{ClientEvent, EventReceiver, EventSender, event_channel};
pub use lifecycle::{ConversationLifecycle, ConversationState};
pub use renderer::{CommonMarkRenderer, MarkdownRenderer, MessageRenderer, escape_html};
pub use scroll::{ScrollMetrics, ScrollSuppression, WheelOutcome};
pub use session::{ChatSession, SessionParts, SetupError};
pub use sse::SseDecoder;
pub use stream::{
    ChannelState, HttpConnector, StreamConnection, StreamConnector, StreamError, StreamSignal,
    StreamSink,
};
pub use view::ChatView;
