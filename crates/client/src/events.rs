//! Events driving a [`ChatSession`](crate::ChatSession).

use std::time::Duration;

use jide_core::ApiResponse;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::BackendError;
use crate::bridge::{BridgeCall, BridgeFailure};
use crate::dispatcher::LinkActivation;
use crate::scroll::ScrollMetrics;
use crate::stream::StreamSignal;

#[derive(Debug)]
pub enum ClientEvent {
    // ── UI ──────────────────────────────────────────────────────────
    /// The user submitted the free-text input.
    Submit(String),
    /// The explicit stop control was pressed.
    StopPressed,
    LinkActivated(LinkActivation),
    /// Manual wheel scroll with the viewport position after the scroll.
    Wheel(ScrollMetrics),

    // ── Host lifecycle ──────────────────────────────────────────────
    HostShown,
    HostHidden,

    // ── Completions ─────────────────────────────────────────────────
    Stream {
        generation: u64,
        signal: StreamSignal,
    },
    ReconnectDue,
    SuppressionExpired {
        generation: u64,
    },
    MessageSent(Result<ApiResponse, BackendError>),
    ControlSent(Result<ApiResponse, BackendError>),
    BridgeResolved {
        call: BridgeCall,
        result: Result<String, BridgeFailure>,
    },
}

pub type EventSender = mpsc::UnboundedSender<ClientEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Delivers `event` after `delay`. Aborting the handle cancels delivery.
pub(crate) fn schedule(events: &EventSender, delay: Duration, event: ClientEvent) -> JoinHandle<()> {
    let events = events.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = events.send(event);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_schedule_delivers_after_delay() {
        let (tx, mut rx) = event_channel();
        let _handle = schedule(&tx, Duration::from_secs(3), ClientEvent::ReconnectDue);

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(matches!(rx.recv().await, Some(ClientEvent::ReconnectDue)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_schedule_never_delivers() {
        let (tx, mut rx) = event_channel();
        let handle = schedule(&tx, Duration::from_secs(1), ClientEvent::ReconnectDue);
        handle.abort();

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
