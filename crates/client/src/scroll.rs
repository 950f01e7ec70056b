//! Auto-scroll suppression while the user reads back through the log.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::{ClientEvent, EventSender, schedule};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Offset of the first visible line.
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_top,
            viewport_height,
            document_height,
        }
    }

    /// How far down the document the bottom of the viewport is. An empty
    /// document counts as fully scrolled.
    pub fn fraction(&self) -> f64 {
        if self.document_height <= 0.0 {
            return 1.0;
        }
        (self.scroll_top + self.viewport_height) / self.document_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelOutcome {
    Resumed,
    Suppressed,
}

pub struct ScrollSuppression {
    threshold: f64,
    window: Duration,
    suppressed: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl ScrollSuppression {
    pub fn new(threshold: f64, window: Duration) -> Self {
        Self {
            threshold,
            window,
            suppressed: false,
            generation: 0,
            timer: None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Near the bottom auto-scroll resumes at once. Otherwise it is
    /// suppressed until the window passes without another wheel event.
    pub fn on_wheel(&mut self, metrics: ScrollMetrics, events: &EventSender) -> WheelOutcome {
        self.cancel_timer();

        let fraction = metrics.fraction();
        if fraction > self.threshold {
            self.suppressed = false;
            return WheelOutcome::Resumed;
        }

        debug!(fraction, "suppressing auto-scroll");
        self.suppressed = true;
        self.generation += 1;
        self.timer = Some(schedule(
            events,
            self.window,
            ClientEvent::SuppressionExpired {
                generation: self.generation,
            },
        ));
        WheelOutcome::Suppressed
    }

    /// Returns `true` if this expiry lifted the suppression.
    pub fn on_expired(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.timer.is_none() {
            return false;
        }
        self.timer = None;
        self.suppressed = false;
        true
    }

    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ScrollSuppression {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
