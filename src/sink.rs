//! Where events go.
//!
//! The observer never owns a global emitter; the caller hands it an
//! [`EventSink`].  Pollers of different features deliver concurrently, so a
//! sink must be [`Send`] + [`Sync`].

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use crate::decompose::Event;
use crate::error::ObserveError;

/// Receiver of observer events and errors.
pub trait EventSink: Send + Sync {
    /// Deliver one event. A returned error is reported through
    /// [`report`](EventSink::report) and the event is not retried.
    fn emit(&self, event: Event) -> Result<()>;

    /// Called with fetch failures of background polls and with failed
    /// deliveries.  The default logs them.
    fn report(&self, error: ObserveError) {
        tracing::warn!(error = %error, "observer error");
    }
}

impl EventSink for mpsc::UnboundedSender<Event> {
    fn emit(&self, event: Event) -> Result<()> {
        self.send(event).map_err(|_| anyhow!("event receiver dropped"))
    }
}

impl EventSink for std::sync::mpsc::Sender<Event> {
    fn emit(&self, event: Event) -> Result<()> {
        self.send(event).map_err(|_| anyhow!("event receiver dropped"))
    }
}

/// Something sent over a [`ChannelSink`].
#[derive(Debug)]
pub enum Notification {
    Event(Event),
    Error(ObserveError),
}

/// Forwards both events and errors over one channel, so the receiving end
/// decides what to do with failures.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: Event) -> Result<()> {
        self.tx
            .send(Notification::Event(event))
            .map_err(|_| anyhow!("notification receiver dropped"))
    }

    fn report(&self, error: ObserveError) {
        if let Err(mpsc::error::SendError(Notification::Error(error))) =
            self.tx.send(Notification::Error(error))
        {
            tracing::warn!(error = %error, "observer error (receiver dropped)");
        }
    }
}
