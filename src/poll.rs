//! Background polling.
//!
//! Each watched [`Query`] runs on its own tokio task: fetch, push the result
//! through the feature's [`Feed`], sleep, repeat.  Pollers of different
//! features run concurrently and only share the event sink.
//!
//! ## For contributors
//!
//! The fetch is the only await point that does real work; everything after
//! it (de-duplication, decomposition, delivery) is synchronous.  Shutdown is
//! signalled over a [`watch`] channel and honoured both while waiting and
//! while a fetch is in flight.  Dropping the sender stops pollers as well.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{BackoffConfig, Feature};
use crate::error::ObserveError;
use crate::feed::Feed;
use crate::query::Query;
use crate::source::TransitSource;

/// Where a poller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Spawned, first fetch not started yet.
    Idle,
    /// Waiting for the source to answer.
    Polling,
    /// Checking the answer against the cache.
    Deciding,
    /// Delivering new entities to the sink.
    Emitting,
    /// The last fetch failed.
    Failed,
    /// Sleeping until the next poll.
    Waiting,
    /// Exited after shutdown.
    Stopped,
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollerState::Idle => "idle",
            PollerState::Polling => "polling",
            PollerState::Deciding => "deciding",
            PollerState::Emitting => "emitting",
            PollerState::Failed => "failed",
            PollerState::Waiting => "waiting",
            PollerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Drives one watched query.
pub struct Poller {
    query: Query,
    source: Arc<dyn TransitSource>,
    feed: Arc<Feed>,
    interval: Duration,
    backoff: Option<BackoffConfig>,
    state: watch::Sender<PollerState>,
    failures: u32,
}

/// Handle to a spawned [`Poller`].
#[derive(Debug)]
pub struct PollerHandle {
    query: Query,
    state: watch::Receiver<PollerState>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn feature(&self) -> Feature {
        self.query.feature()
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the poller task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(feature = %self.query.feature(), error = %e, "poller task panicked");
        }
    }
}

impl Poller {
    pub fn new(
        query: Query,
        source: Arc<dyn TransitSource>,
        feed: Arc<Feed>,
        interval: Duration,
        backoff: Option<BackoffConfig>,
    ) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            query,
            source,
            feed,
            interval,
            backoff,
            state,
            failures: 0,
        }
    }

    /// Spawn the polling loop. It runs until `shutdown` flips to `true` or
    /// its sender is dropped.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> PollerHandle {
        let query = self.query.clone();
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run(shutdown));
        PollerHandle { query, state, task }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let feature = self.query.feature();
        tracing::info!(%feature, query = ?self.query, "poller started");

        while !*shutdown.borrow_and_update() {
            self.set_state(PollerState::Polling);
            let fetched = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                fetched = self.query.fetch(self.source.as_ref()) => fetched,
            };

            match fetched {
                Ok(fetched) => {
                    self.failures = 0;
                    self.set_state(PollerState::Deciding);
                    let decision = self.feed.decide(&fetched);
                    self.set_state(PollerState::Emitting);
                    let report = self.feed.emit(decision);
                    tracing::debug!(
                        %feature,
                        fetched = fetched.len(),
                        emitted = report.emitted,
                        skipped = report.skipped,
                        failed = report.failed,
                        "poll complete"
                    );
                }
                Err(source) => {
                    self.failures = self.failures.saturating_add(1);
                    self.set_state(PollerState::Failed);
                    self.feed.sink().report(ObserveError::fetch(feature, source));
                }
            }

            self.set_state(PollerState::Waiting);
            let delay = self.next_delay();
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(PollerState::Stopped);
        tracing::info!(%feature, "poller stopped");
    }

    fn next_delay(&self) -> Duration {
        match &self.backoff {
            Some(backoff) => backoff.delay(self.interval, self.failures),
            None => self.interval,
        }
    }

    fn set_state(&self, state: PollerState) {
        tracing::trace!(feature = %self.query.feature(), %state, "poller state");
        self.state.send_replace(state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DedupCache;
    use crate::identity::IdentityResolver;
    use crate::decompose::Event;
    use crate::sink::EventSink;
    use crate::testing::{departure, MockSource, RecordingSink};
    use std::sync::{Mutex, OnceLock};

    fn spawn_departures(
        source: Arc<MockSource>,
        sink: Arc<dyn EventSink>,
        backoff: Option<BackoffConfig>,
    ) -> (PollerHandle, watch::Sender<bool>) {
        let feed = Arc::new(Feed::new(
            Feature::Departures,
            DedupCache::default(),
            IdentityResolver::default(),
            sink,
        ));
        let (tx, rx) = watch::channel(false);
        let poller = Poller::new(
            Query::departures("321"),
            source,
            feed,
            Duration::from_secs(30),
            backoff,
        );
        (poller.spawn(rx), tx)
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_polls_emit_each_departure_once() {
        let dep1 = departure("trip-1234", "2018-10-25T22:01:00+02:00", Some(120));
        let dep2 = departure("trip-4321", "2018-10-25T22:02:00+02:00", None);
        let source = Arc::new(MockSource::default().with_departures(vec![dep1, dep2]));
        let sink = Arc::new(RecordingSink::default());
        let (handle, shutdown) = spawn_departures(source.clone(), sink.clone(), None);

        tokio::time::sleep(Duration::from_secs(95)).await;

        assert_eq!(source.calls("departures"), 4, "polls at 0s, 30s, 60s, 90s");
        assert_eq!(sink.events().len(), 2);

        shutdown.send_replace(true);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failures_are_reported_and_polling_continues() {
        let dep = departure("trip-1234", "2018-10-25T22:01:00+02:00", Some(120));
        let source = Arc::new(MockSource::default().with_departures(vec![dep]));
        source.fail_next(2);
        let sink = Arc::new(RecordingSink::default());
        let (handle, shutdown) = spawn_departures(source.clone(), sink.clone(), None);

        tokio::time::sleep(Duration::from_secs(65)).await;

        assert_eq!(source.calls("departures"), 3);
        assert_eq!(sink.errors().len(), 2);
        assert_eq!(sink.events().len(), 1);

        shutdown.send_replace(true);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_stretches_the_wait_after_failures() {
        let source = Arc::new(MockSource::default());
        source.fail_next(3);
        let sink = Arc::new(RecordingSink::default());
        let backoff = BackoffConfig { max: Duration::from_secs(300) };
        let (handle, shutdown) = spawn_departures(source.clone(), sink.clone(), Some(backoff));

        // Polls at 0s, 60s (after 1 failure), 180s (after 2 failures).
        tokio::time::sleep(Duration::from_secs(179)).await;
        assert_eq!(source.calls("departures"), 2);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.calls("departures"), 3);

        shutdown.send_replace(true);
        handle.join().await;
    }

    /// Records the poller's published state at every delivery.
    #[derive(Default)]
    struct StateAtDelivery {
        state: OnceLock<watch::Receiver<PollerState>>,
        seen: Mutex<Vec<PollerState>>,
    }

    impl EventSink for StateAtDelivery {
        fn emit(&self, _: Event) -> anyhow::Result<()> {
            if let Some(state) = self.state.get() {
                self.seen.lock().unwrap().push(*state.borrow());
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn state_is_emitting_while_events_are_delivered() {
        let dep = departure("trip-1234", "2018-10-25T22:01:00+02:00", Some(120));
        let source = Arc::new(MockSource::default().with_departures(vec![dep]));
        let sink = Arc::new(StateAtDelivery::default());
        let (handle, shutdown) = spawn_departures(source, sink.clone(), None);
        sink.state.set(handle.subscribe()).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*sink.seen.lock().unwrap(), vec![PollerState::Emitting]);
        assert_eq!(handle.state(), PollerState::Waiting);

        shutdown.send_replace(true);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_a_waiting_poller() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let (handle, shutdown) = spawn_departures(source.clone(), sink, None);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.state(), PollerState::Waiting);

        shutdown.send_replace(true);
        let mut state = handle.subscribe();
        handle.join().await;
        assert_eq!(*state.borrow_and_update(), PollerState::Stopped);
        assert_eq!(source.calls("departures"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_shutdown_sender_stops_the_poller() {
        let source = Arc::new(MockSource::default());
        let sink = Arc::new(RecordingSink::default());
        let (handle, shutdown) = spawn_departures(source, sink, None);

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(shutdown);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_a_hanging_fetch() {
        let source = Arc::new(MockSource::default());
        source.hang(true);
        let sink = Arc::new(RecordingSink::default());
        let (handle, shutdown) = spawn_departures(source.clone(), sink.clone(), None);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.state(), PollerState::Polling);

        shutdown.send_replace(true);
        handle.join().await;
        assert!(sink.events().is_empty());
    }
}
