//! The observer façade.
//!
//! [`observe`] wires a [`TransitSource`], an [`EventSink`] and an
//! [`ObserveConfig`] together: it creates one [`Feed`] per enabled feature,
//! spawns a [`Poller`] for every watched query of an enabled feature and
//! returns an [`Observer`].
//!
//! The observer mirrors the source's queries.  A one-shot call such as
//! [`Observer::departures`] fetches once, pushes the answer through the
//! feature's feed (sharing its cache with the background pollers) and
//! returns the raw answer.  Calls for a feature that is not enabled go
//! straight to the source and emit nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::cache::DedupCache;
use crate::config::{BackoffConfig, Feature, ObserveConfig};
use crate::error::ObserveError;
use crate::feed::{Feed, IngestReport};
use crate::identity::IdentityResolver;
use crate::poll::{Poller, PollerHandle, PollerState};
use crate::query::{Fetched, Query};
use crate::sink::EventSink;
use crate::source::{
    Arrival, BoundingBox, Departure, Journey, JourneysOptions, Movement, RadarOptions,
    RefreshJourneyOptions, StationBoardOptions, TransitSource, Trip, TripOptions,
};

/// Start observing `source`, delivering events to `sink`.
///
/// Must be called from within a tokio runtime; pollers for the watched
/// queries are spawned immediately and make their first fetch right away.
pub fn observe(
    source: Arc<dyn TransitSource>,
    sink: Arc<dyn EventSink>,
    config: ObserveConfig,
) -> Observer {
    let resolver = IdentityResolver::new(config.movement_precision);
    let feeds = config
        .enabled_features()
        .map(|feature| {
            let feed = Feed::new(feature, DedupCache::new(config.cache), resolver, Arc::clone(&sink));
            (feature, Arc::new(feed))
        })
        .collect();
    let (shutdown, _) = watch::channel(false);

    let mut observer = Observer {
        source,
        feeds,
        pollers: Vec::new(),
        shutdown,
        poll_interval: config.poll_interval,
        backoff: config.backoff,
    };
    for query in config.watch {
        observer.watch(query);
    }
    observer
}

/// Handle on a running observation.
///
/// Dropping it stops all pollers at their next await point.
pub struct Observer {
    source: Arc<dyn TransitSource>,
    feeds: HashMap<Feature, Arc<Feed>>,
    pollers: Vec<PollerHandle>,
    shutdown: watch::Sender<bool>,
    poll_interval: Duration,
    backoff: Option<BackoffConfig>,
}

impl Observer {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.feeds.contains_key(&feature)
    }

    /// Poll `query` in the background.
    ///
    /// Returns `false`, and starts nothing, if the query's feature is not
    /// enabled or the observer has been shut down.
    pub fn watch(&mut self, query: Query) -> bool {
        let feature = query.feature();
        let Some(feed) = self.feeds.get(&feature) else {
            tracing::warn!(%feature, ?query, "feature not enabled, not watching");
            return false;
        };
        if *self.shutdown.borrow() {
            return false;
        }
        let poller = Poller::new(
            query,
            Arc::clone(&self.source),
            Arc::clone(feed),
            self.poll_interval,
            self.backoff,
        );
        self.pollers.push(poller.spawn(self.shutdown.subscribe()));
        true
    }

    /// Current state of every poller, in the order they were started.
    pub fn poller_states(&self) -> Vec<(Query, PollerState)> {
        self.pollers
            .iter()
            .map(|p| (p.query().clone(), p.state()))
            .collect()
    }

    /// Number of identity keys the feature currently remembers.
    pub fn remembered(&self, feature: Feature) -> usize {
        self.feeds.get(&feature).map_or(0, |feed| feed.cache().len())
    }

    /// Ask every poller to stop. They exit at their next await point.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Stop every poller and wait for them to exit.
    pub async fn stop(self) {
        self.shutdown();
        let count = self.pollers.len();
        for poller in self.pollers {
            poller.join().await;
        }
        tracing::info!(pollers = count, "observer stopped");
    }

    // -- one-shot queries ----------------------------------------------------

    /// Run `query` once, emitting new entities if its feature is enabled.
    pub async fn query(&self, query: &Query) -> Result<Fetched, ObserveError> {
        let feature = query.feature();
        let fetched = query
            .fetch(self.source.as_ref())
            .await
            .map_err(|source| ObserveError::fetch(feature, source))?;
        self.ingest(feature, |feed| feed.ingest(&fetched));
        Ok(fetched)
    }

    pub async fn departures(
        &self,
        stop: &str,
        opt: &StationBoardOptions,
    ) -> Result<Vec<Departure>, ObserveError> {
        let deps = self
            .source
            .departures(stop, opt)
            .await
            .map_err(|source| ObserveError::fetch(Feature::Departures, source))?;
        self.ingest(Feature::Departures, |feed| feed.ingest_all(&deps));
        Ok(deps)
    }

    pub async fn arrivals(
        &self,
        stop: &str,
        opt: &StationBoardOptions,
    ) -> Result<Vec<Arrival>, ObserveError> {
        let arrs = self
            .source
            .arrivals(stop, opt)
            .await
            .map_err(|source| ObserveError::fetch(Feature::Arrivals, source))?;
        self.ingest(Feature::Arrivals, |feed| feed.ingest_all(&arrs));
        Ok(arrs)
    }

    pub async fn journeys(
        &self,
        from: &str,
        to: &str,
        opt: &JourneysOptions,
    ) -> Result<Vec<Journey>, ObserveError> {
        let journeys = self
            .source
            .journeys(from, to, opt)
            .await
            .map_err(|source| ObserveError::fetch(Feature::Journeys, source))?;
        self.ingest(Feature::Journeys, |feed| feed.ingest_all(&journeys));
        Ok(journeys)
    }

    pub async fn refresh_journey(
        &self,
        id: &str,
        opt: &RefreshJourneyOptions,
    ) -> Result<Journey, ObserveError> {
        let journey = self
            .source
            .refresh_journey(id, opt)
            .await
            .map_err(|source| ObserveError::fetch(Feature::Journeys, source))?;
        self.ingest(Feature::Journeys, |feed| feed.ingest_one(&journey));
        Ok(journey)
    }

    pub async fn trip(
        &self,
        id: &str,
        line_name: &str,
        opt: &TripOptions,
    ) -> Result<Trip, ObserveError> {
        let trip = self
            .source
            .trip(id, line_name, opt)
            .await
            .map_err(|source| ObserveError::fetch(Feature::Trips, source))?;
        self.ingest(Feature::Trips, |feed| feed.ingest_one(&trip));
        Ok(trip)
    }

    pub async fn radar(
        &self,
        bbox: &BoundingBox,
        opt: &RadarOptions,
    ) -> Result<Vec<Movement>, ObserveError> {
        let movements = self
            .source
            .radar(bbox, opt)
            .await
            .map_err(|source| ObserveError::fetch(Feature::Movements, source))?;
        self.ingest(Feature::Movements, |feed| feed.ingest_all(&movements));
        Ok(movements)
    }

    /// Push a one-shot answer through `feature`'s feed, if it is enabled.
    fn ingest(&self, feature: Feature, ingest: impl FnOnce(&Feed) -> IngestReport) {
        let Some(feed) = self.feeds.get(&feature) else {
            return;
        };
        let report = ingest(feed);
        tracing::debug!(
            %feature,
            emitted = report.emitted,
            skipped = report.skipped,
            failed = report.failed,
            "one-shot query"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
