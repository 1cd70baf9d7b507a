//! The per-feature pipeline: identify → de-duplicate → decompose → emit.
//!
//! Both the background pollers and the observer's one-shot queries push
//! their results through the feature's [`Feed`], which is what makes a
//! manually fetched entity invisible to the poller and vice versa.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::DedupCache;
use crate::config::Feature;
use crate::decompose::{Decompose, Decomposed};
use crate::error::ObserveError;
use crate::identity::{Entity, IdentityResolver};
use crate::query::Fetched;
use crate::sink::EventSink;

/// Outcome of pushing one fetch result through a [`Feed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Entities seen for the first time (primary events emitted).
    pub emitted: usize,
    /// Entities dropped as already seen.
    pub skipped: usize,
    /// Events, primary or sub, the sink rejected.
    pub failed: usize,
}

/// Entities of one fetch result that passed de-duplication, not yet
/// delivered.
///
/// Their keys are already recorded, so dropping a `Decision` instead of
/// passing it to [`Feed::emit`] loses those entities for good.
#[derive(Debug, Default)]
pub struct Decision {
    fresh: Vec<Decomposed>,
    skipped: usize,
}

impl Decision {
    /// Entities to emit.
    pub fn fresh(&self) -> usize {
        self.fresh.len()
    }

    /// Entities dropped as already seen.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

pub struct Feed {
    feature: Feature,
    cache: DedupCache,
    resolver: IdentityResolver,
    sink: Arc<dyn EventSink>,
    /// Held while one entity's events are delivered, so that pollers of the
    /// same feature never interleave their sub-events.
    delivery: Mutex<()>,
}

impl Feed {
    pub fn new(
        feature: Feature,
        cache: DedupCache,
        resolver: IdentityResolver,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            feature,
            cache,
            resolver,
            sink,
            delivery: Mutex::new(()),
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    /// Push a fetch result through the pipeline, in response order.
    pub fn ingest(&self, fetched: &Fetched) -> IngestReport {
        self.emit(self.decide(fetched))
    }

    pub fn ingest_all<E>(&self, entities: &[E]) -> IngestReport
    where
        E: Entity + Decompose + Clone,
    {
        self.emit(self.decide_all(entities))
    }

    pub fn ingest_one<E>(&self, entity: &E) -> IngestReport
    where
        E: Entity + Decompose + Clone,
    {
        self.ingest_all(std::slice::from_ref(entity))
    }

    /// Record the keys of a fetch result and keep the entities that were new.
    pub fn decide(&self, fetched: &Fetched) -> Decision {
        match fetched {
            Fetched::Departures(deps) => self.decide_all(deps),
            Fetched::Arrivals(arrs) => self.decide_all(arrs),
            Fetched::Journeys(journeys) => self.decide_all(journeys),
            Fetched::Journey(journey) => self.decide_all(std::slice::from_ref(journey)),
            Fetched::Trip(trip) => self.decide_all(std::slice::from_ref(trip)),
            Fetched::Movements(movements) => self.decide_all(movements),
        }
    }

    /// The key is recorded here, before anything is delivered, so a failing
    /// sink never causes the entity to be emitted again on the next poll.
    pub fn decide_all<E>(&self, entities: &[E]) -> Decision
    where
        E: Entity + Decompose + Clone,
    {
        let mut decision = Decision::default();
        for entity in entities {
            let key = self.resolver.key_of(entity);
            if self.cache.insert_if_absent(E::KIND, &key) {
                decision.fresh.push(entity.clone().decompose());
            } else {
                tracing::trace!(feature = %self.feature, kind = %E::KIND, %key, "already seen");
                decision.skipped += 1;
            }
        }
        decision
    }

    /// Deliver every entity of `decision`, each directly followed by its
    /// parts.
    pub fn emit(&self, decision: Decision) -> IngestReport {
        let mut report = IngestReport {
            emitted: decision.fresh.len(),
            skipped: decision.skipped,
            failed: 0,
        };
        for decomposed in decision.fresh {
            let _delivery = self.lock_delivery();
            for event in decomposed.into_events() {
                let name = event.name();
                if let Err(source) = self.sink.emit(event) {
                    report.failed += 1;
                    self.sink.report(ObserveError::Sink { event: name, source });
                }
            }
        }
        report
    }

    fn lock_delivery(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
