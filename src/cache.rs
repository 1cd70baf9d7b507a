//! Bounded memory of already-emitted identity keys.
//!
//! One [`DedupCache`] exists per feature.  It is shared between the
//! feature's background pollers and its one-shot queries, so the
//! check-and-insert step is a single critical section
//! ([`insert_if_absent`](DedupCache::insert_if_absent)).
//!
//! ## Eviction
//!
//! Keys are kept in insertion order.  Every insertion first sweeps keys
//! older than the TTL off the front, then drops the oldest keys while the
//! capacity is exceeded.  An evicted key that shows up again is reported as
//! new.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::identity::EntityKind;

type Key = (EntityKind, String);

#[derive(Debug)]
pub struct DedupCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Key → time it was remembered.
    seen: HashMap<Key, Instant>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<(Key, Instant)>,
}

impl DedupCache {
    /// A capacity of zero is raised to one: a cache that forgets a key as
    /// soon as it is inserted would re-emit every entity on every poll.
    pub fn new(config: CacheConfig) -> Self {
        let config = CacheConfig {
            capacity: config.capacity.map(|capacity| capacity.max(1)),
            ..config
        };
        Self {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Whether `key` was remembered and has not expired yet.
    pub fn seen(&self, kind: EntityKind, key: &str) -> bool {
        let now = Instant::now();
        let inner = self.lock();
        inner
            .seen
            .get(&(kind, key.to_owned()))
            .is_some_and(|at| !self.expired(*at, now))
    }

    /// Remember `key`. A key that is already present keeps its original age.
    pub fn remember(&self, kind: EntityKind, key: &str) {
        self.insert_if_absent(kind, key);
    }

    /// Remember `key` unless it is already known.
    ///
    /// Returns `true` if the key was new, i.e. the entity should be emitted.
    pub fn insert_if_absent(&self, kind: EntityKind, key: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();
        self.sweep(&mut inner, now);

        let key = (kind, key.to_owned());
        if inner.seen.contains_key(&key) {
            return false;
        }
        inner.seen.insert(key.clone(), now);
        inner.order.push_back((key, now));

        if let Some(capacity) = self.config.capacity {
            while inner.order.len() > capacity {
                if let Some((oldest, _)) = inner.order.pop_front() {
                    inner.seen.remove(&oldest);
                }
            }
        }
        true
    }

    /// Number of remembered keys, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Age of the oldest remembered key.
    pub fn oldest_age(&self) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .order
            .front()
            .map(|(_, at)| now.saturating_duration_since(*at))
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.seen.clear();
        inner.order.clear();
    }

    fn sweep(&self, inner: &mut Inner, now: Instant) {
        if self.config.ttl.is_none() {
            return;
        }
        while let Some((_, at)) = inner.order.front() {
            if !self.expired(*at, now) {
                break;
            }
            if let Some((key, _)) = inner.order.pop_front() {
                inner.seen.remove(&key);
            }
        }
    }

    fn expired(&self, at: Instant, now: Instant) -> bool {
        self.config
            .ttl
            .is_some_and(|ttl| now.saturating_duration_since(at) >= ttl)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
