//! Observer configuration.
//!
//! Everything the observer can be tuned with lives here as plain structs with
//! documented [`Default`]s.  The defaults suit a long-running watch session:
//! polls every 30 seconds and never remembers more than a few thousand keys
//! per feature.

use std::fmt;
use std::time::Duration;

use crate::query::Query;

/// One watchable capability of the transit source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Departures,
    Arrivals,
    /// Journey planning and journey refresh.
    Journeys,
    Trips,
    /// The vehicle radar.
    Movements,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Departures,
        Feature::Arrivals,
        Feature::Journeys,
        Feature::Trips,
        Feature::Movements,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Departures => "departures",
            Feature::Arrivals => "arrivals",
            Feature::Journeys => "journeys",
            Feature::Trips => "trips",
            Feature::Movements => "movements",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds of a feature's de-duplication cache.
///
/// Setting both knobs to `None` gives an unbounded set that only forgets on
/// restart; fine for a short session, not for a daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of remembered keys; the oldest are evicted first.
    /// `Some(0)` is treated as `Some(1)`. Default: `Some(4096)`.
    pub capacity: Option<usize>,
    /// How long a key is remembered. Default: `Some(1 hour)`.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Some(4096),
            ttl: Some(Duration::from_secs(60 * 60)),
        }
    }
}

/// Exponential backoff applied after consecutive fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Upper bound for the wait between polls. Default: 5 minutes.
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max: Duration::from_secs(5 * 60),
        }
    }
}

impl BackoffConfig {
    /// Wait before the next poll after `failures` consecutive failures.
    ///
    /// The interval doubles per failure and is capped at [`max`](Self::max),
    /// but never drops below the base interval.
    pub fn delay(&self, interval: Duration, failures: u32) -> Duration {
        if failures == 0 {
            return interval;
        }
        let factor = 1u32.checked_shl(failures.min(31)).unwrap_or(u32::MAX);
        interval
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max)
            .max(interval)
    }
}

/// Which features to observe and how.
#[derive(Debug, Clone)]
pub struct ObserveConfig {
    /// Emit `departure` events. Default: `false`.
    pub departures: bool,
    /// Emit `arrival` events. Default: `false`.
    pub arrivals: bool,
    /// Emit `journey` and `leg` events. Default: `false`.
    pub journeys: bool,
    /// Emit `trip` and `stopover` events. Default: `false`.
    pub trips: bool,
    /// Emit `movement` and `stopover` events. Default: `false`.
    pub movements: bool,
    /// Queries polled in the background; one poller each. Queries of a
    /// disabled feature are ignored. Default: none.
    pub watch: Vec<Query>,
    /// Wait between two polls of the same query. Default: 30 seconds.
    pub poll_interval: Duration,
    /// Bounds of each feature's de-duplication cache.
    pub cache: CacheConfig,
    /// Back off after failed polls. Default: `None` (fixed interval).
    pub backoff: Option<BackoffConfig>,
    /// Decimal places a movement's location is rounded to when keying it.
    /// Default: 3 (roughly 100 m).
    pub movement_precision: u8,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            departures: false,
            arrivals: false,
            journeys: false,
            trips: false,
            movements: false,
            watch: Vec::new(),
            poll_interval: Duration::from_secs(30),
            cache: CacheConfig::default(),
            backoff: None,
            movement_precision: 3,
        }
    }
}

impl ObserveConfig {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Departures => self.departures,
            Feature::Arrivals => self.arrivals,
            Feature::Journeys => self.journeys,
            Feature::Trips => self.trips,
            Feature::Movements => self.movements,
        }
    }

    /// Enable `feature`.
    pub fn enable(mut self, feature: Feature) -> Self {
        match feature {
            Feature::Departures => self.departures = true,
            Feature::Arrivals => self.arrivals = true,
            Feature::Journeys => self.journeys = true,
            Feature::Trips => self.trips = true,
            Feature::Movements => self.movements = true,
        }
        self
    }

    /// Poll `query` in the background, enabling its feature.
    pub fn watching(self, query: Query) -> Self {
        let mut config = self.enable(query.feature());
        config.watch.push(query);
        config
    }

    pub fn enabled_features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.is_enabled(*f))
    }
}
