//! Per-query options handed to a [`TransitSource`](super::TransitSource).
//!
//! Every struct implements [`Default`]; the documented defaults are what a
//! caller gets when it only cares about the required arguments.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Options for departure and arrival boards.
#[derive(Debug, Clone, PartialEq)]
pub struct StationBoardOptions {
    /// Start of the board. Default: `None` (now).
    pub when: Option<DateTime<Utc>>,
    /// Time span covered by the board. Default: 10 minutes.
    pub duration: Duration,
    /// Upper bound on returned entries. Default: `None` (source decides).
    pub results: Option<usize>,
    /// Only entries heading to this stop id. Default: `None`.
    pub direction: Option<String>,
}

impl Default for StationBoardOptions {
    fn default() -> Self {
        Self {
            when: None,
            duration: Duration::from_secs(10 * 60),
            results: None,
            direction: None,
        }
    }
}

/// Options for journey planning.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneysOptions {
    /// Earliest departure. Default: `None` (now).
    pub departure: Option<DateTime<Utc>>,
    /// Number of journeys to ask for. Default: `Some(3)`.
    pub results: Option<usize>,
    /// Maximum number of transfers. Default: `None` (unlimited).
    pub transfers: Option<u32>,
    /// Ask the source to include stopovers in each leg. Default: `false`.
    pub stopovers: bool,
}

impl Default for JourneysOptions {
    fn default() -> Self {
        Self {
            departure: None,
            results: Some(3),
            transfers: None,
            stopovers: false,
        }
    }
}

/// Options for refreshing a previously found journey.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshJourneyOptions {
    /// Default: `false`.
    pub stopovers: bool,
}

/// Options for a trip lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TripOptions {
    /// Include the trip's stopovers. Default: `true`, since they are what
    /// the observer decomposes a trip into.
    pub stopovers: bool,
}

impl Default for TripOptions {
    fn default() -> Self {
        Self { stopovers: true }
    }
}

/// Options for the vehicle radar.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarOptions {
    /// Maximum number of vehicles. Default: 256.
    pub results: usize,
    /// Time span the movement frames cover. Default: 30 seconds.
    pub duration: Duration,
    /// Number of position frames per vehicle. Default: 3.
    pub frames: u32,
}

impl Default for RadarOptions {
    fn default() -> Self {
        Self {
            results: 256,
            duration: Duration::from_secs(30),
            frames: 3,
        }
    }
}
