//! Transit entities returned by a [`TransitSource`](super::TransitSource).
//!
//! These are plain data: the observer never mutates a received entity, it
//! only reads identity fields and re-shapes composites into sub-entities
//! (see [`crate::decompose`]).
//!
//! ## For contributors
//!
//! Field names serialise in camelCase (`tripId`, `nextStops`, ...) so that a
//! source backed by a JSON API can deserialise responses straight into these
//! types.  Identity fields are `Option`s on purpose: a malformed response
//! still flows through the pipeline and is keyed structurally instead.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A point in time as reported by the transit API, with its local offset.
pub type When = DateTime<FixedOffset>;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A station groups one or more stops (platforms, bus bays).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<Location>,
}

/// A single stop, optionally embedding its parent station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<Station>,
}

/// A transit line, e.g. the `S1` or bus `100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    pub name: String,
    /// Transport mode (`train`, `bus`, ...).
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
}

/// A vehicle leaving a stop, as listed on a departure board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub stop: Option<Stop>,
    /// Realtime instant if known, otherwise the planned one.
    #[serde(default)]
    pub when: Option<When>,
    /// Delay in seconds; `None` when no realtime data is available.
    #[serde(default)]
    pub delay: Option<i32>,
    #[serde(default)]
    pub line: Option<Line>,
    #[serde(default)]
    pub direction: Option<String>,
}

/// A vehicle reaching a stop, as listed on an arrival board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrival {
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub stop: Option<Stop>,
    #[serde(default)]
    pub when: Option<When>,
    #[serde(default)]
    pub delay: Option<i32>,
    #[serde(default)]
    pub line: Option<Line>,
    /// Where the vehicle came from.
    #[serde(default)]
    pub provenance: Option<String>,
}

/// One leg of a journey, ridden on a single vehicle (or walked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    /// Stop id the leg starts at.
    pub origin: String,
    /// Stop id the leg ends at.
    pub destination: String,
    #[serde(default)]
    pub departure: Option<When>,
    #[serde(default)]
    pub departure_delay: Option<i32>,
    #[serde(default)]
    pub arrival: Option<When>,
    #[serde(default)]
    pub arrival_delay: Option<i32>,
    #[serde(default)]
    pub line: Option<Line>,
    #[serde(default)]
    pub direction: Option<String>,
}

/// A route from A to B, made of one or more legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

/// A stop along a trip or a vehicle's upcoming path.
///
/// Stopovers inside a [`Trip`] describe the section between two stops
/// (`origin`/`destination`), while a [`Movement`]'s `next_stops` name the
/// single `stop` being served.  The back-references `trip_id` and `line` are
/// empty in source data and filled in when the stopover is emitted on its
/// own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stopover {
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub departure: Option<When>,
    #[serde(default)]
    pub departure_delay: Option<i32>,
    #[serde(default)]
    pub arrival: Option<When>,
    #[serde(default)]
    pub arrival_delay: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

/// A single run of a vehicle along a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub line: Option<Line>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub stopovers: Vec<Stopover>,
}

/// A live vehicle position as reported by the radar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub line: Option<Line>,
    #[serde(default)]
    pub direction: Option<String>,
    /// Id of the trip the vehicle is running.
    #[serde(default)]
    pub trip: Option<String>,
    #[serde(default)]
    pub next_stops: Vec<Stopover>,
}

/// Area the radar is queried for, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
