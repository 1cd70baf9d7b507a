//! Identity keys used to recognise an entity across polls.
//!
//! Every top-level entity kind has a natural key (a trip id, a journey id,
//! ...).  When a source omits that field the entity is keyed by a digest of
//! its full contents instead, so a malformed entity is still emitted once
//! rather than never or on every poll.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::source::{Arrival, Departure, Journey, Location, Movement, Trip};

/// Kinds of entity that carry an identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Departure,
    Arrival,
    Journey,
    Trip,
    Movement,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Departure => "departure",
            EntityKind::Arrival => "arrival",
            EntityKind::Journey => "journey",
            EntityKind::Trip => "trip",
            EntityKind::Movement => "movement",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level entity the observer de-duplicates.
pub trait Entity: Serialize + fmt::Debug {
    const KIND: EntityKind;

    /// The key prescribed for this kind, or `None` if the fields it is built
    /// from are missing.
    fn natural_key(&self, resolver: &IdentityResolver) -> Option<String>;
}

/// Derives identity keys. Pure and infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityResolver {
    movement_precision: u8,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(3)
    }
}

impl IdentityResolver {
    /// `movement_precision` is the number of decimal places a vehicle's
    /// position is rounded to before it becomes part of its key.
    pub fn new(movement_precision: u8) -> Self {
        Self { movement_precision }
    }

    /// Identity key of `entity`, falling back to a structural digest.
    pub fn key_of<E: Entity>(&self, entity: &E) -> String {
        match entity.natural_key(self) {
            Some(key) => key,
            None => {
                let key = structural_key(entity);
                tracing::debug!(kind = %E::KIND, %key, "entity lacks identity field, keying structurally");
                key
            }
        }
    }

    /// `"lat,lon"` rounded to the configured precision.
    pub fn quantize(&self, location: &Location) -> String {
        let precision = usize::from(self.movement_precision);
        // Adding 0.0 folds -0.0 into 0.0 so both print the same.
        let round = |v: f64| {
            let scale = 10f64.powi(i32::from(self.movement_precision));
            (v * scale).round() / scale + 0.0
        };
        format!(
            "{:.*},{:.*}",
            precision,
            round(location.latitude),
            precision,
            round(location.longitude)
        )
    }
}

/// SHA-256 of the entity's JSON form, prefixed with `~` so it never collides
/// with a natural key.
fn structural_key<E: Serialize + fmt::Debug>(entity: &E) -> String {
    let bytes = serde_json::to_vec(entity).unwrap_or_else(|_| format!("{entity:?}").into_bytes());
    format!("~{:x}", Sha256::digest(&bytes))
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl Entity for Departure {
    const KIND: EntityKind = EntityKind::Departure;

    fn natural_key(&self, _: &IdentityResolver) -> Option<String> {
        let trip_id = non_empty(&self.trip_id)?;
        Some(match &self.stop {
            Some(stop) => format!("{trip_id}@{}", stop.id),
            None => trip_id.to_owned(),
        })
    }
}

impl Entity for Arrival {
    const KIND: EntityKind = EntityKind::Arrival;

    fn natural_key(&self, _: &IdentityResolver) -> Option<String> {
        let trip_id = non_empty(&self.trip_id)?;
        Some(match &self.stop {
            Some(stop) => format!("{trip_id}@{}", stop.id),
            None => trip_id.to_owned(),
        })
    }
}

impl Entity for Journey {
    const KIND: EntityKind = EntityKind::Journey;

    fn natural_key(&self, _: &IdentityResolver) -> Option<String> {
        non_empty(&self.id).map(str::to_owned)
    }
}

impl Entity for Trip {
    const KIND: EntityKind = EntityKind::Trip;

    fn natural_key(&self, _: &IdentityResolver) -> Option<String> {
        non_empty(&self.id).map(str::to_owned)
    }
}

impl Entity for Movement {
    const KIND: EntityKind = EntityKind::Movement;

    fn natural_key(&self, resolver: &IdentityResolver) -> Option<String> {
        let trip = non_empty(&self.trip)?;
        Some(match &self.location {
            Some(location) => format!("{trip}@{}", resolver.quantize(location)),
            None => trip.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
