//! Splitting composite entities into independently meaningful events.
//!
//! A journey is reported together with its legs, a trip and a vehicle
//! movement together with their stopovers.  Stopovers are annotated with
//! the trip id and line of their parent so that a consumer seeing only the
//! `stopover` event still knows what it belongs to.

use serde::Serialize;

use crate::source::{Arrival, Departure, Journey, Leg, Line, Movement, Stopover, Trip};

/// A named event delivered to an [`EventSink`](crate::sink::EventSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum Event {
    Departure(Departure),
    Arrival(Arrival),
    Journey(Journey),
    Leg(Leg),
    Trip(Trip),
    Stopover(Stopover),
    Movement(Movement),
}

impl Event {
    /// Event name: `departure`, `arrival`, `journey`, `leg`, `trip`,
    /// `stopover` or `movement`.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Departure(_) => "departure",
            Event::Arrival(_) => "arrival",
            Event::Journey(_) => "journey",
            Event::Leg(_) => "leg",
            Event::Trip(_) => "trip",
            Event::Stopover(_) => "stopover",
            Event::Movement(_) => "movement",
        }
    }
}

/// An entity's own event followed by the events of its parts, in source
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposed {
    pub primary: Event,
    pub subs: Vec<Event>,
}

impl Decomposed {
    fn single(primary: Event) -> Self {
        Self {
            primary,
            subs: Vec::new(),
        }
    }

    /// All events, primary first.
    pub fn into_events(self) -> impl Iterator<Item = Event> {
        std::iter::once(self.primary).chain(self.subs)
    }
}

pub trait Decompose {
    fn decompose(self) -> Decomposed;
}

impl Decompose for Departure {
    fn decompose(self) -> Decomposed {
        Decomposed::single(Event::Departure(self))
    }
}

impl Decompose for Arrival {
    fn decompose(self) -> Decomposed {
        Decomposed::single(Event::Arrival(self))
    }
}

impl Decompose for Journey {
    fn decompose(self) -> Decomposed {
        // TODO: emit the stopovers of each leg once the leg → stopover
        // annotation (trip id of the leg) is settled.
        let subs = self.legs.iter().cloned().map(Event::Leg).collect();
        Decomposed {
            primary: Event::Journey(self),
            subs,
        }
    }
}

impl Decompose for Trip {
    fn decompose(self) -> Decomposed {
        let subs = annotate(&self.stopovers, self.id.as_ref(), self.line.as_ref());
        Decomposed {
            primary: Event::Trip(self),
            subs,
        }
    }
}

impl Decompose for Movement {
    fn decompose(self) -> Decomposed {
        let subs = annotate(&self.next_stops, self.trip.as_ref(), self.line.as_ref());
        Decomposed {
            primary: Event::Movement(self),
            subs,
        }
    }
}

fn annotate(stopovers: &[Stopover], trip_id: Option<&String>, line: Option<&Line>) -> Vec<Event> {
    stopovers
        .iter()
        .map(|st| {
            Event::Stopover(Stopover {
                trip_id: trip_id.cloned(),
                line: line.cloned(),
                ..st.clone()
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
