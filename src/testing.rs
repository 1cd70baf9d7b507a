//! Test doubles and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::DateTime;

use crate::decompose::Event;
use crate::error::ObserveError;
use crate::sink::EventSink;
use crate::source::{
    Arrival, BoundingBox, Departure, Journey, JourneysOptions, Leg, Line, Location, Movement,
    RadarOptions, RefreshJourneyOptions, Station, StationBoardOptions, Stop, Stopover,
    TransitSource, Trip, TripOptions, When,
};

// -- fixtures ----------------------------------------------------------------

pub fn when(s: &str) -> When {
    DateTime::parse_from_rfc3339(s).unwrap()
}

pub fn some_station() -> Station {
    Station {
        id: "station-123".into(),
        name: "123".into(),
        location: Some(Location { latitude: 1.23, longitude: 3.21 }),
    }
}

pub fn some_stop() -> Stop {
    Stop {
        id: "stop-321".into(),
        name: "321".into(),
        location: Some(Location { latitude: 3.21, longitude: 1.23 }),
        station: Some(some_station()),
    }
}

pub fn some_line() -> Line {
    Line {
        id: "line-12".into(),
        name: "12".into(),
        mode: Some("train".into()),
        operator: Some("operator-1".into()),
    }
}

pub fn departure(trip_id: &str, at: &str, delay: Option<i32>) -> Departure {
    Departure {
        trip_id: Some(trip_id.into()),
        stop: Some(some_stop()),
        when: Some(when(at)),
        delay,
        line: Some(some_line()),
        direction: None,
    }
}

pub fn arrival(trip_id: &str, at: &str, delay: Option<i32>) -> Arrival {
    Arrival {
        trip_id: Some(trip_id.into()),
        stop: Some(some_stop()),
        when: Some(when(at)),
        delay,
        line: Some(some_line()),
        provenance: None,
    }
}

/// A journey through stops `123`, `124`, ... with `legs` legs.
pub fn journey(id: &str, legs: usize) -> Journey {
    let legs = (0..legs)
        .map(|i| Leg {
            origin: (123 + i).to_string(),
            destination: (124 + i).to_string(),
            departure: Some(when(&format!("2018-11-19T08:{:02}:00+02:00", i * 10))),
            departure_delay: Some(60),
            arrival: Some(when(&format!("2018-11-19T08:{:02}:00+02:00", i * 10 + 5))),
            arrival_delay: None,
            line: Some(some_line()),
            direction: Some("foo".into()),
        })
        .collect();
    Journey {
        id: Some(id.into()),
        legs,
    }
}

/// A trip with `stopovers` sections between consecutive stops.
pub fn trip(id: &str, stopovers: usize) -> Trip {
    let stopovers = (0..stopovers)
        .map(|i| Stopover {
            origin: Some((123 + i).to_string()),
            destination: Some((124 + i).to_string()),
            departure: Some(when(&format!("2018-11-19T08:{:02}:00+02:00", i * 5 + 1))),
            arrival: Some(when(&format!("2018-11-19T08:{:02}:00+02:00", i * 5 + 5))),
            ..Stopover::default()
        })
        .collect();
    Trip {
        id: Some(id.into()),
        line: Some(some_line()),
        direction: Some("foo".into()),
        stopovers,
    }
}

/// A vehicle of `trip` at (`lat`, `lon`) with `next_stops` upcoming stops.
pub fn movement(trip: &str, lat: f64, lon: f64, next_stops: usize) -> Movement {
    let next_stops = (0..next_stops)
        .map(|i| Stopover {
            stop: Some((123 + i).to_string()),
            arrival: Some(when(&format!("2018-11-19T08:{:02}:00+02:00", i * 5 + 5))),
            departure: Some(when(&format!("2018-11-19T08:{:02}:00+02:00", i * 5 + 6))),
            ..Stopover::default()
        })
        .collect();
    Movement {
        location: Some(Location { latitude: lat, longitude: lon }),
        line: Some(some_line()),
        direction: Some("foo".into()),
        trip: Some(trip.into()),
        next_stops,
    }
}

// -- sources -----------------------------------------------------------------

/// A scripted [`TransitSource`] counting its calls.
#[derive(Default)]
pub struct MockSource {
    departures: Vec<Departure>,
    arrivals: Vec<Arrival>,
    journeys: Vec<Journey>,
    refreshed: Option<Journey>,
    trips: Vec<Trip>,
    movements: Vec<Movement>,
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_next: AtomicUsize,
    hang: AtomicBool,
}

impl MockSource {
    pub fn with_departures(mut self, departures: Vec<Departure>) -> Self {
        self.departures = departures;
        self
    }

    pub fn with_arrivals(mut self, arrivals: Vec<Arrival>) -> Self {
        self.arrivals = arrivals;
        self
    }

    pub fn with_journeys(mut self, journeys: Vec<Journey>) -> Self {
        self.journeys = journeys;
        self
    }

    pub fn with_refreshed(mut self, journey: Journey) -> Self {
        self.refreshed = Some(journey);
        self
    }

    /// Script a trip. Lookups prefer the trip with the requested id and
    /// fall back to the first one scripted.
    pub fn with_trip(mut self, trip: Trip) -> Self {
        self.trips.push(trip);
        self
    }

    pub fn with_movements(mut self, movements: Vec<Movement>) -> Self {
        self.movements = movements;
        self
    }

    /// Make the next `n` calls fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Make every call hang forever.
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    async fn call(&self, method: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            bail!("{method}: service unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl TransitSource for MockSource {
    async fn departures(&self, _: &str, _: &StationBoardOptions) -> Result<Vec<Departure>> {
        self.call("departures").await?;
        Ok(self.departures.clone())
    }

    async fn arrivals(&self, _: &str, _: &StationBoardOptions) -> Result<Vec<Arrival>> {
        self.call("arrivals").await?;
        Ok(self.arrivals.clone())
    }

    async fn journeys(&self, _: &str, _: &str, _: &JourneysOptions) -> Result<Vec<Journey>> {
        self.call("journeys").await?;
        Ok(self.journeys.clone())
    }

    async fn refresh_journey(&self, id: &str, _: &RefreshJourneyOptions) -> Result<Journey> {
        self.call("refresh_journey").await?;
        self.refreshed.clone().ok_or_else(|| anyhow!("journey {id} not found"))
    }

    async fn trip(&self, id: &str, _: &str, _: &TripOptions) -> Result<Trip> {
        self.call("trip").await?;
        self.trips
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .or_else(|| self.trips.first())
            .cloned()
            .ok_or_else(|| anyhow!("trip {id} not found"))
    }

    async fn radar(&self, _: &BoundingBox, _: &RadarOptions) -> Result<Vec<Movement>> {
        self.call("radar").await?;
        Ok(self.movements.clone())
    }
}

// -- sinks -------------------------------------------------------------------

/// Records every event and reported error.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
    errors: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl RecordingSink {
    /// A sink that blocks for `delay` before recording each event.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn named(&self, name: &str) -> Vec<Event> {
        self.events().into_iter().filter(|e| e.name() == name).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) -> Result<()> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    fn report(&self, error: ObserveError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

/// Rejects every event, remembering the names of the rejected ones.
#[derive(Default)]
pub struct FailingSink {
    reported: Mutex<Vec<&'static str>>,
}

impl FailingSink {
    pub fn reported(&self) -> Vec<&'static str> {
        self.reported.lock().unwrap().clone()
    }
}

impl EventSink for FailingSink {
    fn emit(&self, event: Event) -> Result<()> {
        bail!("sink full, dropping {}", event.name())
    }

    fn report(&self, error: ObserveError) {
        if let ObserveError::Sink { event, .. } = error {
            self.reported.lock().unwrap().push(event);
        }
    }
}
