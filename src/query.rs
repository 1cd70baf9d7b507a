//! Watched queries: a feature plus the arguments its fetch is called with.

use crate::config::Feature;
use crate::source::{
    Arrival, BoundingBox, Departure, Journey, JourneysOptions, Movement, RadarOptions,
    RefreshJourneyOptions, StationBoardOptions, TransitSource, Trip, TripOptions,
};

/// One background query, polled by its own [`Poller`](crate::poll::Poller).
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Departures {
        stop: String,
        opt: StationBoardOptions,
    },
    Arrivals {
        stop: String,
        opt: StationBoardOptions,
    },
    Journeys {
        from: String,
        to: String,
        opt: JourneysOptions,
    },
    RefreshJourney {
        id: String,
        opt: RefreshJourneyOptions,
    },
    Trip {
        id: String,
        line_name: String,
        opt: TripOptions,
    },
    Radar {
        bbox: BoundingBox,
        opt: RadarOptions,
    },
}

impl Query {
    pub fn departures(stop: impl Into<String>) -> Self {
        Self::Departures {
            stop: stop.into(),
            opt: StationBoardOptions::default(),
        }
    }

    pub fn arrivals(stop: impl Into<String>) -> Self {
        Self::Arrivals {
            stop: stop.into(),
            opt: StationBoardOptions::default(),
        }
    }

    pub fn journeys(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Journeys {
            from: from.into(),
            to: to.into(),
            opt: JourneysOptions::default(),
        }
    }

    pub fn refresh_journey(id: impl Into<String>) -> Self {
        Self::RefreshJourney {
            id: id.into(),
            opt: RefreshJourneyOptions::default(),
        }
    }

    pub fn trip(id: impl Into<String>, line_name: impl Into<String>) -> Self {
        Self::Trip {
            id: id.into(),
            line_name: line_name.into(),
            opt: TripOptions::default(),
        }
    }

    pub fn radar(bbox: BoundingBox) -> Self {
        Self::Radar {
            bbox,
            opt: RadarOptions::default(),
        }
    }

    /// The feature whose cache and toggle this query belongs to.
    pub fn feature(&self) -> Feature {
        match self {
            Query::Departures { .. } => Feature::Departures,
            Query::Arrivals { .. } => Feature::Arrivals,
            Query::Journeys { .. } | Query::RefreshJourney { .. } => Feature::Journeys,
            Query::Trip { .. } => Feature::Trips,
            Query::Radar { .. } => Feature::Movements,
        }
    }

    /// Run the query once against `source`.
    pub async fn fetch(&self, source: &dyn TransitSource) -> anyhow::Result<Fetched> {
        Ok(match self {
            Query::Departures { stop, opt } => Fetched::Departures(source.departures(stop, opt).await?),
            Query::Arrivals { stop, opt } => Fetched::Arrivals(source.arrivals(stop, opt).await?),
            Query::Journeys { from, to, opt } => {
                Fetched::Journeys(source.journeys(from, to, opt).await?)
            }
            Query::RefreshJourney { id, opt } => {
                Fetched::Journey(source.refresh_journey(id, opt).await?)
            }
            Query::Trip { id, line_name, opt } => Fetched::Trip(source.trip(id, line_name, opt).await?),
            Query::Radar { bbox, opt } => Fetched::Movements(source.radar(bbox, opt).await?),
        })
    }
}

/// The raw answer to a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Departures(Vec<Departure>),
    Arrivals(Vec<Arrival>),
    Journeys(Vec<Journey>),
    Journey(Journey),
    Trip(Trip),
    Movements(Vec<Movement>),
}

impl Fetched {
    /// Number of top-level entities in the answer.
    pub fn len(&self) -> usize {
        match self {
            Fetched::Departures(v) => v.len(),
            Fetched::Arrivals(v) => v.len(),
            Fetched::Journeys(v) => v.len(),
            Fetched::Movements(v) => v.len(),
            Fetched::Journey(_) | Fetched::Trip(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
