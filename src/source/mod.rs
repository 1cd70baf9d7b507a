//! Transit data source abstraction layer.
//!
//! This module defines the [`TransitSource`] trait, the entities it returns
//! ([`models`]) and the options each query takes ([`options`]).  The crate
//! ships no concrete source: the real client (HAFAS, a REST wrapper, a
//! replayed recording) lives with the caller.
//!
//! ## For contributors — plugging in a source
//!
//! 1. Define a struct holding whatever client/configuration you need.
//! 2. Implement [`TransitSource`] for it with `#[async_trait]`.
//! 3. Hand an `Arc` of it to [`crate::observe`].
//!
//! Polling, de-duplication and decomposition are all
//! source-agnostic.

pub mod models;
pub mod options;

pub use models::{
    Arrival, BoundingBox, Departure, Journey, Leg, Line, Location, Movement, Station,
    Stop, Stopover, Trip, When,
};
pub use options::{
    JourneysOptions, RadarOptions, RefreshJourneyOptions, StationBoardOptions, TripOptions,
};

use anyhow::Result;
use async_trait::async_trait;

/// Trait that every transit data source must implement.
///
/// Pollers call these methods from tokio tasks, so implementations must be
/// [`Send`] + [`Sync`].  Errors are opaque to the observer: they are wrapped
/// into [`ObserveError::Fetch`](crate::ObserveError::Fetch) and either
/// reported to the sink (background polls) or returned to the caller
/// (one-shot queries).
///
/// ## Implementing a new source
///
/// ```ignore
/// pub struct MySource { /* client, base url, ... */ }
///
/// #[async_trait]
/// impl TransitSource for MySource {
///     async fn departures(&self, stop: &str, opt: &StationBoardOptions) -> Result<Vec<Departure>> {
///         // Perform HTTP / IO, then convert into Departure values.
///         todo!()
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait TransitSource: Send + Sync {
    /// Departures at `stop`.
    async fn departures(&self, stop: &str, opt: &StationBoardOptions) -> Result<Vec<Departure>>;

    /// Arrivals at `stop`.
    async fn arrivals(&self, stop: &str, opt: &StationBoardOptions) -> Result<Vec<Arrival>>;

    /// Journeys from `from` to `to`.
    async fn journeys(&self, from: &str, to: &str, opt: &JourneysOptions) -> Result<Vec<Journey>>;

    /// Fetch up-to-date data for a journey found earlier.
    async fn refresh_journey(&self, id: &str, opt: &RefreshJourneyOptions) -> Result<Journey>;

    /// A single trip, identified by its id and the name of its line.
    async fn trip(&self, id: &str, line_name: &str, opt: &TripOptions) -> Result<Trip>;

    /// Vehicles currently inside `bbox`.
    async fn radar(&self, bbox: &BoundingBox, opt: &RadarOptions) -> Result<Vec<Movement>>;
}
