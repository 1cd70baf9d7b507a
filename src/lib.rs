//! transit-observe — turn a request/response transit API into a live,
//! de-duplicated event stream.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ spawns  ┌──────────┐ fetch  ┌───────────────┐
//! │ observer.rs│ ──────► │ poll.rs  │ ─────► │ TransitSource │
//! │  (façade)  │         │ (task)   │        │  (external)   │
//! └────────────┘         └──────────┘        └───────────────┘
//!       │ one-shot            │ Fetched
//!       ▼                     ▼
//! ┌──────────────────────────────────────┐  Event  ┌───────────┐
//! │ feed.rs: identity → cache → decompose│ ──────► │ EventSink │
//! └──────────────────────────────────────┘         └───────────┘
//! ```
//!
//! * **`source/`** — the `TransitSource` trait, entity models and query
//!   options.
//! * **`identity`** — identity keys per entity kind.
//! * **`cache`** — bounded per-feature memory of emitted keys.
//! * **`decompose`** — the `Event` type; journeys into legs, trips and
//!   movements into annotated stopovers.
//! * **`feed`** — the per-feature pipeline shared by pollers and one-shot
//!   queries.
//! * **`poll`** — one background task per watched query.
//! * **`observer`** — wires everything together.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use transit_observe::{observe, Event, ObserveConfig, Query, TransitSource};
//!
//! # async fn run(source: Arc<dyn TransitSource>) {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
//! let config = ObserveConfig::default()
//!     .watching(Query::departures("900000100003"))
//!     .watching(Query::trip("1|12345|0|86|19112018", "S1"));
//! let observer = observe(source, Arc::new(tx), config);
//!
//! while let Some(event) = rx.recv().await {
//!     println!("{}: {:?}", event.name(), event);
//! }
//! observer.stop().await;
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod decompose;
pub mod error;
pub mod feed;
pub mod identity;
pub mod observer;
pub mod poll;
pub mod query;
pub mod sink;
pub mod source;

#[cfg(test)]
mod testing;

pub use cache::DedupCache;
pub use config::{BackoffConfig, CacheConfig, Feature, ObserveConfig};
pub use decompose::{Decompose, Decomposed, Event};
pub use error::ObserveError;
pub use feed::{Decision, Feed, IngestReport};
pub use identity::{Entity, EntityKind, IdentityResolver};
pub use observer::{observe, Observer};
pub use poll::{Poller, PollerHandle, PollerState};
pub use query::{Fetched, Query};
pub use sink::{ChannelSink, EventSink, Notification};
pub use source::TransitSource;
