//! Observer error types.

use thiserror::Error;

use crate::config::Feature;

#[derive(Debug, Error)]
pub enum ObserveError {
    /// The transit source failed to answer a query.
    #[error("fetching {feature} failed: {source:#}")]
    Fetch {
        feature: Feature,
        #[source]
        source: anyhow::Error,
    },

    /// The event sink rejected an event. The event is not retried.
    #[error("delivering {event} event failed: {source:#}")]
    Sink {
        event: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ObserveError {
    pub(crate) fn fetch(feature: Feature, source: anyhow::Error) -> Self {
        Self::Fetch { feature, source }
    }

    /// The feature this error belongs to, if it is a fetch failure.
    pub fn feature(&self) -> Option<Feature> {
        match self {
            Self::Fetch { feature, .. } => Some(*feature),
            Self::Sink { .. } => None,
        }
    }
}
