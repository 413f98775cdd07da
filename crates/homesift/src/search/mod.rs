//! Property search: request types, upstream URL building and orchestration.
//!
//! This module turns a [`SearchRequest`] into one or more upstream requests,
//! runs them with per-status fan-out and progressive fallbacks, and shapes
//! the merged result into a [`SearchResponse`].

pub use error::{Result, SearchError};
mod filters;
mod orchestration;
mod request;
mod response;

pub use filters::{AppliedFilters, ListingStatus, SearchFilters};
pub(crate) use orchestration::{detail_inner, nearby_inner, search_inner, suggestions_inner};
pub use orchestration::{SearchConfig, SearchPlan};
pub use request::{
    NearbyRequest, SearchRequest, UpstreamParams, build_nearby_url, build_url, param,
};
pub use response::{
    NO_STRATEGY, PRIMARY_STRATEGY, ResponseData, ResponseKind, SearchAttempt, SearchResponse,
};

mod error {
    use homesift_provider::ProviderError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("Provider error: {0}")]
        Provider(#[from] ProviderError),
        #[error("Search query is empty and no reference point was given")]
        EmptyQuery,
        #[error("Property not found: {0}")]
        NotFound(String),
        #[error("All {attempts} upstream request(s) failed, last error: {last}")]
        AllStrategiesFailed {
            attempts: usize,
            #[source]
            last: ProviderError,
        },
    }

    impl SearchError {
        /// The API key was rejected; retrying with the same configuration is pointless.
        pub fn is_unauthorized(&self) -> bool {
            matches!(self, Self::Provider(ProviderError::Unauthorized))
        }

        /// Upstream kept answering 429 until retries ran out.
        pub fn is_rate_limited(&self) -> bool {
            match self {
                Self::Provider(e) | Self::AllStrategiesFailed { last: e, .. } => {
                    e.is_rate_limited()
                }
                _ => false,
            }
        }
    }

    pub type Result<T> = std::result::Result<T, SearchError>;
}
