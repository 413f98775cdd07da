//! Homesift - Free-form Property Search
//!
//! Homesift turns what a user types into a property search box ("3 bedroom
//! homes in Longview TX", "123 Main St, Schertz, TX", "90210") into requests
//! against a listings provider. Queries are classified, sent to the right
//! endpoint, widened with progressively looser fallbacks when nothing comes
//! back, and answered with normalized, distance-ranked listings.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use homesift::{GeoPoint, PropertySearcher, SearchFilters, SearchRequest};
//!
//! # async fn run() -> Result<(), homesift::error::HomesiftError> {
//! // Provider credentials come from ZILLOW_URL / ZILLOW_API_KEY
//! let searcher = PropertySearcher::from_env()?;
//!
//! let request = SearchRequest::new("4 bedroom house in Dallas, TX")
//!     .with_filters(SearchFilters::new().apply().listing_status("ForSale,ForRent"))
//!     .with_origin(GeoPoint::new(32.7767, -96.797));
//!
//! let response = searcher.search(&request).await?;
//! for home in &response.nearby_homes {
//!     println!("{:?} {:?} {:.1} mi", home.zpid, home.price, home.distance());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Queries can be inspected offline, without touching the provider:
//!
//! ```rust
//! use homesift::{SearchType, classify};
//!
//! let analysis = classify("Alamo Heights Elementary, San Antonio, TX");
//! assert_eq!(analysis.search_type(), SearchType::School);
//! ```
//!
//! # Features
//!
//! - **Query Classification**: Zipcodes, addresses, city/state, bedroom, school and landmark queries
//! - **Progressive Fallbacks**: Up to three looser interpretations when the first finds nothing
//! - **Listing Fan-out**: Concurrent per-status requests merged and deduplicated
//! - **Resilient Upstream Access**: Exponential backoff on rate limits, fail-fast on bad keys
//! - **Distance Ranking**: Great-circle distance from a reference point

use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

pub mod analysis;
mod config;
mod core;
pub mod error;
pub mod geo;
mod property;
mod search;

pub use core::{PropertySearcher, PropertySearcherBuilder};

pub use analysis::{
    Endpoint, ExtractedData, QueryDiagnostics, SearchAnalysis, SearchType, classify, diagnose,
    generate_fallbacks,
};
pub use config::SearchConfigBuilder;
pub use geo::{GeoPoint, calculate_distance};
pub use homesift_provider as provider;
pub use homesift_provider::{HttpProvider, PropertyProvider, ProviderConfig, RetryPolicy};
pub use property::{DistanceType, NormalizedProperty};
pub use search::{
    AppliedFilters, ListingStatus, NO_STRATEGY, NearbyRequest, PRIMARY_STRATEGY, ResponseData,
    ResponseKind, SearchAttempt, SearchConfig, SearchError, SearchFilters, SearchPlan,
    SearchRequest, SearchResponse, UpstreamParams, build_nearby_url, build_url, param,
};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Homesift library.
///
/// This sets up structured logging with configurable levels and filtering.
/// `RUST_LOG` takes precedence over `level` when it is set. Calling this
/// more than once is harmless.
///
/// # Examples
///
/// ```rust
/// use homesift::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), homesift::error::HomesiftError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::HomesiftError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| error::HomesiftError::ConfigError(e.to_string()))?;
        Ok(())
    })
}
