//! Core property search functionality for the homesift library.
//!
//! This module provides the main [`PropertySearcher`] interface: it takes a
//! free-form query, works out what the user most likely meant, asks the
//! listings provider, falls back to looser interpretations when nothing
//! comes back, and returns normalized, distance-ranked properties.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use homesift::{PropertySearcher, SearchRequest};
//!
//! # async fn run() -> Result<(), homesift::error::HomesiftError> {
//! // Reads ZILLOW_URL, ZILLOW_API_KEY, ... from the environment
//! let searcher = PropertySearcher::from_env()?;
//!
//! let response = searcher.search(&SearchRequest::new("San Antonio, TX")).await?;
//! println!("{} homes via {:?}", response.total_results, response.successful_strategy);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use homesift_provider::{HttpProvider, PropertyProvider, ProviderConfig};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    analysis::{QueryDiagnostics, diagnose},
    error::HomesiftError,
    property::NormalizedProperty,
    search::{
        NearbyRequest, SearchConfig, SearchRequest, SearchResponse, detail_inner, nearby_inner,
        search_inner, suggestions_inner,
    },
};

/// The main property searcher.
///
/// Cheap to clone; clones share the provider and its connection pool.
///
/// # Examples
///
/// With an explicit provider configuration:
/// ```rust,no_run
/// use homesift::{PropertySearcher, SearchConfigBuilder, SearchFilters, SearchRequest};
/// use homesift_provider::ProviderConfig;
///
/// # async fn run() -> Result<(), homesift::error::HomesiftError> {
/// let upstream = ProviderConfig::builder("https://zillow-com1.p.rapidapi.com", "my-key")
///     .host("zillow-com1.p.rapidapi.com")
///     .build()?;
/// let searcher = PropertySearcher::connect(upstream)?
///     .with_config(SearchConfigBuilder::production().build());
///
/// let request = SearchRequest::new("3+ bedroom homes in Longview TX")
///     .with_filters(SearchFilters::new().apply().listing_status("ForSale"));
/// let response = searcher.search(&request).await?;
/// # Ok(())
/// # }
/// ```
pub struct PropertySearcher<P = HttpProvider> {
    provider: Arc<P>,
    upstream: Arc<ProviderConfig>,
    config: SearchConfig,
}

impl<P> Clone for PropertySearcher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            upstream: Arc::clone(&self.upstream),
            config: self.config.clone(),
        }
    }
}

impl PropertySearcher<HttpProvider> {
    /// Create a searcher backed by the HTTP provider.
    #[instrument(name = "Connect PropertySearcher", level = "info", skip_all)]
    pub fn connect(upstream: ProviderConfig) -> Result<Self, HomesiftError> {
        let provider = HttpProvider::new(upstream.clone())?;
        Ok(Self::with_provider(provider, upstream))
    }

    /// Create a searcher from the `ZILLOW_*` environment variables.
    ///
    /// Missing credentials are reported here, before any request is made.
    pub fn from_env() -> Result<Self, HomesiftError> {
        Self::connect(ProviderConfig::from_env()?)
    }
}

impl<P: PropertyProvider> PropertySearcher<P> {
    /// Create a searcher on top of any [`PropertyProvider`]. `upstream` is
    /// still needed to build request URLs.
    pub fn with_provider(provider: P, upstream: ProviderConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            upstream: Arc::new(upstream),
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn upstream(&self) -> &ProviderConfig {
        &self.upstream
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Search for properties matching a free-form query.
    ///
    /// An empty query with an origin becomes a nearby search around that
    /// origin; an empty query without one is rejected.
    #[instrument(name = "Property Search", level = "info", skip_all, fields(query = %request.query))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, HomesiftError> {
        if request.query.trim().is_empty()
            && let Some(origin) = request.origin
        {
            debug!("Empty query with a reference point, searching nearby");
            let nearby = NearbyRequest::new(origin).with_filters(request.filters.clone());
            return self.search_nearby(&nearby).await;
        }

        search_inner(&*self.provider, &self.upstream, &self.config, request)
            .await
            .map_err(From::from)
    }

    /// Shorthand for [`Self::search`] with no filters and no origin.
    pub async fn search_query(&self, query: &str) -> Result<SearchResponse, HomesiftError> {
        self.search(&SearchRequest::new(query)).await
    }

    /// Properties within a radius of a coordinate, nearest first.
    #[instrument(name = "Nearby Search", level = "info", skip_all, fields(point = %request.point))]
    pub async fn search_nearby(
        &self,
        request: &NearbyRequest,
    ) -> Result<SearchResponse, HomesiftError> {
        nearby_inner(&*self.provider, &self.upstream, &self.config, request)
            .await
            .map_err(From::from)
    }

    /// Full record for a single property.
    #[instrument(name = "Property Detail", level = "debug", skip(self))]
    pub async fn property_detail(&self, zpid: &str) -> Result<NormalizedProperty, HomesiftError> {
        detail_inner(&*self.provider, &self.upstream, zpid)
            .await
            .map_err(From::from)
    }

    /// Autocomplete candidates for partially typed text, as the provider returns them.
    #[instrument(name = "Location Suggestions", level = "debug", skip(self))]
    pub async fn location_suggestions(&self, text: &str) -> Result<Value, HomesiftError> {
        suggestions_inner(&*self.provider, &self.upstream, text)
            .await
            .map_err(From::from)
    }

    /// Explain how `query` would be searched, without calling upstream.
    pub fn analyze(&self, query: &str) -> QueryDiagnostics {
        diagnose(query)
    }
}

// === Builder Pattern ===

/// Builder for creating a [`PropertySearcher`] over HTTP with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct PropertySearcherBuilder {
    upstream: Option<ProviderConfig>,
    config: SearchConfig,
}

impl PropertySearcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this provider configuration instead of reading the environment.
    pub fn upstream(mut self, upstream: ProviderConfig) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn search_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the `PropertySearcher`.
    pub fn build(self) -> Result<PropertySearcher, HomesiftError> {
        let upstream = match self.upstream {
            Some(upstream) => upstream,
            None => ProviderConfig::from_env()?,
        };
        Ok(PropertySearcher::connect(upstream)?.with_config(self.config))
    }
}

#[cfg(test)]
mod tests {
    use homesift_provider::{ProviderError, Url};
    use serde_json::json;

    use super::*;
    use crate::{
        SearchConfigBuilder,
        geo::GeoPoint,
        search::{ResponseKind, SearchError},
    };

    /// Answers every request with the same body and remembers the last URL.
    struct StaticProvider {
        body: Value,
        last_url: std::sync::Mutex<Option<Url>>,
    }

    impl StaticProvider {
        fn new(body: Value) -> Self {
            Self {
                body,
                last_url: std::sync::Mutex::new(None),
            }
        }
    }

    impl PropertyProvider for StaticProvider {
        async fn get_json(&self, url: &Url) -> homesift_provider::Result<Value> {
            *self.last_url.lock().unwrap() = Some(url.clone());
            if self.body.is_null() {
                return Err(ProviderError::Unauthorized);
            }
            Ok(self.body.clone())
        }
    }

    fn searcher(body: Value) -> PropertySearcher<StaticProvider> {
        let upstream = ProviderConfig::builder("https://zillow.example.com", "key")
            .build()
            .unwrap();
        PropertySearcher::with_provider(StaticProvider::new(body), upstream)
            .with_config(SearchConfigBuilder::development().build())
    }

    #[tokio::test]
    async fn test_search_query() {
        let searcher = searcher(json!({ "props": [{ "zpid": 1 }] }));
        let response = searcher.search_query("26003").await.unwrap();
        // Every fan-out request returns the same zpid
        assert_eq!(response.total_results, 1);
        assert_eq!(response.available_listing_types.as_ref().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn test_empty_query_with_origin_searches_nearby() {
        let searcher = searcher(json!({ "props": [] }));
        let request = SearchRequest::new("").with_origin(GeoPoint::new(30.0, -97.0));
        let response = searcher.search(&request).await.unwrap();

        assert_eq!(response.search_type, ResponseKind::LocationBased);
        let url = searcher.provider().last_url.lock().unwrap().clone().unwrap();
        assert!(url.query().unwrap().contains("lat=30"));
    }

    #[tokio::test]
    async fn test_empty_query_without_origin() {
        let searcher = searcher(json!({ "props": [] }));
        let result = searcher.search(&SearchRequest::new("  ")).await;
        assert!(matches!(
            result,
            Err(HomesiftError::SearchError(SearchError::EmptyQuery))
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_surfaces() {
        let searcher = searcher(Value::Null);
        let err = searcher.search_query("Dallas, TX").await.unwrap_err();
        assert!(matches!(err, HomesiftError::SearchError(_)));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_clones_share_provider() {
        let searcher = searcher(json!({ "zpid": 9 }));
        let clone = searcher.clone();
        let property = clone.property_detail("9").await.unwrap();
        assert_eq!(property.zpid.as_deref(), Some("9"));
        assert!(Arc::ptr_eq(&searcher.provider, &clone.provider));
    }

    #[test]
    fn test_analyze_is_offline() {
        let searcher = searcher(Value::Null);
        let report = searcher.analyze("90210");
        assert!(report.patterns.is_zip_code);
        assert!(searcher.provider().last_url.lock().unwrap().is_none());
    }

    #[test]
    fn test_builder_with_explicit_upstream() {
        let upstream = ProviderConfig::builder("https://zillow.example.com", "key")
            .build()
            .unwrap();
        let searcher = PropertySearcherBuilder::new()
            .upstream(upstream)
            .search_config(SearchConfigBuilder::production().build())
            .build()
            .unwrap();
        assert!(!searcher.config().include_attempt_log);
        assert_eq!(searcher.upstream().base_url, "https://zillow.example.com");
    }
}
