//! Search requests and their translation into upstream URLs.

use homesift_provider::{ProviderConfig, Url};
use serde::{Deserialize, Serialize};

use super::{Result, SearchFilters};
use crate::{
    analysis::{Endpoint, ExtractedData, SearchAnalysis},
    geo::GeoPoint,
};

/// Upstream query parameter names.
pub mod param {
    pub const LOCATION: &str = "location";
    pub const ADDRESS: &str = "address";
    pub const ZPID: &str = "zpid";
    pub const QUERY: &str = "q";
    pub const STATUS_TYPE: &str = "status_type";
    pub const BEDS_MIN: &str = "bedsMin";
    pub const MIN_PRICE: &str = "minPrice";
    pub const SQFT_MIN: &str = "sqftMin";
    pub const BUILD_YEAR_MIN: &str = "buildYearMin";
    pub const BUILD_YEAR_MAX: &str = "buildYearMax";
    pub const LOT_SIZE: &str = "lotSize";
    pub const LAT: &str = "lat";
    pub const LNG: &str = "lng";
    pub const RADIUS: &str = "radius";
}

/// A free-text property search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    /// Reference point for distance ranking
    pub origin: Option<GeoPoint>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_origin(mut self, origin: GeoPoint) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// A coordinate-and-radius search with no query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    pub point: GeoPoint,
    /// Miles; the configured default when absent
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub filters: SearchFilters,
}

impl NearbyRequest {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            radius: None,
            filters: SearchFilters::default(),
        }
    }

    pub fn with_radius(mut self, miles: f64) -> Self {
        self.radius = Some(miles);
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Ordered query parameters where setting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamParams(Vec<(&'static str, String)>);

impl UpstreamParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Overlay `other`, skipping blank values.
    fn merge(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            if !value.trim().is_empty() {
                self.set(key, value);
            }
        }
    }

    fn write_to(&self, url: &mut Url) {
        if !self.is_empty() {
            url.query_pairs_mut().extend_pairs(self.iter());
        }
    }
}

/// Build the upstream URL for `analysis`.
///
/// The endpoint follows `suggested_endpoint`. Parameters inferred from the
/// extracted data come first; explicit `params` are applied last and win.
pub fn build_url(
    config: &ProviderConfig,
    analysis: &SearchAnalysis,
    params: &UpstreamParams,
) -> Result<Url> {
    let on_property = analysis.suggested_endpoint == Endpoint::Property;
    let mut url = if on_property {
        config.detail_url()?
    } else {
        config.search_url()?
    };

    let mut query = UpstreamParams::new();
    match &analysis.extracted_data {
        ExtractedData::Zipcode { zipcode } => query.set(param::LOCATION, zipcode.as_str()),
        ExtractedData::Address { address, .. } => {
            let key = if on_property {
                param::ADDRESS
            } else {
                param::LOCATION
            };
            query.set(key, address.as_str());
        }
        ExtractedData::Location { location, .. } | ExtractedData::Descriptive { location } => {
            query.set(param::LOCATION, location.as_str());
        }
        ExtractedData::BedroomQuery { bedrooms, location } => {
            if let Some(location) = location {
                query.set(param::LOCATION, location.as_str());
            }
            if !params.contains(param::BEDS_MIN) {
                query.set(param::BEDS_MIN, bedrooms.as_str());
            }
        }
        ExtractedData::School {
            school: name,
            location,
        }
        | ExtractedData::Landmark {
            landmark: name,
            location,
        } => {
            query.set(param::LOCATION, location.as_deref().unwrap_or(name));
        }
    }

    query.merge(params);
    query.write_to(&mut url);
    Ok(url)
}

/// Search-endpoint URL for everything within `radius_miles` of `point`.
pub fn build_nearby_url(
    config: &ProviderConfig,
    point: GeoPoint,
    radius_miles: f64,
    params: &UpstreamParams,
) -> Result<Url> {
    let mut url = config.search_url()?;
    let mut query = UpstreamParams::new()
        .with(param::LAT, point.lat.to_string())
        .with(param::LNG, point.lng.to_string())
        .with(param::RADIUS, radius_miles.to_string());
    query.merge(params);
    query.write_to(&mut url);
    Ok(url)
}

pub(crate) fn build_detail_url(config: &ProviderConfig, zpid: &str) -> Result<Url> {
    let mut url = config.detail_url()?;
    url.query_pairs_mut().append_pair(param::ZPID, zpid);
    Ok(url)
}

pub(crate) fn build_suggestion_url(config: &ProviderConfig, text: &str) -> Result<Url> {
    let mut url = config.suggestion_url()?;
    url.query_pairs_mut().append_pair(param::QUERY, text);
    Ok(url)
}
