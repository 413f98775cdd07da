use serde::{Serialize, Serializer};

use super::{AppliedFilters, ListingStatus};
use crate::{
    analysis::{ExtractedData, SearchAnalysis, SearchType},
    geo::GeoPoint,
    property::NormalizedProperty,
};

/// Label of the primary strategy in the attempt log.
pub const PRIMARY_STRATEGY: &str = "primary";
/// Reported when no strategy produced a record.
pub const NO_STRATEGY: &str = "none";

pub(crate) fn fallback_label(index: usize) -> String {
    format!("fallback-{}", index + 1)
}

/// One upstream request made while serving a search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAttempt {
    /// `"primary"` or `"fallback-N"` (1-based)
    pub strategy: String,
    /// Set for requests issued as part of a per-status fan-out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_status: Option<ListingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<SearchAnalysis>,
    pub url: String,
    /// The request completed and produced at least one record
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The `searchType` reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Query(SearchType),
    /// Coordinate search over every listing status
    LocationBased,
    /// Coordinate search with filters applied
    LocationBasedFiltered,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query(search_type) => search_type.as_str(),
            Self::LocationBased => "location-based",
            Self::LocationBasedFiltered => "location-based-filtered",
        }
    }
}

impl Serialize for ResponseKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Query(ExtractedData),
    Nearby { location: GeoPoint, radius: f64 },
}

/// Everything a search hands back: the normalized listings plus enough
/// metadata to explain how they were found.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub nearby_homes: Vec<NormalizedProperty>,
    pub search_type: ResponseKind,
    pub confidence: f64,
    pub original_query: String,
    pub extracted_data: ResponseData,
    pub total_results: usize,
    pub filters_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_filters: Option<AppliedFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_attempts: Option<Vec<SearchAttempt>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_listing_types: Option<Vec<ListingStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<GeoPoint>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.nearby_homes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nearby_homes.len()
    }

    /// Classified type for query searches, `None` for coordinate searches.
    pub fn query_type(&self) -> Option<SearchType> {
        match self.search_type {
            ResponseKind::Query(search_type) => Some(search_type),
            _ => None,
        }
    }
}
