//! Caller-supplied filters and listing statuses.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use super::request::{UpstreamParams, param};
use crate::analysis::SearchAnalysis;

/// Listing status understood by the upstream `status_type` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    ForSale,
    RecentlySold,
    ForRent,
    /// Anything else, forwarded untouched
    Other(String),
}

impl ListingStatus {
    /// Statuses fetched when the caller has not asked for filtering.
    pub const FANOUT: [Self; 3] = [Self::ForSale, Self::RecentlySold, Self::ForRent];

    pub fn as_str(&self) -> &str {
        match self {
            Self::ForSale => "ForSale",
            Self::RecentlySold => "RecentlySold",
            Self::ForRent => "ForRent",
            Self::Other(raw) => raw,
        }
    }

    /// Split a comma-joined list, dropping blanks.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::from)
            .collect()
    }
}

impl From<&str> for ListingStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "ForSale" => Self::ForSale,
            "RecentlySold" => Self::RecentlySold,
            "ForRent" => Self::ForRent,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for ListingStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ListingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ListingStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Optional refinements on top of the query.
///
/// Nothing here reaches upstream unless `apply_filters` is set; without it a
/// search fans out over every listing status instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    /// Raw status, possibly comma-joined (`"ForSale,ForRent"`)
    pub listing_status: Option<String>,
    pub beds_min: Option<u32>,
    pub price_min: Option<u64>,
    pub sqft_min: Option<u32>,
    pub build_year_min: Option<i32>,
    pub build_year_max: Option<i32>,
    pub lot_size: Option<u64>,
    pub apply_filters: bool,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn filtering on.
    pub fn apply(mut self) -> Self {
        self.apply_filters = true;
        self
    }

    pub fn listing_status(mut self, status: impl Into<String>) -> Self {
        self.listing_status = Some(status.into());
        self
    }

    pub fn beds_min(mut self, beds: u32) -> Self {
        self.beds_min = Some(beds);
        self
    }

    pub fn price_min(mut self, price: u64) -> Self {
        self.price_min = Some(price);
        self
    }

    pub fn sqft_min(mut self, sqft: u32) -> Self {
        self.sqft_min = Some(sqft);
        self
    }

    pub fn build_years(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.build_year_min = min;
        self.build_year_max = max;
        self
    }

    pub fn lot_size(mut self, lot_size: u64) -> Self {
        self.lot_size = Some(lot_size);
        self
    }

    /// Statuses named by `listing_status`, empty when unset.
    pub fn statuses(&self) -> Vec<ListingStatus> {
        self.listing_status
            .as_deref()
            .map(ListingStatus::parse_list)
            .unwrap_or_default()
    }

    /// Filtering is on and more than one status was asked for.
    pub fn is_multi_status(&self) -> bool {
        self.apply_filters
            && self
                .listing_status
                .as_deref()
                .is_some_and(|status| status.contains(','))
    }

    /// Upstream parameters implied by these filters.
    ///
    /// Empty unless `apply_filters` is set. An explicit `beds_min` beats a bedroom
    /// count extracted from the query. `status_type` is only set for a single status;
    /// multi-status searches add it per request.
    pub fn upstream_params(&self, analysis: Option<&SearchAnalysis>) -> UpstreamParams {
        let mut params = UpstreamParams::new();
        if !self.apply_filters {
            return params;
        }

        let beds = self
            .beds_min
            .map(|b| b.to_string())
            .or_else(|| {
                analysis
                    .and_then(|a| a.extracted_data.bedrooms())
                    .map(str::to_string)
            });
        if let Some(beds) = beds {
            params.set(param::BEDS_MIN, beds);
        }

        if let Some(status) = self.listing_status.as_deref()
            && !status.contains(',')
        {
            params.set(param::STATUS_TYPE, status);
        }

        let numeric = [
            (param::MIN_PRICE, self.price_min.map(|v| v.to_string())),
            (param::SQFT_MIN, self.sqft_min.map(|v| v.to_string())),
            (param::BUILD_YEAR_MIN, self.build_year_min.map(|v| v.to_string())),
            (param::BUILD_YEAR_MAX, self.build_year_max.map(|v| v.to_string())),
            (param::LOT_SIZE, self.lot_size.map(|v| v.to_string())),
        ];
        for (key, value) in numeric {
            if let Some(value) = value {
                params.set(key, value);
            }
        }
        params
    }

    /// Echo of the filters for the response, `None` when filtering is off.
    pub fn applied(&self) -> Option<AppliedFilters> {
        self.apply_filters.then(|| AppliedFilters {
            listing_status: self.statuses(),
            beds_min: self.beds_min,
            price_min: self.price_min,
            sqft_min: self.sqft_min,
            build_year_min: self.build_year_min,
            build_year_max: self.build_year_max,
            lot_size: self.lot_size,
        })
    }
}

/// The filters a response was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub listing_status: Vec<ListingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqft_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_year_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_year_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::analysis::classify;

    #[test]
    fn test_listing_status_parsing() {
        assert_eq!(ListingStatus::from("ForSale"), ListingStatus::ForSale);
        assert_eq!(
            ListingStatus::from("forsale"),
            ListingStatus::Other("forsale".into())
        );
        assert_eq!(
            ListingStatus::parse_list("ForSale, ForRent,,"),
            vec![ListingStatus::ForSale, ListingStatus::ForRent]
        );
        assert_eq!(ListingStatus::RecentlySold.to_string(), "RecentlySold");
    }

    #[test]
    fn test_filters_off_means_no_params() {
        let filters = SearchFilters::new().listing_status("ForSale").beds_min(2);
        assert!(filters.upstream_params(None).is_empty());
        assert!(!filters.is_multi_status());
        assert_eq!(filters.applied(), None);
    }

    #[test]
    fn test_single_status_params() {
        let filters = SearchFilters::new()
            .apply()
            .listing_status("ForRent")
            .beds_min(2)
            .price_min(250000)
            .build_years(Some(1990), None);
        let params = filters.upstream_params(None);

        assert_eq!(params.get(param::STATUS_TYPE), Some("ForRent"));
        assert_eq!(params.get(param::BEDS_MIN), Some("2"));
        assert_eq!(params.get(param::MIN_PRICE), Some("250000"));
        assert_eq!(params.get(param::BUILD_YEAR_MIN), Some("1990"));
        assert_eq!(params.get(param::BUILD_YEAR_MAX), None);
    }

    #[test]
    fn test_multi_status_omits_status_type() {
        let filters = SearchFilters::new().apply().listing_status("ForSale,ForRent");
        assert!(filters.is_multi_status());
        assert_eq!(filters.upstream_params(None).get(param::STATUS_TYPE), None);
        assert_eq!(
            filters.statuses(),
            vec![ListingStatus::ForSale, ListingStatus::ForRent]
        );
    }

    #[test]
    fn test_explicit_beds_min_wins() {
        let analysis = classify("3+ bedroom homes in Longview TX");
        let filters = SearchFilters::new().apply().beds_min(5);
        assert_eq!(
            filters.upstream_params(Some(&analysis)).get(param::BEDS_MIN),
            Some("5")
        );
    }

    #[test]
    fn test_extracted_bedrooms_fill_in() {
        let analysis = classify("3+ bedroom homes in Longview TX");
        let filters = SearchFilters::new().apply().price_min(100_000);
        assert_eq!(
            filters.upstream_params(Some(&analysis)).get(param::BEDS_MIN),
            Some("3")
        );
    }

    #[test]
    fn test_applied_filters_serialization() {
        let filters = SearchFilters::new()
            .apply()
            .listing_status("ForSale,RecentlySold")
            .sqft_min(1200);
        assert_eq!(
            serde_json::to_value(filters.applied().unwrap()).unwrap(),
            json!({ "listingStatus": ["ForSale", "RecentlySold"], "sqftMin": 1200 })
        );
    }

    #[test]
    fn test_filters_deserialize_from_camel_case() {
        let filters: SearchFilters = serde_json::from_value(json!({
            "listingStatus": "ForSale",
            "bedsMin": 3,
            "applyFilters": true
        }))
        .unwrap();
        assert!(filters.apply_filters);
        assert_eq!(filters.beds_min, Some(3));
    }
}
