//! Query interpretation.
//!
//! A raw search string is classified into a [`SearchAnalysis`]: what kind of
//! query it is, how much the heuristics trust that reading, which upstream
//! endpoint fits, and the fields pulled out of the text. The extracted fields
//! are a tagged union over the search type, so a zipcode analysis can only
//! ever carry a zipcode.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use thiserror::Error;

mod classify;
mod diagnostics;
mod fallback;

pub use classify::{classify, extract_state_abbreviation, normalize_location};
pub use diagnostics::{ExtractedHints, PatternFlags, QueryDiagnostics, SAMPLE_QUERIES, diagnose};
pub use fallback::{MAX_FALLBACKS, generate_fallbacks};

/// The classified intent of a raw query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Zipcode,
    Address,
    Location,
    BedroomQuery,
    School,
    Landmark,
    Descriptive,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zipcode => "zipcode",
            Self::Address => "address",
            Self::Location => "location",
            Self::BedroomQuery => "bedroom_query",
            Self::School => "school",
            Self::Landmark => "landmark",
            Self::Descriptive => "descriptive",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream endpoint family an analysis should be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Single-property detail lookup
    Property,
    /// Multi-result search
    Search,
}

/// Fields extracted from a query, one variant per [`SearchType`].
///
/// Serializes as a flat object (`{"zipcode": "26003"}`, `{"bedrooms": "3",
/// "location": "Longview TX"}`), omitting absent optionals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractedData {
    Zipcode {
        zipcode: String,
    },
    Address {
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
    Location {
        location: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
    BedroomQuery {
        /// Digits exactly as captured from the query
        bedrooms: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },
    School {
        school: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },
    Landmark {
        landmark: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },
    Descriptive {
        location: String,
    },
}

impl ExtractedData {
    pub fn search_type(&self) -> SearchType {
        match self {
            Self::Zipcode { .. } => SearchType::Zipcode,
            Self::Address { .. } => SearchType::Address,
            Self::Location { .. } => SearchType::Location,
            Self::BedroomQuery { .. } => SearchType::BedroomQuery,
            Self::School { .. } => SearchType::School,
            Self::Landmark { .. } => SearchType::Landmark,
            Self::Descriptive { .. } => SearchType::Descriptive,
        }
    }

    /// The free-text location, when this variant carries one
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Location { location, .. } | Self::Descriptive { location } => {
                Some(location.as_str())
            }
            Self::BedroomQuery { location, .. }
            | Self::School { location, .. }
            | Self::Landmark { location, .. } => location.as_deref(),
            Self::Zipcode { .. } | Self::Address { .. } => None,
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            Self::Address { city, .. } | Self::Location { city, .. } => city.as_deref(),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Address { state, .. } | Self::Location { state, .. } => state.as_deref(),
            _ => None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Address { address, .. } => Some(address.as_str()),
            _ => None,
        }
    }

    pub fn bedrooms(&self) -> Option<&str> {
        match self {
            Self::BedroomQuery { bedrooms, .. } => Some(bedrooms.as_str()),
            _ => None,
        }
    }
}

/// A classified query: intent, trust in that intent, endpoint and extracted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchAnalysis {
    pub confidence: f64,
    pub suggested_endpoint: Endpoint,
    pub extracted_data: ExtractedData,
}

impl SearchAnalysis {
    pub fn new(confidence: f64, suggested_endpoint: Endpoint, extracted_data: ExtractedData) -> Self {
        Self {
            confidence,
            suggested_endpoint,
            extracted_data,
        }
    }

    /// A plain location search, the shape every fallback takes.
    pub fn location(
        location: impl Into<String>,
        confidence: f64,
        city: Option<String>,
        state: Option<String>,
    ) -> Self {
        Self::new(
            confidence,
            Endpoint::Search,
            ExtractedData::Location {
                location: location.into(),
                city,
                state,
            },
        )
    }

    pub fn search_type(&self) -> SearchType {
        self.extracted_data.search_type()
    }

    /// Type-specific sanity checks. A failure is diagnostic only; callers log
    /// it and keep going with the analysis as-is.
    pub fn validate(&self) -> Result<(), InvalidAnalysis> {
        let invalid = |reason: &str| InvalidAnalysis {
            search_type: self.search_type(),
            reason: reason.to_string(),
        };

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(invalid("confidence outside [0, 1]"));
        }

        match &self.extracted_data {
            ExtractedData::Zipcode { zipcode } => {
                if !classify::is_zipcode(zipcode) {
                    return Err(invalid("zipcode is not 5 digits (optionally +4)"));
                }
            }
            ExtractedData::Address { address, .. } => {
                if address.chars().count() <= 5 {
                    return Err(invalid("address too short"));
                }
            }
            ExtractedData::Location { location, .. } => {
                if location.chars().count() <= 1 {
                    return Err(invalid("location too short"));
                }
            }
            ExtractedData::BedroomQuery { bedrooms, .. } => {
                if bedrooms.is_empty() || !bedrooms.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid("bedroom count is not numeric"));
                }
            }
            ExtractedData::School { school, .. } => {
                if school.chars().count() <= 2 {
                    return Err(invalid("school name too short"));
                }
            }
            ExtractedData::Landmark { landmark, .. } => {
                if landmark.chars().count() <= 2 {
                    return Err(invalid("landmark name too short"));
                }
            }
            ExtractedData::Descriptive { location } => {
                if self.confidence < 0.3 {
                    return Err(invalid("descriptive confidence below 0.3"));
                }
                if location.is_empty() {
                    return Err(invalid("empty query"));
                }
            }
        }
        Ok(())
    }
}

impl Serialize for SearchAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SearchAnalysis", 4)?;
        state.serialize_field("searchType", &self.search_type())?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("suggestedEndpoint", &self.suggested_endpoint)?;
        state.serialize_field("extractedData", &self.extracted_data)?;
        state.end()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {search_type} analysis: {reason}")]
pub struct InvalidAnalysis {
    pub search_type: SearchType,
    pub reason: String,
}

/// `max(floor, base - penalty)`, rounded to two decimals so that e.g.
/// `0.9 - 0.2` compares equal to `0.7`.
pub fn adjust_confidence(base: f64, penalty: f64, floor: f64) -> f64 {
    ((base - penalty).max(floor) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_adjust_confidence() {
        assert_eq!(adjust_confidence(0.9, 0.2, 0.3), 0.7);
        assert_eq!(adjust_confidence(0.8, 0.1, 0.3), 0.7);
        assert_eq!(adjust_confidence(0.85, 0.3, 0.4), 0.55);
        assert_eq!(adjust_confidence(0.4, 0.2, 0.3), 0.3);
        assert_eq!(adjust_confidence(0.4, 0.2, 0.5), 0.5);
    }

    #[test]
    fn test_analysis_serialization() {
        let analysis = SearchAnalysis::new(
            0.8,
            Endpoint::Search,
            ExtractedData::BedroomQuery {
                bedrooms: "3".into(),
                location: Some("Longview TX".into()),
            },
        );

        assert_eq!(
            serde_json::to_value(&analysis).unwrap(),
            json!({
                "searchType": "bedroom_query",
                "confidence": 0.8,
                "suggestedEndpoint": "search",
                "extractedData": { "bedrooms": "3", "location": "Longview TX" }
            })
        );
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let data = ExtractedData::School {
            school: "Johnson High School".into(),
            location: None,
        };
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({ "school": "Johnson High School" })
        );
    }

    #[test]
    fn test_validation() {
        let zip = SearchAnalysis::new(
            0.9,
            Endpoint::Search,
            ExtractedData::Zipcode {
                zipcode: "2600".into(),
            },
        );
        assert!(zip.validate().is_err());

        let zip = SearchAnalysis::new(
            0.9,
            Endpoint::Search,
            ExtractedData::Zipcode {
                zipcode: "26003-1234".into(),
            },
        );
        assert!(zip.validate().is_ok());

        let out_of_range = SearchAnalysis::location("Dallas, TX", 1.2, None, None);
        assert!(out_of_range.validate().is_err());

        let short = SearchAnalysis::location("D", 0.5, None, None);
        let err = short.validate().unwrap_err();
        assert_eq!(err.search_type, SearchType::Location);
        assert_eq!(err.to_string(), "Invalid location analysis: location too short");

        let bedrooms = SearchAnalysis::new(
            0.8,
            Endpoint::Search,
            ExtractedData::BedroomQuery {
                bedrooms: "three".into(),
                location: None,
            },
        );
        assert!(bedrooms.validate().is_err());
    }

    #[test]
    fn test_accessors() {
        let data = ExtractedData::Address {
            address: "3508 Hamilton Pl, Schertz, TX 78154".into(),
            city: Some("Schertz".into()),
            state: Some("TX".into()),
        };
        assert_eq!(data.search_type(), SearchType::Address);
        assert_eq!(data.location(), None);
        assert_eq!(data.city(), Some("Schertz"));
        assert_eq!(data.state(), Some("TX"));
        assert_eq!(data.address(), Some("3508 Hamilton Pl, Schertz, TX 78154"));
        assert_eq!(data.bedrooms(), None);
    }
}
