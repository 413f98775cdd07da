//! Offline explanation of how a query would be interpreted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::{
    SearchAnalysis,
    classify::{self, BEDROOM_RE, SCHOOL_RE},
    extract_state_abbreviation, generate_fallbacks,
};

/// Queries that exercise every classifier branch, handy for smoke tests and demos.
pub const SAMPLE_QUERIES: &[&str] = &[
    "26003",
    "San Antonio, TX",
    "Johnson High School, San Antonio, TX",
    "3+ bedroom homes in Longview TX",
    "Zoo, Apple Valley, MN",
    "Bedroom, Upper Corner Unit, Freshly Painted",
    "21232 Hetke Dr Farmington Hills, MI 48335",
    "3508 Hamilton PI Schertz, TX 78154",
    "Dallas, TX",
    "90210",
    "4 bedroom house in Austin, TX",
    "University of Texas, Austin, TX",
    "Central Park, New York, NY",
];

static EXACT_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\s+[\w\s]+(?:,\s*[\w\s]+)*$").expect("valid address regex"));
static ZPID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([0-9]{8,})\b").expect("valid zpid regex"));
static POINT_OF_INTEREST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:zoo|park|mall|airport|hospital|library|museum|stadium|arena|theater|centre|center)\b",
    )
    .expect("valid landmark regex")
});
static DESCRIPTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)bedroom|bathroom|kitchen|living|room|unit|corner|upper|lower|floor|painted|renovated",
    )
    .expect("valid descriptive regex")
});
static CITY_STATE_LOOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^,]+,\s*(?:[A-Z]{2}|[A-Za-z\s]+)$").expect("valid city/state regex")
});
static HOMES_IN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:homes?|properties?|houses?)\s+in\s+([\w\s,]+)$")
        .expect("valid homes-in regex")
});

/// Raw pattern hits, independent of classifier precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFlags {
    pub is_zip_code: bool,
    pub is_exact_address: bool,
    pub contains_zpid: bool,
    pub contains_bedrooms: bool,
    pub is_school_search: bool,
    pub is_landmark_search: bool,
    pub is_descriptive_search: bool,
    pub is_city_state: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedHints {
    /// First run of eight or more digits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zpid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedroom_count: Option<String>,
    /// Text after "homes in" / "properties in" / "houses in"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_from_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_abbreviation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDiagnostics {
    pub query: String,
    pub analysis: SearchAnalysis,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
    pub fallback_strategies: Vec<SearchAnalysis>,
    pub patterns: PatternFlags,
    pub extracted_info: ExtractedHints,
    pub recommendations: Vec<String>,
}

/// Classify `query` and report everything the engine would do with it,
/// without touching the network.
pub fn diagnose(query: &str) -> QueryDiagnostics {
    let analysis = classify::classify(query);
    let validation_error = analysis.validate().err().map(|e| e.to_string());
    let fallback_strategies = generate_fallbacks(query, &analysis);
    let patterns = pattern_flags(query);
    let extracted_info = ExtractedHints {
        zpid: ZPID_RE.captures(query).map(|c| c[1].to_string()),
        bedroom_count: BEDROOM_RE.captures(query).map(|c| c[1].to_string()),
        location_from_pattern: HOMES_IN_RE.captures(query).map(|c| c[1].trim().to_string()),
        state_abbreviation: extract_state_abbreviation(query),
    };
    let recommendations = recommendations(query, &analysis, &patterns);

    QueryDiagnostics {
        query: query.to_string(),
        is_valid: validation_error.is_none(),
        validation_error,
        analysis,
        fallback_strategies,
        patterns,
        extracted_info,
        recommendations,
    }
}

fn pattern_flags(query: &str) -> PatternFlags {
    PatternFlags {
        is_zip_code: classify::is_zipcode(query),
        is_exact_address: EXACT_ADDRESS_RE.is_match(query),
        contains_zpid: ZPID_RE.is_match(query),
        contains_bedrooms: BEDROOM_RE.is_match(query),
        is_school_search: SCHOOL_RE.is_match(query),
        is_landmark_search: POINT_OF_INTEREST_RE.is_match(query),
        is_descriptive_search: DESCRIPTIVE_RE.is_match(query) && query.contains(','),
        is_city_state: CITY_STATE_LOOSE_RE.is_match(query),
    }
}

fn recommendations(query: &str, analysis: &SearchAnalysis, patterns: &PatternFlags) -> Vec<String> {
    let has_location = analysis.extracted_data.location().is_some();
    let mut out = Vec::new();

    if analysis.confidence < 0.5 {
        out.push("Low confidence search; consider using more specific terms".to_string());
    }
    if patterns.is_descriptive_search && !has_location {
        out.push("Descriptive search without a clear location; try adding city and state".to_string());
    }
    if patterns.contains_bedrooms && !patterns.is_school_search && !has_location {
        out.push(
            "Bedroom query without a location; try 'X bedroom homes in City, ST'".to_string(),
        );
    }
    if query.chars().count() < 5 {
        out.push("Very short query; consider adding more details".to_string());
    }
    if !patterns.is_zip_code && !patterns.is_exact_address && !query.contains(',') {
        out.push("Consider adding city and state for more accurate results".to_string());
    }
    if patterns.is_school_search || patterns.is_landmark_search {
        out.push("School or landmark search; results cover nearby properties".to_string());
    }
    out
}
