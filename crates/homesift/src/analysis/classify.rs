//! Heuristic query classifier.
//!
//! A fixed precedence of regex checks over the trimmed, lower-cased query.
//! The first rule that matches decides the search type; the confidence
//! attached to each rule is part of the contract with the fallback generator
//! and with callers that rank or display results.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{Endpoint, ExtractedData, SearchAnalysis};

pub(super) const ZIPCODE_CONFIDENCE: f64 = 0.9;
pub(super) const ADDRESS_CONFIDENCE: f64 = 0.85;
pub(super) const CITY_STATE_CONFIDENCE: f64 = 0.8;
pub(super) const BEDROOM_CONFIDENCE: f64 = 0.8;
pub(super) const SCHOOL_CONFIDENCE: f64 = 0.75;
pub(super) const LANDMARK_CONFIDENCE: f64 = 0.7;
pub(super) const DESCRIPTIVE_CONFIDENCE: f64 = 0.4;

static ZIPCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}(?:-[0-9]{4})?$").expect("valid zipcode regex"));

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[0-9]+\s+[\w\s]+(?:st|street|ave|avenue|rd|road|dr|drive|ln|lane|ct|court|pl|place|pi|way|blvd|boulevard|cir|circle)\s*,?\s*[\w\s]+,\s*[a-z]{2}(?:\s+[0-9]{5})?$",
    )
    .expect("valid address regex")
});

static CITY_STATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\w\s]+,\s*[a-z]{2}$").expect("valid city/state regex"));

// Longest alternatives first so stripping the phrase leaves no "rooms" behind.
pub(super) static BEDROOM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9]+)\+?\s*(?:bedrooms|bedroom|bed|br)").expect("valid bedroom regex")
});

static BEDROOM_LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:homes?|properties?|houses?)\s+(?:in|near)\s+([\w\s,]+)$")
        .expect("valid bedroom location regex")
});

static HOMES_PHRASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)homes?\s*(?:in|near)?").expect("valid homes regex"));

pub(super) static SCHOOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:school|elementary|middle|high|college|university)\b")
        .expect("valid school regex")
});

pub(super) static LANDMARK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:zoo|park|mall|hospital|airport|university|college|beach|lake|mountain)\b")
        .expect("valid landmark regex")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static EMPTY_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*,").expect("valid regex"));
static STATE_ABBREVIATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2})\b").expect("valid state regex"));

pub(super) fn is_zipcode(text: &str) -> bool {
    ZIPCODE_RE.is_match(text)
}

/// Classify a raw query. Total and deterministic: anything that matches no
/// rule is a descriptive search over the whole query.
///
/// Precedence: zipcode, street address, `City, ST`, bedroom phrase, school,
/// landmark, descriptive.
pub fn classify(query: &str) -> SearchAnalysis {
    let trimmed = query.trim();
    let clean = trimmed.to_lowercase();

    let analysis = if ZIPCODE_RE.is_match(&clean) {
        SearchAnalysis::new(
            ZIPCODE_CONFIDENCE,
            Endpoint::Search,
            ExtractedData::Zipcode {
                zipcode: trimmed.to_string(),
            },
        )
    } else if ADDRESS_RE.is_match(&clean) {
        classify_address(trimmed)
    } else if CITY_STATE_RE.is_match(&clean) {
        classify_city_state(trimmed)
    } else if let Some(captures) = BEDROOM_RE.captures(&clean) {
        let bedrooms = captures[1].to_string();
        SearchAnalysis::new(
            BEDROOM_CONFIDENCE,
            Endpoint::Search,
            ExtractedData::BedroomQuery {
                bedrooms,
                location: bedroom_location(trimmed),
            },
        )
    } else if SCHOOL_RE.is_match(&clean) {
        let (school, location) = split_name_and_location(trimmed);
        SearchAnalysis::new(
            SCHOOL_CONFIDENCE,
            Endpoint::Search,
            ExtractedData::School { school, location },
        )
    } else if LANDMARK_RE.is_match(&clean) {
        let (landmark, location) = split_name_and_location(trimmed);
        SearchAnalysis::new(
            LANDMARK_CONFIDENCE,
            Endpoint::Search,
            ExtractedData::Landmark { landmark, location },
        )
    } else {
        SearchAnalysis::new(
            DESCRIPTIVE_CONFIDENCE,
            Endpoint::Search,
            ExtractedData::Descriptive {
                location: trimmed.to_string(),
            },
        )
    };

    debug!(
        query = trimmed,
        search_type = %analysis.search_type(),
        confidence = analysis.confidence,
        "Classified query"
    );
    analysis
}

fn classify_address(trimmed: &str) -> SearchAnalysis {
    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    let city = (parts.len() > 1).then(|| parts[parts.len() - 2].to_string());
    let state = parts
        .last()
        .and_then(|last| last.split_whitespace().next())
        .map(str::to_string);

    SearchAnalysis::new(
        ADDRESS_CONFIDENCE,
        Endpoint::Property,
        ExtractedData::Address {
            address: trimmed.to_string(),
            city,
            state,
        },
    )
}

fn classify_city_state(trimmed: &str) -> SearchAnalysis {
    let mut parts = trimmed.split(',').map(str::trim);
    let city = parts.next().map(str::to_string);
    let state = parts.next().map(str::to_string);

    SearchAnalysis::new(
        CITY_STATE_CONFIDENCE,
        Endpoint::Search,
        ExtractedData::Location {
            location: trimmed.to_string(),
            city,
            state,
        },
    )
}

/// Location part of a bedroom query: an explicit "homes in/near X" clause
/// wins, otherwise whatever is left once the bedroom phrase is removed.
fn bedroom_location(trimmed: &str) -> Option<String> {
    let location = match BEDROOM_LOCATION_RE.captures(trimmed) {
        Some(captures) => captures[1].trim().to_string(),
        None => {
            let without_bedrooms = BEDROOM_RE.replacen(trimmed, 1, "");
            HOMES_PHRASE_RE
                .replacen(&without_bedrooms, 1, "")
                .trim()
                .to_string()
        }
    };
    (!location.is_empty()).then_some(location)
}

/// `"Name, rest, of, it"` into the name and everything after the first comma.
fn split_name_and_location(trimmed: &str) -> (String, Option<String>) {
    match trimmed.split_once(',') {
        Some((name, rest)) => {
            let rest = rest.trim();
            (
                name.trim().to_string(),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None => (trimmed.to_string(), None),
    }
}

/// Collapse whitespace and drop empty comma segments and stray leading/trailing commas.
pub fn normalize_location(location: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(location.trim(), " ");
    let mut normalized = collapsed.into_owned();
    while EMPTY_SEGMENT_RE.is_match(&normalized) {
        normalized = EMPTY_SEGMENT_RE.replace_all(&normalized, ",").into_owned();
    }
    normalized
        .trim_start_matches(',')
        .trim_end_matches(',')
        .trim()
        .to_string()
}

/// The last standalone two-capital-letter token, e.g. `"TX"` in `"Austin, TX 78701"`.
pub fn extract_state_abbreviation(text: &str) -> Option<String> {
    STATE_ABBREVIATION_RE
        .captures_iter(text)
        .last()
        .map(|captures| captures[1].to_string())
}
