//! Alternative interpretations of a query, tried when the primary one finds nothing.

use itertools::Itertools;
use tracing::debug;

use super::{SearchAnalysis, SearchType, adjust_confidence};

/// Upper bound on the number of fallback strategies per query.
pub const MAX_FALLBACKS: usize = 3;

/// Build up to [`MAX_FALLBACKS`] plain-location strategies for `original_query`.
///
/// Candidates, in rule order:
/// 1. the whole query as a location, unless the primary already was one
/// 2. the extracted location, when it differs from the query
/// 3. the address itself, for address queries
/// 4. `"City, ST"` when both were extracted
/// 5. the bare state, while fewer than three candidates exist
///
/// The result has unique locations (first occurrence wins) and
/// non-increasing confidence.
pub fn generate_fallbacks(original_query: &str, primary: &SearchAnalysis) -> Vec<SearchAnalysis> {
    let query = original_query.trim();
    let data = &primary.extracted_data;
    let base = primary.confidence;
    let mut candidates: Vec<SearchAnalysis> = Vec::with_capacity(5);

    if primary.search_type() != SearchType::Location {
        candidates.push(SearchAnalysis::location(
            query,
            adjust_confidence(base, 0.2, 0.3),
            None,
            None,
        ));
    }

    if let Some(location) = data.location().filter(|location| *location != query) {
        candidates.push(SearchAnalysis::location(
            location,
            adjust_confidence(base, 0.1, 0.3),
            None,
            None,
        ));
    }

    if let Some(address) = data.address() {
        candidates.push(SearchAnalysis::location(
            address,
            adjust_confidence(base, 0.3, 0.4),
            None,
            None,
        ));
    }

    if let (Some(city), Some(state)) = (data.city(), data.state()) {
        candidates.push(SearchAnalysis::location(
            format!("{city}, {state}"),
            adjust_confidence(base, 0.2, 0.5),
            Some(city.to_string()),
            Some(state.to_string()),
        ));
    }

    if let Some(state) = data.state()
        && candidates.len() < 3
    {
        candidates.push(SearchAnalysis::location(state, 0.3, None, Some(state.to_string())));
    }

    let mut fallbacks: Vec<SearchAnalysis> = candidates
        .into_iter()
        .unique_by(|candidate| candidate.extracted_data.location().map(str::to_owned))
        .collect();
    // Stable, so equal confidences keep rule order.
    fallbacks.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    fallbacks.truncate(MAX_FALLBACKS);

    debug!(
        query,
        count = fallbacks.len(),
        locations = ?fallbacks
            .iter()
            .filter_map(|f| f.extracted_data.location())
            .collect::<Vec<_>>(),
        "Generated fallback strategies"
    );
    fallbacks
}
