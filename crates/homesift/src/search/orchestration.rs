//! Search orchestration: plan selection, per-status fan-out and the fallback loop.
//!
//! A text search runs the primary interpretation of the query first. When
//! that yields no records, the fallback strategies run one after another,
//! each with the caller's plan, until one of them finds something. A
//! strategy aimed at the detail endpoint is always a single request.
//! Fan-out requests within a strategy run concurrently.

use std::time::Instant;

use ahash::AHashSet as HashSet;
use futures::future::join_all;
use homesift_provider::{
    PropertyProvider, PropertyRecord, ProviderConfig, ProviderError, UpstreamPayload, Url,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    ListingStatus, NearbyRequest, Result, SearchAttempt, SearchError, SearchFilters,
    SearchRequest, SearchResponse, UpstreamParams,
    request::{build_detail_url, build_nearby_url, build_suggestion_url, build_url, param},
    response::{NO_STRATEGY, PRIMARY_STRATEGY, ResponseData, ResponseKind, fallback_label},
};
use crate::{
    SearchConfigBuilder,
    analysis::{Endpoint, SearchAnalysis, adjust_confidence, classify, generate_fallbacks},
    geo::{rank_by_distance, rank_by_distance_rounded},
    property::NormalizedProperty,
};

/// Engine-level settings. Use [`SearchConfigBuilder`] to construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Attach the per-request attempt log to responses
    pub include_attempt_log: bool,
    /// Statuses fetched when filtering is off
    pub fanout_statuses: Vec<ListingStatus>,
    /// Radius for nearby searches that do not name one
    pub default_radius_miles: f64,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            include_attempt_log: cfg!(debug_assertions),
            fanout_statuses: ListingStatus::FANOUT.to_vec(),
            default_radius_miles: 5.0,
        }
    }
}

/// How a single strategy is turned into upstream requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    /// Filters off: one request per configured status
    Fanout(Vec<ListingStatus>),
    /// Filters on with a comma-joined status list: one request per listed status
    ExplicitMultiStatus(Vec<ListingStatus>),
    SingleRequest,
}

impl SearchPlan {
    pub fn select(filters: &SearchFilters, fanout_statuses: &[ListingStatus]) -> Self {
        if !filters.apply_filters {
            Self::Fanout(fanout_statuses.to_vec())
        } else if filters.is_multi_status() && !filters.statuses().is_empty() {
            Self::ExplicitMultiStatus(filters.statuses())
        } else {
            Self::SingleRequest
        }
    }

    /// The plan for one strategy. The detail endpoint returns a single
    /// property whatever the status, so it always gets one request.
    pub fn for_endpoint(&self, endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Property => Self::SingleRequest,
            Endpoint::Search => self.clone(),
        }
    }

    pub fn statuses(&self) -> Option<&[ListingStatus]> {
        match self {
            Self::Fanout(statuses) | Self::ExplicitMultiStatus(statuses) => Some(statuses),
            Self::SingleRequest => None,
        }
    }
}

struct Strategy<'a> {
    label: String,
    analysis: Option<&'a SearchAnalysis>,
    /// Count a bare property object as a hit; only the detail endpoint returns those
    accept_single: bool,
}

impl<'a> Strategy<'a> {
    fn for_analysis(label: impl Into<String>, analysis: &'a SearchAnalysis) -> Self {
        Self {
            label: label.into(),
            analysis: Some(analysis),
            accept_single: analysis.suggested_endpoint == Endpoint::Property,
        }
    }

    fn records_from(&self, body: &Value) -> Vec<PropertyRecord> {
        match UpstreamPayload::from_value(body) {
            UpstreamPayload::List(records) => records,
            UpstreamPayload::Single(record) if self.accept_single => vec![*record],
            _ => Vec::new(),
        }
    }
}

#[derive(Default)]
struct StrategyOutcome {
    records: Vec<PropertyRecord>,
    /// Requests that got an answer from upstream, empty or not
    completed: usize,
    last_error: Option<ProviderError>,
}

/// Issue every request `plan` calls for and merge the records.
///
/// Non-fatal failures are logged and recorded in `attempts`; fatal ones
/// abort immediately. Records are deduplicated by zpid, first one wins.
async fn run_strategy<P, F>(
    provider: &P,
    plan: &SearchPlan,
    params: &UpstreamParams,
    strategy: &Strategy<'_>,
    make_url: F,
    attempts: &mut Vec<SearchAttempt>,
) -> Result<StrategyOutcome>
where
    P: PropertyProvider,
    F: Fn(&UpstreamParams) -> Result<Url>,
{
    let requests: Vec<(Option<ListingStatus>, Url)> = match plan.statuses() {
        Some(statuses) => statuses
            .iter()
            .map(|status| {
                let status_params = params.clone().with(param::STATUS_TYPE, status.as_str());
                Ok((Some(status.clone()), make_url(&status_params)?))
            })
            .collect::<Result<_>>()?,
        None => vec![(None, make_url(params)?)],
    };

    let responses = join_all(requests.iter().map(|(_, url)| provider.get_json(url))).await;

    let mut outcome = StrategyOutcome::default();
    let mut seen_zpids = HashSet::new();
    for ((status, url), response) in requests.into_iter().zip(responses) {
        let mut attempt = SearchAttempt {
            strategy: strategy.label.clone(),
            listing_status: status.clone(),
            analysis: strategy.analysis.cloned(),
            url: url.to_string(),
            success: false,
            result_count: None,
            error: None,
        };

        match response {
            Ok(body) => {
                outcome.completed += 1;
                let records = strategy.records_from(&body);
                attempt.result_count = Some(records.len());
                attempt.success = !records.is_empty();
                for record in records {
                    let record = match &status {
                        Some(status) => record.with_listing_type(status.as_str()),
                        None => record,
                    };
                    if let Some(zpid) = record.zpid_string()
                        && !seen_zpids.insert(zpid)
                    {
                        continue;
                    }
                    outcome.records.push(record);
                }
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(
                    strategy = %strategy.label,
                    listing_status = status.as_ref().map(ListingStatus::as_str),
                    error = %e,
                    "Upstream request failed"
                );
                attempt.error = Some(e.to_string());
                outcome.last_error = Some(e);
            }
        }
        attempts.push(attempt);
    }

    debug!(
        strategy = %strategy.label,
        records = outcome.records.len(),
        completed = outcome.completed,
        "Strategy finished"
    );
    Ok(outcome)
}

pub(crate) async fn search_inner<P: PropertyProvider>(
    provider: &P,
    upstream: &ProviderConfig,
    config: &SearchConfig,
    request: &SearchRequest,
) -> Result<SearchResponse> {
    let started = Instant::now();
    let query = request.query.trim();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let analysis = classify(query);
    if let Err(e) = analysis.validate() {
        warn!(query, error = %e, "Continuing with invalid analysis");
    }

    let filters = &request.filters;
    let plan = SearchPlan::select(filters, &config.fanout_statuses);
    let params = filters.upstream_params(Some(&analysis));
    debug!(query, ?plan, "Selected search plan");

    let mut attempts = Vec::new();
    let primary = Strategy::for_analysis(PRIMARY_STRATEGY, &analysis);
    let mut winning_plan = plan.for_endpoint(analysis.suggested_endpoint);
    let outcome = run_strategy(
        provider,
        &winning_plan,
        &params,
        &primary,
        |p| build_url(upstream, &analysis, p),
        &mut attempts,
    )
    .await?;

    let mut completed = outcome.completed;
    let mut last_error = outcome.last_error;
    let mut records = outcome.records;
    let mut winner = (!records.is_empty()).then(|| PRIMARY_STRATEGY.to_string());

    if winner.is_none() {
        let fallbacks = generate_fallbacks(query, &analysis);
        for (index, fallback) in fallbacks.iter().enumerate() {
            let strategy = Strategy::for_analysis(fallback_label(index), fallback);
            let fallback_plan = plan.for_endpoint(fallback.suggested_endpoint);
            let outcome = run_strategy(
                provider,
                &fallback_plan,
                &params,
                &strategy,
                |p| build_url(upstream, fallback, p),
                &mut attempts,
            )
            .await?;

            completed += outcome.completed;
            last_error = outcome.last_error.or(last_error);
            if !outcome.records.is_empty() {
                records = outcome.records;
                winner = Some(strategy.label);
                winning_plan = fallback_plan;
                break;
            }
        }
    }

    if winner.is_none()
        && completed == 0
        && let Some(last) = last_error
    {
        return Err(SearchError::AllStrategiesFailed {
            attempts: attempts.len(),
            last,
        });
    }

    let mut homes: Vec<NormalizedProperty> = records
        .into_iter()
        .map(NormalizedProperty::from_record)
        .collect();
    if let Some(origin) = request.origin {
        rank_by_distance(&mut homes, origin);
    }

    let confidence = match winner.as_deref() {
        Some(label) if label != PRIMARY_STRATEGY => {
            adjust_confidence(analysis.confidence, 0.2, 0.3)
        }
        _ => analysis.confidence,
    };
    let successful_strategy = winner.unwrap_or_else(|| NO_STRATEGY.to_string());
    let total_results = homes.len();

    info!(
        query,
        search_type = %analysis.search_type(),
        results = total_results,
        strategy = %successful_strategy,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Search complete"
    );

    Ok(SearchResponse {
        nearby_homes: homes,
        search_type: ResponseKind::Query(analysis.search_type()),
        confidence,
        original_query: request.query.clone(),
        extracted_data: ResponseData::Query(analysis.extracted_data),
        total_results,
        filters_applied: filters.apply_filters,
        applied_filters: filters.applied(),
        successful_strategy: Some(successful_strategy),
        search_attempts: config.include_attempt_log.then_some(attempts),
        available_listing_types: match winning_plan {
            SearchPlan::Fanout(statuses) => Some(statuses),
            _ => None,
        },
        search_radius: None,
        user_location: None,
    })
}

pub(crate) async fn nearby_inner<P: PropertyProvider>(
    provider: &P,
    upstream: &ProviderConfig,
    config: &SearchConfig,
    request: &NearbyRequest,
) -> Result<SearchResponse> {
    let started = Instant::now();
    let point = request.point;
    let radius = request.radius.unwrap_or(config.default_radius_miles);
    let filters = &request.filters;
    let plan = SearchPlan::select(filters, &config.fanout_statuses);
    let params = filters.upstream_params(None);

    let strategy = Strategy {
        label: PRIMARY_STRATEGY.to_string(),
        analysis: None,
        accept_single: false,
    };
    let mut attempts = Vec::new();
    let outcome = run_strategy(
        provider,
        &plan,
        &params,
        &strategy,
        |p| build_nearby_url(upstream, point, radius, p),
        &mut attempts,
    )
    .await?;

    // No fallback exists for a coordinate search, so a lone failed request is the answer.
    if plan == SearchPlan::SingleRequest
        && outcome.completed == 0
        && let Some(e) = outcome.last_error
    {
        return Err(e.into());
    }

    let mut homes: Vec<NormalizedProperty> = outcome
        .records
        .into_iter()
        .map(NormalizedProperty::from_record)
        .collect();
    rank_by_distance_rounded(&mut homes, point, 1);
    let total_results = homes.len();

    info!(
        %point,
        radius,
        results = total_results,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Nearby search complete"
    );

    Ok(SearchResponse {
        nearby_homes: homes,
        search_type: if filters.apply_filters {
            ResponseKind::LocationBasedFiltered
        } else {
            ResponseKind::LocationBased
        },
        confidence: 1.0,
        original_query: point.to_string(),
        extracted_data: ResponseData::Nearby {
            location: point,
            radius,
        },
        total_results,
        filters_applied: filters.apply_filters,
        applied_filters: filters.applied(),
        successful_strategy: None,
        search_attempts: config.include_attempt_log.then_some(attempts),
        available_listing_types: match &plan {
            SearchPlan::Fanout(statuses) => Some(statuses.clone()),
            _ => None,
        },
        search_radius: Some(radius),
        user_location: Some(point),
    })
}

pub(crate) async fn detail_inner<P: PropertyProvider>(
    provider: &P,
    upstream: &ProviderConfig,
    zpid: &str,
) -> Result<NormalizedProperty> {
    let url = build_detail_url(upstream, zpid)?;
    let body = match provider.get_json(&url).await {
        Ok(body) => body,
        Err(ProviderError::NotFound) => return Err(SearchError::NotFound(zpid.to_string())),
        Err(e) => return Err(e.into()),
    };

    match UpstreamPayload::from_value(&body) {
        UpstreamPayload::Single(record) => Ok(NormalizedProperty::from_record(*record)),
        _ => Err(SearchError::NotFound(zpid.to_string())),
    }
}

pub(crate) async fn suggestions_inner<P: PropertyProvider>(
    provider: &P,
    upstream: &ProviderConfig,
    text: &str,
) -> Result<Value> {
    let url = build_suggestion_url(upstream, text)?;
    Ok(provider.get_json(&url).await?)
}
