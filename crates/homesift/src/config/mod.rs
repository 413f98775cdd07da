use crate::search::{ListingStatus, SearchConfig};

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Builder for local work: attempt logs are always attached
    pub fn development() -> Self {
        let mut builder = Self::new();
        builder.config.include_attempt_log = true;
        builder
    }

    /// Builder for deployed services: responses carry no attempt log
    pub fn production() -> Self {
        let mut builder = Self::new();
        builder.config.include_attempt_log = false;
        builder
    }

    /// Attach the per-request attempt log to every response
    pub fn include_attempt_log(mut self, enabled: bool) -> Self {
        self.config.include_attempt_log = enabled;
        self
    }

    /// Statuses to fan out over when a search has no filters applied
    pub fn fanout_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ListingStatus>,
    {
        self.config.fanout_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Radius used by nearby searches that do not specify one
    pub fn default_radius_miles(mut self, miles: f64) -> Self {
        self.config.default_radius_miles = miles.max(0.0);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SearchConfig {
        self.config
    }
}
