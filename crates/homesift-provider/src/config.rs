//! Upstream provider configuration.
//!
//! The configuration is built once at startup, either explicitly through
//! [`ProviderConfigBuilder`] or from the process environment, and then handed
//! to the client and the search engine. A missing base URL or API key is a
//! startup error; no request is ever attempted without them.

use std::{fmt, time::Duration};

use reqwest::Url;

use crate::{ProviderError, Result, RetryPolicy};

pub const DEFAULT_SEARCH_PATH: &str = "/propertyExtendedSearch";
pub const DEFAULT_DETAIL_PATH: &str = "/property";
pub const DEFAULT_SUGGESTION_PATH: &str = "/locationSuggestions";
pub const DEFAULT_API_KEY_HEADER: &str = "x-rapidapi-key";
pub const DEFAULT_HOST_HEADER: &str = "x-rapidapi-host";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variables read by [`ProviderConfig::from_env`].
pub mod env_keys {
    pub const BASE_URL: &str = "ZILLOW_URL";
    pub const API_KEY: &str = "ZILLOW_API_KEY";
    pub const HOST: &str = "ZILLOW_HOST";
    pub const SEARCH_PATH: &str = "ZILLOW_ENDPOINT_PROPERTY_SEARCH";
    pub const DETAIL_PATH: &str = "ZILLOW_ENDPOINT_PROPERTY_DETAIL";
    pub const SUGGESTION_PATH: &str = "ZILLOW_ENDPOINT_LOCATION_SUGGESTION";
    pub const API_KEY_HEADER: &str = "HTTP_HEADER_RAPIDAPI_KEY";
    pub const HOST_HEADER: &str = "HTTP_HEADER_RAPIDAPI_HOST";
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider root, e.g. `https://zillow-com1.p.rapidapi.com`
    pub base_url: String,
    pub api_key: String,
    /// Value sent in the host header. Defaults to the host of `base_url`.
    pub host: Option<String>,
    /// Multi-result search endpoint path
    pub search_path: String,
    /// Single-property detail endpoint path
    pub detail_path: String,
    /// Location autocomplete endpoint path
    pub suggestion_path: String,
    pub api_key_header: String,
    pub host_header: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("host", &self.host)
            .field("search_path", &self.search_path)
            .field("detail_path", &self.detail_path)
            .field("suggestion_path", &self.suggestion_path)
            .field("api_key_header", &self.api_key_header)
            .field("host_header", &self.host_header)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderConfig {
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(base_url, api_key)
    }

    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key lookup (environment, file, test map).
    ///
    /// Blank values are treated as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get(env_keys::BASE_URL)
            .ok_or_else(|| ProviderError::MissingConfiguration(env_keys::BASE_URL.into()))?;
        let api_key = get(env_keys::API_KEY)
            .ok_or_else(|| ProviderError::MissingConfiguration(env_keys::API_KEY.into()))?;

        let mut builder = ProviderConfigBuilder::new(base_url, api_key);
        if let Some(host) = get(env_keys::HOST) {
            builder = builder.host(host);
        }
        if let Some(path) = get(env_keys::SEARCH_PATH) {
            builder = builder.search_path(path);
        }
        if let Some(path) = get(env_keys::DETAIL_PATH) {
            builder = builder.detail_path(path);
        }
        if let Some(path) = get(env_keys::SUGGESTION_PATH) {
            builder = builder.suggestion_path(path);
        }
        builder
            .headers(
                get(env_keys::API_KEY_HEADER).unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
                get(env_keys::HOST_HEADER).unwrap_or_else(|| DEFAULT_HOST_HEADER.to_string()),
            )
            .build()
    }

    /// Value for the host header: the configured host, or the host part of `base_url`.
    pub fn host_header_value(&self) -> Option<String> {
        self.host.clone().or_else(|| {
            Url::parse(&self.base_url)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
        })
    }

    pub fn search_url(&self) -> Result<Url> {
        self.endpoint_url(&self.search_path)
    }

    pub fn detail_url(&self) -> Result<Url> {
        self.endpoint_url(&self.detail_path)
    }

    pub fn suggestion_url(&self) -> Result<Url> {
        self.endpoint_url(&self.suggestion_path)
    }

    /// `base_url` joined with `path`, tolerating a trailing or missing slash on either side.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ProviderError::InvalidUrl(format!("{joined}: {e}")))
    }
}

/// Builder for [`ProviderConfig`] with the provider's conventional defaults
#[derive(Debug, Clone)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            config: ProviderConfig {
                base_url: base_url.into(),
                api_key: api_key.into(),
                host: None,
                search_path: DEFAULT_SEARCH_PATH.to_string(),
                detail_path: DEFAULT_DETAIL_PATH.to_string(),
                suggestion_path: DEFAULT_SUGGESTION_PATH.to_string(),
                api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
                host_header: DEFAULT_HOST_HEADER.to_string(),
                timeout: DEFAULT_TIMEOUT,
                retry: RetryPolicy::default(),
            },
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.config.search_path = path.into();
        self
    }

    pub fn detail_path(mut self, path: impl Into<String>) -> Self {
        self.config.detail_path = path.into();
        self
    }

    pub fn suggestion_path(mut self, path: impl Into<String>) -> Self {
        self.config.suggestion_path = path.into();
        self
    }

    /// Override the names of the API-key and host headers
    pub fn headers(mut self, api_key_header: impl Into<String>, host_header: impl Into<String>) -> Self {
        self.config.api_key_header = api_key_header.into();
        self.config.host_header = host_header.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<ProviderConfig> {
        let config = self.config;
        if config.base_url.trim().is_empty() {
            return Err(ProviderError::MissingConfiguration(
                env_keys::BASE_URL.into(),
            ));
        }
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::MissingConfiguration(
                env_keys::API_KEY.into(),
            ));
        }
        if config.api_key_header.trim().is_empty() || config.host_header.trim().is_empty() {
            return Err(ProviderError::InvalidConfiguration(
                "header names must not be blank".into(),
            ));
        }
        Url::parse(&config.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        Ok(config)
    }
}
