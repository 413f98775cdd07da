use std::{future::Future, sync::Arc};

use reqwest::{
    StatusCode, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{ProviderConfig, ProviderError, Result, Sleeper, TokioSleeper, fetch_with_retry};

/// Anything that can answer a fully-built upstream URL with a JSON body.
///
/// The search engine only talks to the network through this trait, so tests
/// can substitute an in-memory provider.
pub trait PropertyProvider: Send + Sync {
    fn get_json(&self, url: &Url) -> impl Future<Output = Result<Value>> + Send;
}

/// reqwest-backed provider that sends the API-key and host headers and
/// retries rate-limited calls according to the configured [`crate::RetryPolicy`].
#[derive(Debug, Clone)]
pub struct HttpProvider<S = TokioSleeper> {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
    sleeper: S,
}

impl HttpProvider<TokioSleeper> {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(auth_headers(&config)?)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
            sleeper: TokioSleeper,
        })
    }
}

impl<S: Sleeper> HttpProvider<S> {
    /// Swap the backoff sleeper, e.g. for tests that must not wait on real time
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> HttpProvider<T> {
        HttpProvider {
            client: self.client,
            config: self.config,
            sleeper,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn get_once(&self, url: &Url) -> Result<Value> {
        debug!(path = url.path(), query = url.query().unwrap_or_default(), "GET upstream");
        let response = self.client.get(url.clone()).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited { attempts: 1 }),
            StatusCode::FORBIDDEN => Err(ProviderError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
            status if !status.is_success() => Err(ProviderError::Unavailable(format!(
                "HTTP {status} from {}",
                url.path()
            ))),
            _ => Ok(response.json::<Value>().await?),
        }
    }
}

impl<S: Sleeper> PropertyProvider for HttpProvider<S> {
    #[instrument(name = "Upstream GET", level = "debug", skip_all, fields(path = url.path()))]
    async fn get_json(&self, url: &Url) -> Result<Value> {
        fetch_with_retry(&self.config.retry, &self.sleeper, || self.get_once(url)).await
    }
}

fn auth_headers(config: &ProviderConfig) -> Result<HeaderMap> {
    let invalid = |what: &str, e: &dyn std::error::Error| {
        ProviderError::InvalidConfiguration(format!("{what}: {e}"))
    };

    let mut headers = HeaderMap::new();
    let key_name = HeaderName::from_bytes(config.api_key_header.as_bytes())
        .map_err(|e| invalid("API key header name", &e))?;
    let mut key_value =
        HeaderValue::from_str(&config.api_key).map_err(|e| invalid("API key", &e))?;
    key_value.set_sensitive(true);
    headers.insert(key_name, key_value);

    if let Some(host) = config.host_header_value() {
        let host_name = HeaderName::from_bytes(config.host_header.as_bytes())
            .map_err(|e| invalid("host header name", &e))?;
        let host_value = HeaderValue::from_str(&host).map_err(|e| invalid("host", &e))?;
        headers.insert(host_name, host_value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    use super::*;
    use crate::RetryPolicy;

    fn provider_for(server: &MockServer) -> HttpProvider {
        let config = ProviderConfig::builder(server.uri(), "test-key")
            .host("zillow-com1.p.rapidapi.com")
            .retry(RetryPolicy::new(3, Duration::from_millis(5)))
            .build()
            .unwrap();
        HttpProvider::new(config).unwrap()
    }

    fn search_url(provider: &HttpProvider, location: &str) -> Url {
        let mut url = provider.config().search_url().unwrap();
        url.query_pairs_mut().append_pair("location", location);
        url
    }

    #[tokio::test]
    async fn test_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/propertyExtendedSearch"))
            .and(query_param("location", "26003"))
            .and(header("x-rapidapi-key", "test-key"))
            .and(header("x-rapidapi-host", "zillow-com1.p.rapidapi.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "props": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let body = provider
            .get_json(&search_url(&provider, "26003"))
            .await
            .unwrap();
        assert_eq!(body, json!({ "props": [] }));
    }

    #[tokio::test]
    async fn test_forbidden_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider.get_json(&search_url(&provider, "Dallas, TX")).await;
        assert!(matches!(result, Err(ProviderError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "props": [{ "zpid": 1 }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let body = provider
            .get_json(&search_url(&provider, "Dallas, TX"))
            .await
            .unwrap();
        assert_eq!(body["props"][0]["zpid"], 1);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider.get_json(&search_url(&provider, "Dallas, TX")).await;
        assert!(matches!(
            result,
            Err(ProviderError::RateLimited { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/property"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/propertyExtendedSearch"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let detail = provider.config().detail_url().unwrap();
        assert!(matches!(
            provider.get_json(&detail).await,
            Err(ProviderError::NotFound)
        ));
        assert!(matches!(
            provider.get_json(&search_url(&provider, "x")).await,
            Err(ProviderError::Unavailable(_))
        ));
    }
}
