use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
    #[error("Upstream rate limit exceeded after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },
    #[error("Upstream rejected the API key (HTTP 403): key invalid or subscription expired")]
    Unauthorized,
    #[error("Upstream resource not found")]
    NotFound,
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ProviderError {
    /// A 429 from upstream; the only error the retry loop acts on.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Errors that must abort a whole search instead of failing a single attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::MissingConfiguration(_)
                | Self::InvalidConfiguration(_)
                | Self::InvalidUrl(_)
        )
    }
}
