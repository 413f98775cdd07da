use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomesiftError {
    #[error("Search error: {0}")]
    SearchError(#[from] crate::search::SearchError),
    #[error("Provider error: {0}")]
    ProviderError(#[from] homesift_provider::ProviderError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HomesiftError {
    /// The upstream rejected the API key, either directly or during a search.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::SearchError(e) => e.is_unauthorized(),
            Self::ProviderError(e) => matches!(e, homesift_provider::ProviderError::Unauthorized),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, HomesiftError>;
