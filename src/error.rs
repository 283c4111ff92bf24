/// Failure of a single outbound TMDB request, after retries where applicable.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("gave up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },
}

impl FetchError {
    /// Transient failures are worth retrying: timeouts, connection errors,
    /// throttling, and upstream 5xx. Everything else fails the attempt outright.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode { .. } | FetchError::RetriesExhausted { .. } => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

pub type IngestResult<T> = Result<T, IngestError>;
