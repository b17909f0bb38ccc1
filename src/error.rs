use thiserror::Error;

/// Failures talking to the search backend.
///
/// The application state swallows all of these into empty results or the
/// metadata-only notice; the variants exist so logs and the `stream`
/// command can say what actually happened.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend returned no stream URL")]
    MissingStreamUrl,
}

pub type Result<T> = std::result::Result<T, BackendError>;
