use thiserror::Error;

/// Failure to obtain a usable weather series from the upstream API.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("Rate limited by weather API: {0}")]
    RateLimited(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Weather API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Raised when a series is too short to score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Insufficient data: {required} observations required, {actual} available")]
pub struct InsufficientDataError {
    pub required: usize,
    pub actual: usize,
}

/// Violations of the one-location, strictly-increasing series invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Observation for {found} does not belong to series for {expected}")]
    LocationMismatch { expected: String, found: String },

    #[error("Timestamp {found} is not after previous observation at {previous}")]
    NonIncreasingTimestamp {
        previous: chrono::DateTime<chrono::Utc>,
        found: chrono::DateTime<chrono::Utc>,
    },
}

#[derive(Error, Debug)]
pub enum FarmWeatherError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    InsufficientData(#[from] InsufficientDataError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, FarmWeatherError>;
