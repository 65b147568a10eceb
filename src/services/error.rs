use thiserror::Error;

/// Errors that can occur when talking to the identifier web services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The configured endpoint is not a valid URL
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, String),

    /// The HTTP request failed (connection, timeout or non-success status)
    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The response body could not be parsed
    #[error("JSON error: {0}")]
    JSONError(#[from] serde_json::Error),

    /// The response was valid JSON but not in the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
