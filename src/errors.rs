/*!
 * Error types for the mtbridge service.
 *
 * This module contains custom error types for the different layers of the
 * service, using the thiserror crate for ergonomic error definitions.
 * `ServiceError` is the request-level taxonomy every handler reports with.
 */

use thiserror::Error;

/// Errors that can occur when talking to the chat service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised by a translation engine invocation
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// The compute device or its runtime is unusable (missing accelerator
    /// libraries, out of device memory). Eligible for device fallback.
    #[error("Device resource failure: {0}")]
    Resource(String),

    /// Any other engine failure
    #[error("Engine failure: {0}")]
    Runtime(String),
}

impl EngineError {
    /// Whether this failure belongs to the resource/runtime class
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }
}

/// Errors from the subword tokenizer
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Tokenizer artifacts could not be loaded
    #[error("Failed to load tokenizer from {path}: {message}")]
    Load { path: String, message: String },

    /// Encoding text into pieces failed
    #[error("Failed to encode text: {0}")]
    Encode(String),

    /// Decoding pieces back into text failed
    #[error("Failed to decode pieces: {0}")]
    Decode(String),
}

/// Request-level error taxonomy
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A required input field is missing or malformed
    #[error("{0}")]
    BadRequest(String),

    /// The translation engine is not loaded, or the fallback device failed too
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Unexpected failure inside segmentation, translation or cleanup
    #[error("{0}")]
    Internal(String),

    /// The chat service is unreachable, timed out or answered with a failure status
    #[error("{0}")]
    Upstream(String),
}

impl ServiceError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal_error",
            Self::Upstream(_) => "upstream_error",
        }
    }

    /// HTTP status code this error is reported with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::ServiceUnavailable(_) => 503,
            Self::Internal(_) => 500,
            Self::Upstream(_) => 502,
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(error: ProviderError) -> Self {
        Self::Upstream(format!("error contacting chat service: {}", error))
    }
}

impl From<TokenizerError> for ServiceError {
    fn from(error: TokenizerError) -> Self {
        Self::Internal(error.to_string())
    }
}
