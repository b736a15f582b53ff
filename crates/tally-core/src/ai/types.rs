//! Backend-agnostic error type for text generation

use thiserror::Error;

/// Why a single text-generation call failed
///
/// Every variant is recoverable from the insight pipeline's point of view:
/// a failed call moves the pipeline to its next tier.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response contained no generated text")]
    EmptyResponse,

    #[error("Prompt blocked by the service: {0}")]
    Blocked(String),

    #[error("Mock failure: {0}")]
    Mock(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Http(e)
        }
    }
}
