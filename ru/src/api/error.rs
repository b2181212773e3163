//! Fetch error types

use thiserror::Error;

/// Errors that can occur while fetching from the remote API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
