//! Error types for the completion layer.

use thiserror::Error;

/// Errors that can occur while calling a completion backend.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// No API key was configured for the backend.
    #[error("missing credentials: {0} is not set")]
    MissingCredentials(String),

    /// The HTTP request could not be sent or timed out.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// The response carried no message content.
    #[error("empty completion response")]
    EmptyResponse,

    /// The response body was not the expected JSON envelope.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
