//! Structured-completion abstraction layer for tally.
//!
//! This crate provides a unified interface for asking a hosted model to turn
//! text into JSON:
//! - `CompletionBackend`, the trait the remote extraction path is written against
//! - `HttpBackend` for OpenAI-compatible chat-completions endpoints (`http` feature)

mod backend;
mod error;
mod request;

pub use backend::CompletionBackend;
pub use error::CompletionError;
pub use request::{CompletionRequest, CompletionResponse, Message, Role};

#[cfg(feature = "http")]
pub use backend::http::{HttpBackend, DEFAULT_ENDPOINT};

/// Result type for completion operations.
pub type Result<T> = std::result::Result<T, CompletionError>;
