//! Completion backend implementations.

#[cfg(feature = "http")]
pub mod http;

use async_trait::async_trait;

use crate::{CompletionRequest, CompletionResponse, Result};

/// Trait for structured-completion backends.
///
/// This trait abstracts over the hosted model that answers extraction
/// prompts, so the remote extraction path can be exercised against a real
/// endpoint or against an in-process stand-in.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a completion.
    ///
    /// # Arguments
    /// * `request` - Messages and sampling options
    ///
    /// # Returns
    /// The content of the first choice
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Name of the model answering requests.
    fn model(&self) -> &str;
}
