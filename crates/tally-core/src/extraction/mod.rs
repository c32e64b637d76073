//! Text-to-invoice extraction backends.
//!
//! Every backend turns free text into an [`ExtractionResult`]. The local
//! rule pass and the synthetic providers never fail; the remote backend can,
//! and the [`Extractor`] recovers by falling back to local rules.

pub mod dispatch;
pub mod nlu;
pub mod providers;
pub mod remote;
pub mod rules;

pub use dispatch::Extractor;
pub use nlu::LocalRules;
pub use providers::{ProviderProfile, SyntheticProvider};
pub use remote::RemoteBackend;

use async_trait::async_trait;
use std::result::Result as StdResult;

use crate::error::ExtractionError;
use crate::models::extraction::{
    BusinessDetails, ClientDetails, ExtractionResult, InvoiceOverrides, ProviderId,
};

/// One extraction strategy.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Which provider this backend implements.
    fn id(&self) -> ProviderId;

    /// Extract invoice fields from text.
    async fn extract(&self, text: &str) -> StdResult<ExtractionResult, ExtractionError>;
}

/// Per-call extraction options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Backend to use; `None` means the configured default.
    pub provider: Option<ProviderId>,
    pub client_override: Option<ClientDetails>,
    pub business_override: Option<BusinessDetails>,
}

impl ExtractOptions {
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_client(mut self, client: ClientDetails) -> Self {
        self.client_override = Some(client);
        self
    }

    pub fn with_business(mut self, business: BusinessDetails) -> Self {
        self.business_override = Some(business);
        self
    }

    /// The overrides as one record.
    pub fn overrides(&self) -> InvoiceOverrides {
        InvoiceOverrides {
            client: self.client_override.clone(),
            business: self.business_override.clone(),
        }
    }
}

/// Reject empty or whitespace-only input before extracting.
pub fn validate_input(text: &str) -> StdResult<&str, ExtractionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyInput);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_input() {
        assert!(matches!(validate_input("   \n\t"), Err(ExtractionError::EmptyInput)));
        assert!(matches!(validate_input(""), Err(ExtractionError::EmptyInput)));
        assert_eq!(validate_input("  Logo for $300 ").unwrap(), "Logo for $300");
    }

    #[test]
    fn test_options_overrides() {
        let options = ExtractOptions::default()
            .with_provider(ProviderId::ProviderB)
            .with_client(ClientDetails {
                name: Some("Acme".to_string()),
                ..Default::default()
            });

        assert_eq!(options.provider, Some(ProviderId::ProviderB));
        let overrides = options.overrides();
        assert!(!overrides.is_empty());
        assert!(overrides.business.is_none());
    }
}
