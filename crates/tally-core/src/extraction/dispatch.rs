//! Provider selection and the remote fallback policy.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::nlu::LocalRules;
use super::providers::{ProviderProfile, SyntheticProvider};
use super::remote::RemoteBackend;
use super::{ExtractOptions, ExtractionBackend};
use crate::error::ExtractionError;
use crate::models::config::TallyConfig;
use crate::models::extraction::{ExtractionResult, ProviderId};
use tally_completion::CompletionBackend;

/// Runs the selected backend for each call.
///
/// Holds the configuration and, optionally, the completion backend used by
/// [`ProviderId::Remote`]. The provider is chosen per call; there is no
/// shared "current provider".
pub struct Extractor {
    config: TallyConfig,
    completion: Option<Arc<dyn CompletionBackend>>,
    today: Option<NaiveDate>,
}

impl Extractor {
    /// Extractor without a completion backend; remote calls fall back to local rules.
    pub fn new(config: TallyConfig) -> Self {
        Self {
            config,
            completion: None,
            today: None,
        }
    }

    /// Extractor with an HTTP completion backend built from `config.remote`.
    ///
    /// A missing API key is not an error here: the extractor is returned
    /// without a backend and remote calls use local rules.
    pub fn from_config(config: TallyConfig) -> Self {
        #[cfg(feature = "remote")]
        {
            use tally_completion::HttpBackend;

            let remote = &config.remote;
            match HttpBackend::from_env(
                &remote.api_key_env,
                remote.endpoint.clone(),
                remote.model.clone(),
                Duration::from_secs(remote.timeout_secs),
            ) {
                Ok(backend) => {
                    debug!(endpoint = %backend.endpoint(), model = %remote.model, "Remote backend configured");
                    Self::new(config).with_completion(Arc::new(backend))
                }
                Err(e) => {
                    debug!(error = %e, "Remote backend unavailable");
                    Self::new(config)
                }
            }
        }

        #[cfg(not(feature = "remote"))]
        {
            Self::new(config)
        }
    }

    pub fn with_completion(mut self, completion: Arc<dyn CompletionBackend>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Fix "today" instead of reading the local clock on every call.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn provider(&self, options: &ExtractOptions) -> ProviderId {
        options
            .provider
            .unwrap_or(self.config.extraction.default_provider)
    }

    /// Extract with the selected provider, then apply caller overrides.
    ///
    /// Never fails: remote failures of every kind degrade to local rules,
    /// and the returned result names the backend that produced it.
    pub async fn extract(&self, text: &str, options: &ExtractOptions) -> ExtractionResult {
        let today = self.today();
        let mut result = match self.provider(options) {
            ProviderId::Remote => self.extract_remote(text, today).await,
            provider => self.extract_local(provider, text, today),
        };

        self.finish(&mut result, options);
        result
    }

    /// Extract without awaiting anything. [`ProviderId::Remote`] runs local rules.
    pub fn extract_sync(&self, text: &str, options: &ExtractOptions) -> ExtractionResult {
        let today = self.today();
        let provider = self.provider(options);
        if provider == ProviderId::Remote {
            debug!("Synchronous extraction, using local rules instead of remote");
        }

        let mut result = self.extract_local(provider, text, today);
        self.finish(&mut result, options);
        result
    }

    fn extract_local(&self, provider: ProviderId, text: &str, today: NaiveDate) -> ExtractionResult {
        match ProviderProfile::for_id(provider) {
            Some(profile) => SyntheticProvider::new(profile, &self.config.extraction, today).run(text),
            None => LocalRules::from_config(&self.config.extraction, today).run(text),
        }
    }

    async fn extract_remote(&self, text: &str, today: NaiveDate) -> ExtractionResult {
        match self.try_remote(text, today).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Remote extraction failed, falling back to local rules");
                LocalRules::from_config(&self.config.extraction, today).run(text)
            }
        }
    }

    async fn try_remote(&self, text: &str, today: NaiveDate) -> Result<ExtractionResult, ExtractionError> {
        let completion = self.completion.clone().ok_or_else(|| {
            ExtractionError::Completion(tally_completion::CompletionError::MissingCredentials(
                self.config.remote.api_key_env.clone(),
            ))
        })?;

        let backend = RemoteBackend::new(completion, today)
            .with_temperature(self.config.remote.temperature);

        let secs = self.config.remote.timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), backend.extract(text))
            .await
            .map_err(|_| ExtractionError::Timeout(secs))?
    }

    fn finish(&self, result: &mut ExtractionResult, options: &ExtractOptions) {
        let overrides = options.overrides();
        if !overrides.is_empty() {
            overrides.apply_to_parties(&mut result.client_info, &mut result.company_info);
        }

        info!(
            provider = %result.provider,
            items = result.items.len(),
            confidence = result.confidence,
            "Extraction complete"
        );
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(TallyConfig::default())
    }
}
