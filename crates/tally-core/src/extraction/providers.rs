//! Synthetic provider rule engines.
//!
//! The three providers share the date, tax and notes rules and differ only
//! in which entity and item patterns they apply, whether they look for the
//! issuing company, and how much they enrich item descriptions.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::result::Result as StdResult;
use tracing::debug;

use super::nlu::{compose_result, extract_parties, Attributes};
use super::rules::entities::EntityProfile;
use super::rules::line_items::{default_item, ItemPatterns};
use super::rules::{Enrichment, EntityExtractor, LineItemExtractor, RecurringDetector};
use super::ExtractionBackend;
use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::extraction::{ExtractionResult, ProviderId};
use crate::models::invoice::LineItem;

/// What one synthetic provider does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    pub id: ProviderId,
    pub entities: EntityProfile,
    pub items: ItemPatterns,
    /// Expand recurring delivery schedules.
    pub recurring: bool,
    /// Extract the issuing company as well as the client.
    pub company: bool,
    pub enrichment: Enrichment,
    /// Appended to the fallback item's description.
    pub fallback_suffix: Option<&'static str>,
}

impl ProviderProfile {
    /// Labelled names and the two plain price phrasings.
    pub const BASIC: ProviderProfile = ProviderProfile {
        id: ProviderId::ProviderA,
        entities: EntityProfile::Basic,
        items: ItemPatterns::BASIC,
        recurring: false,
        company: false,
        enrichment: Enrichment::Basic,
        fallback_suffix: None,
    };

    /// Full client rules, quantities and recurring deliveries.
    pub const STANDARD: ProviderProfile = ProviderProfile {
        id: ProviderId::ProviderB,
        entities: EntityProfile::Full,
        items: ItemPatterns::ALL,
        recurring: true,
        company: false,
        enrichment: Enrichment::Standard,
        fallback_suffix: None,
    };

    /// Everything, plus company details and the richest descriptions.
    pub const ADVANCED: ProviderProfile = ProviderProfile {
        id: ProviderId::ProviderC,
        entities: EntityProfile::Full,
        items: ItemPatterns::ALL,
        recurring: true,
        company: true,
        enrichment: Enrichment::Advanced,
        fallback_suffix: Some("Standard Rate"),
    };

    /// Profile for a synthetic provider id.
    pub fn for_id(id: ProviderId) -> Option<ProviderProfile> {
        match id {
            ProviderId::ProviderA => Some(Self::BASIC),
            ProviderId::ProviderB => Some(Self::STANDARD),
            ProviderId::ProviderC => Some(Self::ADVANCED),
            ProviderId::LocalRules | ProviderId::Remote => None,
        }
    }
}

/// A provider rule engine. Pure local computation; never fails.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    profile: ProviderProfile,
    config: ExtractionConfig,
    today: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(profile: ProviderProfile, config: &ExtractionConfig, today: NaiveDate) -> Self {
        Self {
            profile,
            config: config.clone(),
            today,
        }
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    pub fn run(&self, text: &str) -> ExtractionResult {
        let profile = &self.profile;

        let client_extractor = EntityExtractor::client().with_profile(profile.entities);
        let (client, company) = extract_parties(text, client_extractor, profile.company);

        let mut extractor = LineItemExtractor::new(self.today)
            .with_patterns(profile.items)
            .with_dedupe(self.config.dedupe_line_items);
        if profile.recurring {
            extractor =
                extractor.with_recurring(RecurringDetector::new(self.config.recurring_keywords.clone()));
        }

        let mut items = extractor.find_items(text);
        if items.is_empty() {
            debug!(provider = %profile.id, "No items matched, using provider fallback");
            items.push(self.fallback_item(text));
        }

        let items = items
            .into_iter()
            .map(|mut item| {
                item.description = profile.enrichment.enrich(&item.description);
                item
            })
            .collect();

        compose_result(items, client, company, Attributes::extract(text, self.today), profile.id)
    }

    fn fallback_item(&self, text: &str) -> LineItem {
        let mut item = default_item(text);
        if let Some(suffix) = self.profile.fallback_suffix {
            item.description = format!("{} ({})", item.description, suffix);
        }
        item
    }
}

#[async_trait]
impl ExtractionBackend for SyntheticProvider {
    fn id(&self) -> ProviderId {
        self.profile.id
    }

    async fn extract(&self, text: &str) -> StdResult<ExtractionResult, ExtractionError> {
        Ok(self.run(text))
    }
}
