//! Local rule-based extraction pass.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::result::Result as StdResult;
use tracing::debug;

use super::rules::{
    extract_notes, extract_tax_rate, score_confidence, ConfidenceFlags, DateResolver, DueInfo,
    EntityExtractor, LineItemExtractor, RecurringDetector,
};
use super::rules::entities::labelled_company_email;
use super::ExtractionBackend;
use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::extraction::{ExtractedParty, ExtractionResult, ProviderId};
use crate::models::invoice::LineItem;

/// Tax, due date and notes; shared by every local strategy.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Attributes {
    pub tax_rate: Decimal,
    pub due: DueInfo,
    pub notes: String,
}

impl Attributes {
    pub fn extract(text: &str, today: NaiveDate) -> Self {
        let due = DateResolver::new(today).resolve(text);
        Self {
            tax_rate: extract_tax_rate(text),
            notes: extract_notes(text, due.due_days),
            due,
        }
    }
}

/// Put the pieces together and score them.
pub(crate) fn compose_result(
    items: Vec<LineItem>,
    client_info: ExtractedParty,
    company_info: Option<ExtractedParty>,
    attributes: Attributes,
    provider: ProviderId,
) -> ExtractionResult {
    let flags = ConfidenceFlags::from_fields(
        &client_info,
        &items,
        attributes.tax_rate,
        !attributes.due.is_empty(),
        Some(attributes.notes.as_str()),
    );

    ExtractionResult {
        items,
        client_info,
        company_info,
        tax_rate: attributes.tax_rate,
        due_date: attributes.due.due_date,
        due_days: attributes.due.due_days,
        notes: Some(attributes.notes),
        confidence: score_confidence(flags),
        provider,
    }
}

/// Client first, keeping the issuer's labelled email off it; then the
/// company, never reusing the client's email.
pub(crate) fn extract_parties(
    text: &str,
    client_extractor: EntityExtractor,
    with_company: bool,
) -> (ExtractedParty, Option<ExtractedParty>) {
    let client_extractor = match labelled_company_email(text) {
        Some(email) => client_extractor.excluding_email(email),
        None => client_extractor,
    };
    let client = client_extractor.extract(text);

    if !with_company {
        return (client, None);
    }

    let mut company_extractor = EntityExtractor::company();
    if client.has_email() {
        company_extractor = company_extractor.excluding_email(&client.email);
    }
    let company = company_extractor.extract(text);

    let company = (!company.is_placeholder()).then_some(company);
    (client, company)
}

/// The composition of date, entity, line item, tax, notes and confidence rules.
#[derive(Debug, Clone)]
pub struct LocalRules {
    today: NaiveDate,
    config: ExtractionConfig,
}

impl LocalRules {
    pub fn new(today: NaiveDate) -> Self {
        Self::from_config(&ExtractionConfig::default(), today)
    }

    pub fn from_config(config: &ExtractionConfig, today: NaiveDate) -> Self {
        Self {
            today,
            config: config.clone(),
        }
    }

    /// Run the pass. Never fails; misses become defaults.
    pub fn run(&self, text: &str) -> ExtractionResult {
        let (client, company) = extract_parties(text, EntityExtractor::client(), true);

        let items = LineItemExtractor::new(self.today)
            .with_recurring(RecurringDetector::new(self.config.recurring_keywords.clone()))
            .with_dedupe(self.config.dedupe_line_items)
            .extract(text);

        let attributes = Attributes::extract(text, self.today);
        debug!(
            items = items.len(),
            client = %client.name,
            tax_rate = %attributes.tax_rate,
            "Local rules pass"
        );

        compose_result(items, client, company, attributes, ProviderId::LocalRules)
    }
}

impl Default for LocalRules {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

#[async_trait]
impl ExtractionBackend for LocalRules {
    fn id(&self) -> ProviderId {
        ProviderId::LocalRules
    }

    async fn extract(&self, text: &str) -> StdResult<ExtractionResult, ExtractionError> {
        Ok(self.run(text))
    }
}
