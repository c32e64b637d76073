//! Extraction output and caller-supplied override records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::{BankDetails, LineItem, PartyDetails};

/// Placeholder client name meaning "not found".
pub const DEFAULT_CLIENT_NAME: &str = "Client";
/// Placeholder client email meaning "not found".
pub const DEFAULT_CLIENT_EMAIL: &str = "client@example.com";
/// Placeholder client address meaning "not found".
pub const DEFAULT_CLIENT_ADDRESS: &str = "Client Address";

/// Placeholder company name meaning "not found".
pub const DEFAULT_COMPANY_NAME: &str = "Your Company";
/// Placeholder company email meaning "not found".
pub const DEFAULT_COMPANY_EMAIL: &str = "company@example.com";
/// Placeholder company address meaning "not found".
pub const DEFAULT_COMPANY_ADDRESS: &str = "Company Address";

/// Tax rate (percent) used when the text names none.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::TEN;

/// Which side of the invoice an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Client,
    Company,
}

/// Name, email and address found in text.
///
/// Fields that were not found hold the role's placeholder values; compare
/// with [`ExtractedParty::has_name`] and friends rather than trusting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedParty {
    pub name: String,
    pub email: String,
    pub address: String,
}

impl ExtractedParty {
    /// A party with every field at its placeholder.
    pub fn placeholder(role: PartyRole) -> Self {
        match role {
            PartyRole::Client => Self {
                name: DEFAULT_CLIENT_NAME.to_string(),
                email: DEFAULT_CLIENT_EMAIL.to_string(),
                address: DEFAULT_CLIENT_ADDRESS.to_string(),
            },
            PartyRole::Company => Self {
                name: DEFAULT_COMPANY_NAME.to_string(),
                email: DEFAULT_COMPANY_EMAIL.to_string(),
                address: DEFAULT_COMPANY_ADDRESS.to_string(),
            },
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty() && self.name != DEFAULT_CLIENT_NAME && self.name != DEFAULT_COMPANY_NAME
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
            && self.email != DEFAULT_CLIENT_EMAIL
            && self.email != DEFAULT_COMPANY_EMAIL
    }

    pub fn has_address(&self) -> bool {
        !self.address.is_empty()
            && self.address != DEFAULT_CLIENT_ADDRESS
            && self.address != DEFAULT_COMPANY_ADDRESS
    }

    /// True when nothing was found.
    pub fn is_placeholder(&self) -> bool {
        !self.has_name() && !self.has_email() && !self.has_address()
    }
}

impl Default for ExtractedParty {
    fn default() -> Self {
        Self::placeholder(PartyRole::Client)
    }
}

/// Extraction strategy selected per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// Local rule-based language pass.
    LocalRules,
    /// Hosted model call with fallback to local rules.
    #[default]
    Remote,
    /// Basic synthetic rule engine.
    ProviderA,
    /// Standard synthetic rule engine.
    ProviderB,
    /// Advanced synthetic rule engine.
    ProviderC,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::LocalRules,
        ProviderId::Remote,
        ProviderId::ProviderA,
        ProviderId::ProviderB,
        ProviderId::ProviderC,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::LocalRules => "local-rules",
            ProviderId::Remote => "remote",
            ProviderId::ProviderA => "provider-a",
            ProviderId::ProviderB => "provider-b",
            ProviderId::ProviderC => "provider-c",
        }
    }

    /// One-line description for listings.
    pub fn describe(&self) -> &'static str {
        match self {
            ProviderId::LocalRules => "local rule-based pass (dates, parties, items, tax, notes)",
            ProviderId::Remote => "hosted model via chat completions; falls back to local-rules",
            ProviderId::ProviderA => "basic rule engine: labelled names, simple price phrases",
            ProviderId::ProviderB => "standard rule engine: quantities, recurring deliveries",
            ProviderId::ProviderC => "advanced rule engine: company details, richest descriptions",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "local-rules" | "local" | "nlu" => Ok(ProviderId::LocalRules),
            "remote" => Ok(ProviderId::Remote),
            "provider-a" | "a" => Ok(ProviderId::ProviderA),
            "provider-b" | "b" => Ok(ProviderId::ProviderB),
            "provider-c" | "c" => Ok(ProviderId::ProviderC),
            _ => Err(format!(
                "unknown provider '{}' (expected one of: local-rules, remote, provider-a, provider-b, provider-c)",
                s
            )),
        }
    }
}

/// Structured output of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Priced items in order of discovery.
    pub items: Vec<LineItem>,

    /// Billed party.
    pub client_info: ExtractedParty,

    /// Issuing business, when any of its fields were found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_info: Option<ExtractedParty>,

    /// Tax rate in percent.
    pub tax_rate: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Completeness score in [0.5, 1.0].
    pub confidence: f32,

    /// Backend that actually produced the result.
    pub provider: ProviderId,
}

/// Client details supplied by the caller; non-empty fields win over extracted ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Business details supplied by the caller; opaque to extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// ABN or equivalent tax registration number.
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    /// BSB, sort code or routing number.
    pub routing_code: Option<String>,
}

impl BusinessDetails {
    /// Load business details from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub(crate) fn bank(&self) -> Option<BankDetails> {
        let bank = BankDetails {
            bank_name: non_empty(&self.bank_name),
            account_name: non_empty(&self.account_name),
            account_number: non_empty(&self.account_number),
            routing_code: non_empty(&self.routing_code),
        };
        (!bank.is_empty()).then_some(bank)
    }
}

/// Caller overrides applied to extraction output and assembled invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceOverrides {
    pub client: Option<ClientDetails>,
    pub business: Option<BusinessDetails>,
}

impl InvoiceOverrides {
    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.business.is_none()
    }

    /// Replace extracted client/company fields with non-empty override fields.
    pub fn apply_to_parties(&self, client: &mut ExtractedParty, company: &mut Option<ExtractedParty>) {
        if let Some(details) = &self.client {
            overwrite(&mut client.name, &details.name);
            overwrite(&mut client.email, &details.email);
            overwrite(&mut client.address, &details.address);
        }

        if let Some(details) = &self.business {
            let target = company.get_or_insert_with(|| ExtractedParty::placeholder(PartyRole::Company));
            overwrite(&mut target.name, &details.name);
            overwrite(&mut target.email, &details.email);
            overwrite(&mut target.address, &details.address);
        }
    }

    /// Fill invoice party records, overrides first.
    pub fn apply_to_invoice_parties(&self, client: &mut PartyDetails, company: &mut PartyDetails) {
        if let Some(details) = &self.client {
            overwrite(&mut client.name, &details.name);
            overwrite(&mut client.email, &details.email);
            overwrite(&mut client.address, &details.address);
        }

        if let Some(details) = &self.business {
            overwrite(&mut company.name, &details.name);
            overwrite(&mut company.email, &details.email);
            overwrite(&mut company.address, &details.address);
            if let Some(tax_id) = non_empty(&details.tax_id) {
                company.tax_id = Some(tax_id);
            }
            if let Some(phone) = non_empty(&details.phone) {
                company.phone = Some(phone);
            }
            if let Some(bank) = details.bank() {
                company.bank = Some(bank);
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn overwrite(target: &mut String, value: &Option<String>) {
    if let Some(value) = non_empty(value) {
        *target = value;
    }
}
