//! Client and company identity extraction.

use lazy_static::lazy_static;
use regex::Captures;
use tracing::debug;

use super::patterns::{
    ADDRESS_LABEL, AT_STREET, CLIENT_COMPOUND, CLIENT_LABEL, CLIENT_NAME_LABEL,
    COMPANY_ADDRESS_LABEL, COMPANY_COMPOUND, COMPANY_EMAIL_LABEL, COMPANY_NAME_LABEL, EMAIL,
    FOR_CAPITALISED, FROM_AT_STREET, FROM_CAPITALISED, INVOICE_FOR, LOCATED_AT, NAME_CUT,
};
use super::{clean_value, first_match, ExtractionMatch, Rule};
use crate::models::extraction::{ExtractedParty, PartyRole};

/// Words that look like names after "for"/"to"/"from" but never are.
const NAME_STOP_WORDS: &[&str] = &[
    "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
    "sundays", "mondays", "tuesdays", "wednesdays", "thursdays", "fridays", "saturdays",
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    "tax", "gst", "vat", "payment", "invoice", "the", "a", "an", "my", "our", "your",
    "this", "that", "services", "service", "work", "total", "notes", "note", "due",
];

/// Words that mark an address label as belonging to the issuing business.
const OWNER_WORDS: &[&str] = &["company", "company's", "business", "business's", "our", "my"];

fn clean_name(raw: &str) -> Option<String> {
    let name = match NAME_CUT.find(raw) {
        Some(cut) => &raw[..cut.start()],
        None => raw,
    };

    let name = clean_value(name)?;
    let first_word = name.split_whitespace().next()?.to_lowercase();
    if NAME_STOP_WORDS.contains(&first_word.as_str()) {
        return None;
    }

    Some(name)
}

fn name(caps: &Captures<'_>) -> Option<String> {
    clean_name(&caps[1])
}

fn address(caps: &Captures<'_>) -> Option<String> {
    clean_value(&caps[1])
}

fn email(caps: &Captures<'_>) -> Option<String> {
    Some(caps[1].to_string())
}

/// Name, email and address captured together.
fn compound(caps: &Captures<'_>) -> Option<ExtractedParty> {
    Some(ExtractedParty {
        name: clean_name(&caps[1])?,
        email: caps[2].to_string(),
        address: clean_value(&caps[3])?,
    })
}

lazy_static! {
    static ref CLIENT_COMPOUND_RULES: Vec<Rule<ExtractedParty>> = vec![
        Rule::new("client_compound", &CLIENT_COMPOUND, compound),
    ];

    /// Client names: explicit labels, then "invoice for X", then bare "for/to X".
    static ref CLIENT_NAME_RULES: Vec<Rule<String>> = vec![
        Rule::new("client_name_label", &CLIENT_NAME_LABEL, name),
        Rule::new("client_label", &CLIENT_LABEL, name),
        Rule::new("invoice_for", &INVOICE_FOR, name),
        Rule::new("for_capitalised", &FOR_CAPITALISED, name),
    ];

    /// Client addresses: explicit label, then "located at", then "at <street>".
    static ref CLIENT_ADDRESS_RULES: Vec<Rule<String>> = vec![
        Rule::new("address_label", &ADDRESS_LABEL, address),
        Rule::new("located_at", &LOCATED_AT, address),
        Rule::new("at_street", &AT_STREET, address),
    ];

    static ref COMPANY_COMPOUND_RULES: Vec<Rule<ExtractedParty>> = vec![
        Rule::new("company_compound", &COMPANY_COMPOUND, compound),
    ];

    static ref COMPANY_NAME_RULES: Vec<Rule<String>> = vec![
        Rule::new("company_name_label", &COMPANY_NAME_LABEL, name),
        Rule::new("from_capitalised", &FROM_CAPITALISED, name),
    ];

    static ref COMPANY_EMAIL_RULES: Vec<Rule<String>> = vec![
        Rule::new("company_email_label", &COMPANY_EMAIL_LABEL, email),
    ];

    static ref COMPANY_ADDRESS_RULES: Vec<Rule<String>> = vec![
        Rule::new("company_address_label", &COMPANY_ADDRESS_LABEL, address),
        Rule::new("from_at_street", &FROM_AT_STREET, address),
    ];
}

/// Which entity patterns are in play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntityProfile {
    /// Labels and "invoice for X" only; no compound or bare patterns.
    Basic,
    /// Every pattern, compound first.
    #[default]
    Full,
}

/// Extracts one party from free text.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    role: PartyRole,
    profile: EntityProfile,
    excluded_emails: Vec<String>,
}

impl EntityExtractor {
    pub fn new(role: PartyRole) -> Self {
        Self {
            role,
            profile: EntityProfile::Full,
            excluded_emails: Vec::new(),
        }
    }

    pub fn client() -> Self {
        Self::new(PartyRole::Client)
    }

    pub fn company() -> Self {
        Self::new(PartyRole::Company)
    }

    pub fn with_profile(mut self, profile: EntityProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Never report this email for the role (e.g. the client's email when
    /// extracting the company).
    pub fn excluding_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        if !email.trim().is_empty() {
            self.excluded_emails.push(email.to_lowercase());
        }
        self
    }

    /// Extract the party. Fields that are not found keep the role's placeholder.
    pub fn extract(&self, text: &str) -> ExtractedParty {
        let mut party = ExtractedParty::placeholder(self.role);

        if self.profile == EntityProfile::Full {
            let compound_rules: &[Rule<ExtractedParty>] = match self.role {
                PartyRole::Client => &CLIENT_COMPOUND_RULES,
                PartyRole::Company => &COMPANY_COMPOUND_RULES,
            };
            let found = first_match(compound_rules, text)
                .filter(|m| !self.is_excluded(&m.value.email));
            if let Some(found) = found {
                debug!(role = ?self.role, rule = found.rule, "Compound party match");
                return found.value;
            }
        }

        if let Some(found) = self.find_name(text) {
            debug!(role = ?self.role, rule = found.rule, "Party name");
            party.name = found.value;
        }

        if let Some(email) = self.find_email(text) {
            party.email = email;
        }

        if let Some(found) = self.find_address(text) {
            debug!(role = ?self.role, rule = found.rule, "Party address");
            party.address = found.value;
        }

        party
    }

    fn find_name(&self, text: &str) -> Option<ExtractionMatch<String>> {
        match (self.role, self.profile) {
            (PartyRole::Client, EntityProfile::Full) => first_match(&CLIENT_NAME_RULES, text),
            (PartyRole::Client, EntityProfile::Basic) => {
                first_match(&CLIENT_NAME_RULES[..3], text)
            }
            (PartyRole::Company, _) => first_match(&COMPANY_NAME_RULES, text),
        }
    }

    fn find_email(&self, text: &str) -> Option<String> {
        if self.role == PartyRole::Company {
            let labelled = COMPANY_EMAIL_RULES
                .iter()
                .flat_map(|rule| rule.apply(text))
                .map(|m| m.value)
                .find(|email| !self.is_excluded(email));
            if labelled.is_some() {
                return labelled;
            }
        }

        EMAIL
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .find(|email| !self.is_excluded(email))
    }

    fn find_address(&self, text: &str) -> Option<ExtractionMatch<String>> {
        match self.role {
            PartyRole::Company => first_match(&COMPANY_ADDRESS_RULES, text),
            PartyRole::Client => {
                let rules: &[Rule<String>] = match self.profile {
                    EntityProfile::Full => &CLIENT_ADDRESS_RULES,
                    EntityProfile::Basic => &CLIENT_ADDRESS_RULES[..2],
                };
                let issuer = issuer_address_spans(text);
                rules.iter().find_map(|rule| {
                    rule.apply(text).into_iter().find(|m| {
                        !preceded_by_owner(text, m.position) && !overlaps_any(m.position, &issuer)
                    })
                })
            }
        }
    }

    fn is_excluded(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.excluded_emails.iter().any(|e| *e == email)
    }
}

/// True when the word before the match is "our", "company" and the like.
fn preceded_by_owner(text: &str, position: Option<(usize, usize)>) -> bool {
    let Some((start, _)) = position else {
        return false;
    };
    text[..start]
        .split_whitespace()
        .next_back()
        .map(|word| OWNER_WORDS.contains(&word.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Spans of addresses that the company patterns attribute to the issuer.
fn issuer_address_spans(text: &str) -> Vec<(usize, usize)> {
    let from_at = FROM_AT_STREET.captures_iter(text).filter_map(|caps| caps.get(1));
    let compound = COMPANY_COMPOUND.captures_iter(text).filter_map(|caps| caps.get(3));
    from_at
        .chain(compound)
        .map(|m| (m.start(), m.end()))
        .collect()
}

fn overlaps_any(position: Option<(usize, usize)>, spans: &[(usize, usize)]) -> bool {
    let Some((start, end)) = position else {
        return false;
    };
    spans.iter().any(|(s, e)| start < *e && *s < end)
}

/// Email labelled as the issuer's own, used to keep it off the client.
pub fn labelled_company_email(text: &str) -> Option<String> {
    COMPANY_EMAIL_RULES
        .iter()
        .find_map(|rule| rule.first(text))
        .map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extraction::{DEFAULT_CLIENT_ADDRESS, DEFAULT_CLIENT_EMAIL, DEFAULT_COMPANY_NAME};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compound_client() {
        let text = "Invoice for Acme Corp (billing@acme.com) at 1 Main St. Logo design for $350.";
        let client = EntityExtractor::client().extract(text);

        assert_eq!(
            client,
            ExtractedParty {
                name: "Acme Corp".to_string(),
                email: "billing@acme.com".to_string(),
                address: "1 Main St".to_string(),
            }
        );
    }

    #[test]
    fn test_name_cut_with_non_ascii_name() {
        let text = "Client name is GROẞÉ at 5 Main St. Logo for $300.";
        let client = EntityExtractor::client().extract(text);
        assert_eq!(client.name, "GROẞÉ");
        assert_eq!(client.address, "5 Main St");

        let text = "Client name is KİLN Studio who pays late";
        assert_eq!(EntityExtractor::client().extract(text).name, "KİLN Studio");
    }

    #[test]
    fn test_label_beats_invoice_for() {
        let text = "Invoice for Website Redesign. Client name is Jane Doe, email jane@doe.io";
        let client = EntityExtractor::client().extract(text);
        assert_eq!(client.name, "Jane Doe");
        assert_eq!(client.email, "jane@doe.io");
        assert_eq!(client.address, DEFAULT_CLIENT_ADDRESS);
    }

    #[test]
    fn test_bare_for_skips_calendar_words() {
        let text = "Papers for Sunday at $2.50, billed to Margaret Smith";
        let client = EntityExtractor::client().extract(text);
        assert_eq!(client.name, "Margaret Smith");
    }

    #[test]
    fn test_basic_profile_ignores_bare_for() {
        let text = "Gardening work for Tom Baker, $200";
        let full = EntityExtractor::client().extract(text);
        let basic = EntityExtractor::client()
            .with_profile(EntityProfile::Basic)
            .extract(text);

        assert_eq!(full.name, "Tom Baker");
        assert!(!basic.has_name());
    }

    #[test]
    fn test_client_address_forms() {
        let text = "Client: Bob's Bakery. Address: 9 High Road, Leeds";
        let client = EntityExtractor::client().extract(text);
        assert_eq!(client.name, "Bob's Bakery");
        assert_eq!(client.address, "9 High Road, Leeds");

        let text = "Our address is 4 King St. Bill to: Oak Ltd, located at 7 Elm Way";
        let client = EntityExtractor::client().extract(text);
        assert_eq!(client.name, "Oak Ltd");
        assert_eq!(client.address, "7 Elm Way");
    }

    #[test]
    fn test_missing_fields_keep_placeholders() {
        let client = EntityExtractor::client().extract("website design for $1500");
        assert!(client.is_placeholder());
        assert_eq!(client.email, DEFAULT_CLIENT_EMAIL);
    }

    #[test]
    fn test_company_excludes_client_email() {
        let text = "Invoice for Acme Corp (billing@acme.com) at 1 Main St. From Studio Nine, hello@studio9.com";
        let client = EntityExtractor::client().extract(text);
        let company = EntityExtractor::company()
            .excluding_email(&client.email)
            .extract(text);

        assert_eq!(company.name, "Studio Nine");
        assert_eq!(company.email, "hello@studio9.com");
    }

    #[test]
    fn test_company_single_email_is_clients() {
        let text = "Send to Dana (dana@x.org) at 3 Lane Rd";
        let client = EntityExtractor::client().extract(text);
        let company = EntityExtractor::company()
            .excluding_email(&client.email)
            .extract(text);

        assert_eq!(client.email, "dana@x.org");
        assert!(company.is_placeholder());
        assert_eq!(company.name, DEFAULT_COMPANY_NAME);
    }

    #[test]
    fn test_company_labels() {
        let text = "My business name is Fern & Co. Our email is hi@fern.co. Our address is 2 Park Ave";
        let company = EntityExtractor::company().extract(text);

        assert_eq!(company.name, "Fern & Co");
        assert_eq!(company.email, "hi@fern.co");
        assert_eq!(company.address, "2 Park Ave");
        assert_eq!(labelled_company_email(text).as_deref(), Some("hi@fern.co"));
    }

    #[test]
    fn test_client_address_skips_issuer_address() {
        let text = "From Studio Nine at 4 King St. Invoice for Acme Corp at 9 Elm Rd.";
        let client = EntityExtractor::client().extract(text);
        assert_eq!(client.name, "Acme Corp");
        assert_eq!(client.address, "9 Elm Rd");
    }

    #[test]
    fn test_company_from_at_street() {
        let company = EntityExtractor::company().extract("Invoice from Blue Studio at 12 Baker Street");
        assert_eq!(company.name, "Blue Studio");
        assert_eq!(company.address, "12 Baker Street");
    }
}
