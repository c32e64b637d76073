//! Tax rate extraction.

use lazy_static::lazy_static;
use regex::Captures;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use super::patterns::{TAX_FREE, TAX_PERCENT, TAX_RATE_OF, TAX_WITH_VERB};
use super::{first_match, ExtractionMatch, FieldExtractor, Rule};
use crate::models::extraction::DEFAULT_TAX_RATE;

fn percent(caps: &Captures<'_>) -> Option<Decimal> {
    Decimal::from_str(&caps[1]).ok().map(|rate| rate.normalize())
}

fn zero(_: &Captures<'_>) -> Option<Decimal> {
    Some(Decimal::ZERO)
}

lazy_static! {
    /// Tax patterns in priority order.
    static ref TAX_RULES: Vec<Rule<Decimal>> = vec![
        Rule::new("tax_with_verb", &TAX_WITH_VERB, percent),
        Rule::new("tax_percent", &TAX_PERCENT, percent),
        Rule::new("tax_rate_of", &TAX_RATE_OF, percent),
        Rule::new("tax_free", &TAX_FREE, zero),
    ];
}

/// Tax rate extractor (percent).
pub struct TaxExtractor;

impl TaxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TaxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(&TAX_RULES, text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        super::all_matches(&TAX_RULES, text)
    }
}

/// Tax rate named in the text, or the 10% default.
pub fn extract_tax_rate(text: &str) -> Decimal {
    match TaxExtractor::new().extract(text) {
        Some(found) => found.value,
        None => {
            debug!("No tax rate found, using default");
            DEFAULT_TAX_RATE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tax_with_verb() {
        assert_eq!(extract_tax_rate("Apply 8% tax."), Decimal::from(8));
        assert_eq!(extract_tax_rate("including 12.5% GST"), Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_tax_forms() {
        assert_eq!(extract_tax_rate("There is 5% sales tax"), Decimal::from(5));
        assert_eq!(extract_tax_rate("VAT rate of 20%"), Decimal::from(20));
        assert_eq!(extract_tax_rate("tax: 7%"), Decimal::from(7));
    }

    #[test]
    fn test_zero_tax() {
        assert_eq!(extract_tax_rate("This job is tax-free"), Decimal::ZERO);
        assert_eq!(extract_tax_rate("No GST please"), Decimal::ZERO);
    }

    #[test]
    fn test_default_tax() {
        assert_eq!(extract_tax_rate("Website design for $1500"), DEFAULT_TAX_RATE);
    }

    #[test]
    fn test_rule_name_reported() {
        let found = TaxExtractor::new().extract("with 15% VAT").unwrap();
        assert_eq!(found.rule, "tax_with_verb");
        assert_eq!(found.value, Decimal::from(15));
    }
}
