//! Dollar price extraction.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::PRICE_TOKEN;
use super::{ExtractionMatch, FieldExtractor};

/// Prices above this many dollars are not read as prices.
pub const MAX_PRICE_DOLLARS: i64 = 1_000_000_000_000;

/// Largest quantity read from free text or a remote response.
pub const MAX_QUANTITY: u32 = 100_000;

/// Price token extractor (`$1500`, `$1,500.00`, `$ 75`).
pub struct PriceExtractor;

impl PriceExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PriceExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        PRICE_TOKEN
            .captures_iter(text)
            .filter_map(|caps| {
                let amount = parse_price(&caps[1])?;
                let full_match = caps.get(0)?;
                Some(
                    ExtractionMatch::new(amount, "price", full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                )
            })
            .collect()
    }
}

/// Parse a captured price number, stripping `$` and thousands separators.
pub fn parse_price(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .ok()
        .filter(|amount| within_price_range(*amount))
        .map(|amount| amount.normalize())
}

/// Non-negative and no more than [`MAX_PRICE_DOLLARS`].
pub fn within_price_range(amount: Decimal) -> bool {
    !amount.is_sign_negative() && amount <= Decimal::from(MAX_PRICE_DOLLARS)
}

/// First `$` price anywhere in the text.
pub fn first_price(text: &str) -> Option<Decimal> {
    PriceExtractor::new().extract(text).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("1500"), Some(Decimal::from(1500)));
        assert_eq!(parse_price("1,500.00"), Some(Decimal::from(1500)));
        assert_eq!(parse_price("$75.5"), Some(Decimal::from_str("75.5").unwrap()));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price("-5"), None);
    }

    #[test]
    fn test_parse_price_rejects_out_of_range() {
        assert_eq!(parse_price("1,000,000,000,000"), Some(Decimal::from(MAX_PRICE_DOLLARS)));
        assert_eq!(parse_price("1000000000000.01"), None);
        assert_eq!(parse_price("9999999999999999999999999"), None);
        assert_eq!(parse_price("70000000000000000000000000000"), None);
        assert_eq!(first_price("Logo for $70000000000000000000000000000"), None);
    }

    #[test]
    fn test_extract_all_prices() {
        let extractor = PriceExtractor::new();
        let prices = extractor.extract_all("Design for $1,500 and hosting at $20.50 a month");

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].value, Decimal::from(1500));
        assert_eq!(prices[0].source, "$1,500");
        assert_eq!(prices[1].value, Decimal::from_str("20.50").unwrap());
    }

    #[test]
    fn test_first_price_missing() {
        assert_eq!(first_price("Some consulting work, 500 dollars"), None);
        assert_eq!(first_price("pay $ 40 now"), Some(Decimal::from(40)));
    }
}
