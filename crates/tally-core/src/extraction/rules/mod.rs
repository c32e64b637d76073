//! Rule-based field extractors for work descriptions.

pub mod amounts;
pub mod confidence;
pub mod dates;
pub mod enrichment;
pub mod entities;
pub mod line_items;
pub mod notes;
pub mod patterns;
pub mod recurring;
pub mod tax;

pub use amounts::{first_price, parse_price, PriceExtractor, MAX_PRICE_DOLLARS, MAX_QUANTITY};
pub use confidence::{score_confidence, ConfidenceFlags};
pub use dates::{count_weekday_occurrences, parse_date_str, weekday_from_index, DateResolver, DueInfo};
pub use enrichment::Enrichment;
pub use entities::EntityExtractor;
pub use line_items::LineItemExtractor;
pub use notes::{extract_notes, DEFAULT_NOTES};
pub use recurring::{RecurringDetector, RecurringSchedule};
pub use tax::{extract_tax_rate, TaxExtractor};

use regex::{Captures, Regex};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value found in text, with where and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the rule that produced the value.
    pub rule: &'static str,
    /// Byte span in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rule: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            rule,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// One entry of an ordered pattern list: a regex plus the function turning
/// its captures into a value. The function may reject a capture by
/// returning `None`, in which case the next capture of the same rule is tried.
pub struct Rule<T> {
    pub name: &'static str,
    pub pattern: &'static Regex,
    pub extract: fn(&Captures<'_>) -> Option<T>,
}

impl<T> Rule<T> {
    pub fn new(
        name: &'static str,
        pattern: &'static Regex,
        extract: fn(&Captures<'_>) -> Option<T>,
    ) -> Self {
        Self {
            name,
            pattern,
            extract,
        }
    }

    /// Every accepted match of this rule, in text order.
    pub fn apply(&self, text: &str) -> Vec<ExtractionMatch<T>> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let value = (self.extract)(&caps)?;
                let full_match = caps.get(0)?;
                Some(
                    ExtractionMatch::new(value, self.name, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                )
            })
            .collect()
    }

    /// The first accepted match of this rule.
    pub fn first(&self, text: &str) -> Option<ExtractionMatch<T>> {
        self.pattern.captures_iter(text).find_map(|caps| {
            let value = (self.extract)(&caps)?;
            let full_match = caps.get(0)?;
            Some(
                ExtractionMatch::new(value, self.name, full_match.as_str())
                    .with_position(full_match.start(), full_match.end()),
            )
        })
    }
}

/// Evaluate rules in priority order; the first rule with an accepted match wins.
pub fn first_match<T>(rules: &[Rule<T>], text: &str) -> Option<ExtractionMatch<T>> {
    rules.iter().find_map(|rule| rule.first(text))
}

/// Evaluate every rule and keep all accepted matches, rule by rule.
pub fn all_matches<T>(rules: &[Rule<T>], text: &str) -> Vec<ExtractionMatch<T>> {
    rules.iter().flat_map(|rule| rule.apply(text)).collect()
}

const LEADING_CONNECTIVES: &[&str] = &["and ", "plus ", "also ", "then ", "with ", "for ", "the "];
const TRAILING_CONNECTIVES: &[&str] = &[" and", " plus", " also", " then", " with"];

/// Trim a captured description, drop dangling connectives and capitalise it.
pub fn clean_description(raw: &str) -> String {
    let mut text = raw.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '-');
    text = text.trim();

    loop {
        let lower = text.to_ascii_lowercase();
        let Some(prefix) = LEADING_CONNECTIVES.iter().find(|p| lower.starts_with(*p)) else {
            break;
        };
        text = text[prefix.len()..].trim_start();
    }

    loop {
        let lower = text.to_ascii_lowercase();
        let Some(suffix) = TRAILING_CONNECTIVES.iter().find(|s| lower.ends_with(*s)) else {
            break;
        };
        text = text[..text.len() - suffix.len()].trim_end();
    }

    capitalize(text)
}

/// Upper-case the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim a captured free-text value (name, address, note).
pub fn clean_value(raw: &str) -> Option<String> {
    let value = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '“' || c == '”' || c == '\'')
        .trim_end_matches([',', ';', ':'])
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref WORD_NUMBER: Regex = Regex::new(r"([a-z]+)=(\d+)").unwrap();
    }

    fn accept_even(caps: &Captures<'_>) -> Option<u32> {
        caps[2].parse::<u32>().ok().filter(|n| n % 2 == 0)
    }

    #[test]
    fn test_rule_skips_rejected_captures() {
        let rule = Rule::new("even", &WORD_NUMBER, accept_even);
        let found = rule.first("a=1 b=4 c=6").unwrap();
        assert_eq!(found.value, 4);
        assert_eq!(found.source, "b=4");
        assert_eq!(found.position, Some((4, 7)));
        assert_eq!(rule.apply("a=1 b=4 c=6").len(), 2);
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("  and website design "), "Website design");
        assert_eq!(clean_description("logo design plus"), "Logo design");
        assert_eq!(clean_description("the content creation"), "Content creation");
        assert_eq!(clean_description("and ẞtudio shoot plus"), "ẞtudio shoot");
        assert_eq!(clean_description(""), "");
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value(" Acme Corp, "), Some("Acme Corp".to_string()));
        assert_eq!(clean_value("\"Thanks!\""), Some("Thanks!".to_string()));
        assert_eq!(clean_value("  "), None);
    }
}
