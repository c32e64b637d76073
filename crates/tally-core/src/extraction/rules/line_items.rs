//! Priced line item extraction.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Captures;
use rust_decimal::Decimal;
use tracing::debug;

use super::amounts::{first_price, parse_price, MAX_QUANTITY};
use super::patterns::{
    DESCRIPTION_DASH_PRICE, DESCRIPTION_FOR_PRICE, HOURS_OF, PRICE_FOR_DESCRIPTION, UNITS_AT,
};
use super::recurring::RecurringDetector;
use super::{clean_description, ExtractionMatch, Rule};
use crate::models::invoice::LineItem;

/// Unit price of the fallback item when the text has no price at all.
pub const DEFAULT_ITEM_PRICE: Decimal = Decimal::ONE_HUNDRED;

/// Keyword to fallback description, first hit wins.
const DEFAULT_DESCRIPTIONS: &[(&str, &str)] = &[
    ("web", "Website Development Services"),
    ("design", "Design Services"),
    ("content", "Content Creation Services"),
    ("consulting", "Consulting Services"),
    ("marketing", "Marketing Services"),
    ("seo", "SEO Services"),
    ("hosting", "Hosting Services"),
];

const FALLBACK_DESCRIPTION: &str = "Professional Services";

/// Captured descriptions that are labels, not work.
const DESCRIPTION_STOP_WORDS: &[&str] = &[
    "total", "subtotal", "sub-total", "tax", "gst", "vat", "amount", "price", "cost", "balance",
    "it", "this", "that", "which", "each", "everything", "all",
];

fn generic_item(description: &str, price: &str) -> Option<LineItem> {
    let description = clean_description(description);
    if description.is_empty() || DESCRIPTION_STOP_WORDS.contains(&description.to_lowercase().as_str()) {
        return None;
    }
    Some(LineItem::new(description, 1, parse_price(price)?))
}

fn price_then_description(caps: &Captures<'_>) -> Option<LineItem> {
    generic_item(&caps[2], &caps[1])
}

fn description_then_price(caps: &Captures<'_>) -> Option<LineItem> {
    generic_item(&caps[1], &caps[2])
}

lazy_static! {
    /// Single-unit item patterns in priority order.
    static ref GENERIC_RULES: Vec<Rule<LineItem>> = vec![
        Rule::new("price_for_description", &PRICE_FOR_DESCRIPTION, price_then_description),
        Rule::new("description_for_price", &DESCRIPTION_FOR_PRICE, description_then_price),
        Rule::new("description_dash_price", &DESCRIPTION_DASH_PRICE, description_then_price),
    ];
}

/// Which item patterns an extractor applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPatterns {
    /// `$PRICE for DESCRIPTION`
    pub price_first: bool,
    /// `DESCRIPTION for/at/costs/: $PRICE`
    pub description_first: bool,
    /// `DESCRIPTION - $PRICE`
    pub dash: bool,
    /// `N hours of X at $P`, `N X at $P each`
    pub quantity: bool,
}

impl ItemPatterns {
    pub const ALL: ItemPatterns = ItemPatterns {
        price_first: true,
        description_first: true,
        dash: true,
        quantity: true,
    };

    /// The two plain "for" forms only.
    pub const BASIC: ItemPatterns = ItemPatterns {
        price_first: true,
        description_first: true,
        dash: false,
        quantity: false,
    };

    fn generic_rules(&self) -> impl Iterator<Item = &'static Rule<LineItem>> + '_ {
        let enabled = [self.price_first, self.description_first, self.dash];
        GENERIC_RULES
            .iter()
            .zip(enabled)
            .filter_map(|(rule, on)| on.then_some(rule))
    }
}

impl Default for ItemPatterns {
    fn default() -> Self {
        Self::ALL
    }
}

/// Extracts line items, with recurring-delivery expansion and a default item.
#[derive(Debug, Clone)]
pub struct LineItemExtractor {
    today: NaiveDate,
    patterns: ItemPatterns,
    recurring: Option<RecurringDetector>,
    dedupe: bool,
}

impl LineItemExtractor {
    /// All patterns, no recurring mode, no de-duplication.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            patterns: ItemPatterns::ALL,
            recurring: None,
            dedupe: false,
        }
    }

    pub fn with_patterns(mut self, patterns: ItemPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_recurring(mut self, detector: RecurringDetector) -> Self {
        self.recurring = Some(detector);
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Items found in the text, or the single default item.
    pub fn extract(&self, text: &str) -> Vec<LineItem> {
        let items = self.find_items(text);
        if items.is_empty() {
            debug!("No line items matched, using default item");
            return vec![default_item(text)];
        }
        items
    }

    /// Items found in the text, possibly none.
    ///
    /// A recurring schedule, when present, replaces every other pattern.
    /// Otherwise the single-unit and quantity passes both run, so the same
    /// phrase can yield two items unless de-duplication is on. Within the
    /// single-unit pass the rules run in priority order and a span claimed
    /// by an earlier rule is skipped by later ones, so one `$` price yields
    /// at most one single-unit item.
    pub fn find_items(&self, text: &str) -> Vec<LineItem> {
        if let Some(schedule) = self
            .recurring
            .as_ref()
            .and_then(|detector| detector.schedule(text, self.today))
        {
            let items = schedule.line_items();
            if !items.is_empty() {
                debug!(items = items.len(), "Recurring delivery items");
                return items;
            }
        }

        let generic = self.generic_matches(text);
        let quantity = if self.patterns.quantity {
            quantity_matches(text)
        } else {
            Vec::new()
        };

        debug!(generic = generic.len(), quantity = quantity.len(), "Line item matches");

        let generic: Vec<LineItem> = generic.into_iter().map(|m| m.value).collect();
        let quantity: Vec<LineItem> = quantity.into_iter().map(|m| m.value).collect();

        if self.dedupe {
            dedupe_items(generic, quantity)
        } else {
            generic.into_iter().chain(quantity).collect()
        }
    }

    /// Generic matches in rule order; a match overlapping the span of an
    /// already accepted match is dropped.
    fn generic_matches(&self, text: &str) -> Vec<ExtractionMatch<LineItem>> {
        let mut accepted: Vec<ExtractionMatch<LineItem>> = Vec::new();

        for rule in self.patterns.generic_rules() {
            for found in rule.apply(text) {
                let overlaps = match found.position {
                    Some((start, end)) => accepted
                        .iter()
                        .filter_map(|a| a.position)
                        .any(|(s, e)| start < e && s < end),
                    None => false,
                };
                if !overlaps {
                    accepted.push(found);
                }
            }
        }

        accepted
    }
}

/// Hours and unit-count items, in text order.
fn quantity_matches(text: &str) -> Vec<ExtractionMatch<LineItem>> {
    let mut found = Vec::new();

    for caps in HOURS_OF.captures_iter(text) {
        if let Some(item) = quantity_item(&caps) {
            push_match(&mut found, item, "hours_of", &caps);
        }
    }

    for caps in UNITS_AT.captures_iter(text) {
        let Some(count) = caps.get(1) else {
            continue;
        };
        // A count glued to "$", a digit or a decimal point is part of a price
        let glued = text[..count.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c == '$' || c == ',' || c == '.' || c.is_ascii_digit());
        if glued || caps[2].trim_start().to_lowercase().starts_with("hour") {
            continue;
        }
        if let Some(item) = quantity_item(&caps) {
            push_match(&mut found, item, "units_at", &caps);
        }
    }

    found.sort_by_key(|m| m.position.map(|(start, _)| start));
    found
}

fn quantity_item(caps: &Captures<'_>) -> Option<LineItem> {
    let quantity: u32 = caps[1].parse().ok()?;
    if quantity == 0 || quantity > MAX_QUANTITY {
        return None;
    }
    let description = clean_description(&caps[2]);
    if description.is_empty() {
        return None;
    }
    Some(LineItem::new(description, quantity, parse_price(&caps[3])?))
}

fn push_match(
    found: &mut Vec<ExtractionMatch<LineItem>>,
    item: LineItem,
    rule: &'static str,
    caps: &Captures<'_>,
) {
    if let Some(m) = caps.get(0) {
        found.push(ExtractionMatch::new(item, rule, m.as_str()).with_position(m.start(), m.end()));
    }
}

/// Lower-cased description without quantity words, for comparisons.
fn normalise(description: &str) -> String {
    let lower = description.to_lowercase();
    let words: Vec<&str> = lower
        .split_whitespace()
        .skip_while(|w| {
            w.chars().all(|c| c.is_ascii_digit())
                || matches!(*w, "hour" | "hours" | "hr" | "hrs" | "of")
        })
        .collect();
    words.join(" ")
}

/// Collapse identical generic items and drop generic items a quantity item
/// already covers (same unit price, same normalised description).
fn dedupe_items(generic: Vec<LineItem>, quantity: Vec<LineItem>) -> Vec<LineItem> {
    let mut kept: Vec<LineItem> = Vec::new();

    for item in generic {
        if kept.contains(&item) {
            continue;
        }
        let key = normalise(&item.description);
        let superseded = quantity.iter().any(|q| {
            q.unit_price() == item.unit_price() && {
                let q_key = normalise(&q.description);
                !q_key.is_empty() && (key == q_key || key.ends_with(&q_key))
            }
        });
        if !superseded {
            kept.push(item);
        }
    }

    kept.extend(quantity);
    kept
}

/// The single fallback item: description by keyword, first price or 100.
pub fn default_item(text: &str) -> LineItem {
    LineItem::new(
        default_description(text),
        1,
        first_price(text).unwrap_or(DEFAULT_ITEM_PRICE),
    )
}

/// Fallback description chosen by keyword.
pub fn default_description(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    DEFAULT_DESCRIPTIONS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, description)| *description)
        .unwrap_or(FALLBACK_DESCRIPTION)
}
