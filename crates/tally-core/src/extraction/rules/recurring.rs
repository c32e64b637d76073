//! Recurring delivery schedules ("Herald newspaper 04/01/2025 - 04/30/2025,
//! $2.50 on Sundays, weekdays are $1.80").

use chrono::{NaiveDate, Weekday};
use rust_decimal::Decimal;
use tracing::debug;

use super::amounts::parse_price;
use super::dates::{count_weekday_occurrences, parse_date_str};
use super::patterns::{DATE_RANGE, PRICE_ON_WEEKDAY, PUBLICATION, WEEKDAY_COSTS_PRICE};
use crate::models::invoice::LineItem;

/// Publication name used when the text names none.
pub const DEFAULT_PUBLICATION: &str = "Newspaper";

/// Leading words that are not part of a publication name.
const PUBLICATION_SKIP: &[&str] = &[
    "the", "my", "our", "a", "deliver", "delivered", "delivering", "invoice", "bill",
    "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
    "sundays", "mondays", "tuesdays", "wednesdays", "thursdays", "fridays", "saturdays",
];

/// Detects recurring-delivery descriptions by keyword.
#[derive(Debug, Clone)]
pub struct RecurringDetector {
    keywords: Vec<String>,
}

impl RecurringDetector {
    /// Keywords are matched case-insensitively as substrings.
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_recurring(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Parse the schedule, if the text is in recurring mode and has both a
    /// date range and at least one priced weekday.
    pub fn schedule(&self, text: &str, today: NaiveDate) -> Option<RecurringSchedule> {
        if !self.is_recurring(text) {
            return None;
        }

        let Some((start, end)) = date_range(text, today) else {
            debug!("Recurring keyword present but no date range");
            return None;
        };

        let prices = weekday_prices(text);
        if prices.is_empty() {
            debug!("Recurring keyword present but no priced weekdays");
            return None;
        }

        debug!(
            start = %start,
            end = %end,
            priced = prices.len(),
            "Recurring schedule"
        );

        Some(RecurringSchedule {
            start,
            end,
            publication: publication_name(text),
            prices,
        })
    }
}

/// A delivery run over an inclusive date range with per-weekday prices.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringSchedule {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub publication: String,
    /// Priced weekdays in order of first mention.
    pub prices: Vec<(Weekday, Decimal)>,
}

impl RecurringSchedule {
    /// One item per priced weekday that occurs in the range.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.prices
            .iter()
            .filter_map(|(weekday, price)| {
                let count = count_weekday_occurrences(self.start, self.end, *weekday);
                if count == 0 {
                    return None;
                }
                Some(LineItem::new(
                    format!("{} {} Delivery", day_name(*weekday), self.publication),
                    count,
                    *price,
                ))
            })
            .collect()
    }
}

fn date_range(text: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    DATE_RANGE.captures_iter(text).find_map(|caps| {
        let start = parse_date_str(&caps[1], today)?;
        let end = parse_date_str(&caps[2], today)?;
        Some((start, end))
    })
}

/// Prices from both "$X on <day>" and "<day> is $X", first per weekday wins.
fn weekday_prices(text: &str) -> Vec<(Weekday, Decimal)> {
    let mut found: Vec<(usize, Weekday, Decimal)> = Vec::new();

    for caps in PRICE_ON_WEEKDAY.captures_iter(text) {
        if let (Some(price), Ok(day), Some(m)) =
            (parse_price(&caps[1]), caps[2].parse::<Weekday>(), caps.get(0))
        {
            found.push((m.start(), day, price));
        }
    }

    for caps in WEEKDAY_COSTS_PRICE.captures_iter(text) {
        if let (Ok(day), Some(price), Some(m)) =
            (caps[1].parse::<Weekday>(), parse_price(&caps[2]), caps.get(0))
        {
            found.push((m.start(), day, price));
        }
    }

    found.sort_by_key(|(position, _, _)| *position);

    let mut prices: Vec<(Weekday, Decimal)> = Vec::new();
    for (_, day, price) in found {
        if !prices.iter().any(|(d, _)| *d == day) {
            prices.push((day, price));
        }
    }
    prices
}

fn publication_name(text: &str) -> String {
    PUBLICATION
        .captures_iter(text)
        .find_map(|caps| {
            let words: Vec<&str> = caps[1]
                .split_whitespace()
                .skip_while(|word| PUBLICATION_SKIP.contains(&word.to_lowercase().as_str()))
                .collect();
            (!words.is_empty()).then(|| words.join(" "))
        })
        .unwrap_or_else(|| DEFAULT_PUBLICATION.to_string())
}

/// Full English weekday name.
pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
    }

    fn detector() -> RecurringDetector {
        RecurringDetector::new(vec!["newspaper".to_string(), "paper round".to_string()])
    }

    #[test]
    fn test_keyword_detection() {
        assert!(detector().is_recurring("Herald NEWSPAPER delivery"));
        assert!(!detector().is_recurring("Website design for $1500"));
    }

    #[test]
    fn test_schedule_line_items() {
        let text = "Invoice for Herald newspaper delivery 04/01/2025 - 04/30/2025. \
                    $2.50 on Sundays, Tuesday is $1.80.";
        let schedule = detector().schedule(text, today()).unwrap();

        assert_eq!(schedule.publication, "Herald");
        assert_eq!(schedule.prices.len(), 2);

        let items = schedule.line_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Sunday Herald Delivery");
        assert_eq!(items[0].quantity(), 4);
        assert_eq!(items[0].unit_price(), Decimal::from_str("2.50").unwrap());
        assert_eq!(items[1].description, "Tuesday Herald Delivery");
        assert_eq!(items[1].quantity(), 5);
        assert_eq!(items[1].amount(), Decimal::from(9));
    }

    #[test]
    fn test_first_price_per_weekday_wins() {
        let prices = weekday_prices("Sunday is $3, and later $4 on Sunday");
        assert_eq!(prices, vec![(Weekday::Sun, Decimal::from(3))]);
    }

    #[test]
    fn test_zero_occurrence_days_skipped() {
        let schedule = RecurringSchedule {
            start: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            publication: DEFAULT_PUBLICATION.to_string(),
            prices: vec![(Weekday::Tue, Decimal::ONE), (Weekday::Fri, Decimal::ONE)],
        };
        let items = schedule.line_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Tuesday Newspaper Delivery");
    }

    #[test]
    fn test_missing_range_or_prices() {
        assert!(detector().schedule("newspaper $2 on Sundays", today()).is_none());
        assert!(detector()
            .schedule("newspaper 04/01/2025 to 04/30/2025, Sundays", today())
            .is_none());
    }

    #[test]
    fn test_publication_name() {
        assert_eq!(publication_name("the Daily Telegraph newspaper run"), "Daily Telegraph");
        assert_eq!(publication_name("Deliver The Courier Mail paper"), "Courier Mail");
        assert_eq!(publication_name("papers every day"), DEFAULT_PUBLICATION);
    }
}
