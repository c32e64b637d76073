//! Due date resolution and calendar helpers.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::patterns::{
    DAY_MONTH_DATE, DUE_IN, DUE_TRIGGER, MONTH_DAY_DATE, NET_TERMS, NUMERIC_DATE, PAYMENT_TERMS,
    TRIGGER_FILLER,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ExtractionError;

/// Resolved payment terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueInfo {
    /// Relative terms in days, when the text gave them.
    pub due_days: Option<u32>,
    /// Absolute due date, given directly or derived from `due_days`.
    pub due_date: Option<NaiveDate>,
}

impl DueInfo {
    pub fn is_empty(&self) -> bool {
        self.due_days.is_none() && self.due_date.is_none()
    }
}

/// Resolves due dates relative to a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    today: NaiveDate,
}

impl DateResolver {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Find payment terms in free text.
    ///
    /// Relative terms ("due in 14 days", "net 30") win over absolute dates.
    /// Weeks count as 7 days and months as 30, not calendar months.
    pub fn resolve(&self, text: &str) -> DueInfo {
        if let Some(days) = relative_due_days(text) {
            return DueInfo {
                due_days: Some(days),
                due_date: self.today.checked_add_days(Days::new(u64::from(days))),
            };
        }

        if let Some(trigger) = DUE_TRIGGER.find(text) {
            let rest = &text[trigger.end()..];
            let rest = match TRIGGER_FILLER.find(rest) {
                Some(filler) => &rest[filler.end()..],
                None => rest,
            };

            return match self.leading_date(rest) {
                Ok(date) => DueInfo {
                    due_days: None,
                    due_date: Some(date),
                },
                Err(err) => {
                    warn!(
                        trigger = trigger.as_str(),
                        error = %err,
                        "Unparseable due date after trigger phrase"
                    );
                    DueInfo::default()
                }
            };
        }

        let dates = DateTokenExtractor::new(self.today).extract_all(text);
        let chosen = dates
            .iter()
            .map(|m| m.value)
            .filter(|date| *date > self.today)
            .min()
            .or_else(|| dates.last().map(|m| m.value));

        if chosen.is_none() {
            debug!("No due date found");
        }

        DueInfo {
            due_days: None,
            due_date: chosen,
        }
    }

    /// The date token that opens `rest`.
    fn leading_date(&self, rest: &str) -> Result<NaiveDate, ExtractionError> {
        DateTokenExtractor::new(self.today)
            .extract_all(rest)
            .into_iter()
            .find(|m| m.position.is_some_and(|(start, _)| start == 0))
            .map(|m| m.value)
            .ok_or_else(|| {
                let snippet: String = rest.chars().take(24).collect();
                ExtractionError::InvalidDate(snippet.trim().to_string())
            })
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

fn relative_due_days(text: &str) -> Option<u32> {
    if let Some(caps) = DUE_IN.captures(text) {
        let n: u32 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let factor = if unit.starts_with("week") {
            7
        } else if unit.starts_with("month") {
            30
        } else {
            1
        };
        return n.checked_mul(factor);
    }

    if let Some(caps) = NET_TERMS.captures(text) {
        return caps[1].parse().ok();
    }

    PAYMENT_TERMS
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Date token extractor covering numeric and month-name forms.
pub struct DateTokenExtractor {
    today: NaiveDate,
}

impl DateTokenExtractor {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl FieldExtractor for DateTokenExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<ExtractionMatch<NaiveDate>> = Vec::new();

        let forms: [(&'static str, &Regex, DateForm); 3] = [
            ("numeric_date", &*NUMERIC_DATE, numeric_form as DateForm),
            ("month_day_date", &*MONTH_DAY_DATE, month_day_form as DateForm),
            ("day_month_date", &*DAY_MONTH_DATE, day_month_form as DateForm),
        ];

        for (name, pattern, build) in forms {
            for caps in pattern.captures_iter(text) {
                let Some(full_match) = caps.get(0) else {
                    continue;
                };
                let (start, end) = (full_match.start(), full_match.end());

                // Spans already claimed by an earlier form are skipped
                let overlaps = results
                    .iter()
                    .filter_map(|r| r.position)
                    .any(|(s, e)| start < e && s < end);
                if overlaps {
                    continue;
                }

                if let Some(date) = build(&caps, self.today) {
                    results.push(
                        ExtractionMatch::new(date, name, full_match.as_str())
                            .with_position(start, end),
                    );
                }
            }
        }

        results.sort_by_key(|m| m.position.map(|(start, _)| start));
        results
    }
}

/// Parse a date string.
///
/// Numeric forms are tried as `MM/DD/YYYY`, then `DD/MM/YYYY`, then
/// `YYYY/MM/DD`; `-` and `.` separators are accepted too. Month-name forms
/// (`May 15, 2025`, `15th of May`) follow. A missing year means the next
/// occurrence on or after `today`.
pub fn parse_date_str(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().trim_end_matches(['.', ',', ';']);
    if s.is_empty() {
        return None;
    }

    let covers =
        |caps: &Captures<'_>| caps.get(0).is_some_and(|m| m.start() == 0 && m.end() == s.len());

    if let Some(caps) = NUMERIC_DATE.captures(s).filter(covers) {
        return numeric_form(&caps, today);
    }

    if let Some(caps) = MONTH_DAY_DATE.captures(s).filter(covers) {
        return month_day_form(&caps, today);
    }

    if let Some(caps) = DAY_MONTH_DATE.captures(s).filter(covers) {
        return day_month_form(&caps, today);
    }

    None
}

type DateForm = fn(&Captures<'_>, NaiveDate) -> Option<NaiveDate>;

fn numeric_form(caps: &Captures<'_>, _today: NaiveDate) -> Option<NaiveDate> {
    parse_numeric(&caps[1], &caps[2], &caps[3])
}

fn month_day_form(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let month = month_from_name(&caps[1])?;
    let day = caps[2].parse().ok()?;
    named_date(month, day, caps.get(3).map(|m| m.as_str()), today)
}

fn day_month_form(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let month = month_from_name(&caps[2])?;
    let day = caps[1].parse().ok()?;
    named_date(month, day, caps.get(3).map(|m| m.as_str()), today)
}

fn parse_numeric(a: &str, b: &str, c: &str) -> Option<NaiveDate> {
    let second: u32 = b.parse().ok()?;

    if a.len() == 4 {
        let year: i32 = a.parse().ok()?;
        let day: u32 = c.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, second, day);
    }

    if a.len() > 2 {
        return None;
    }

    let first: u32 = a.parse().ok()?;
    let year = parse_year(c)?;

    NaiveDate::from_ymd_opt(year, first, second).or_else(|| NaiveDate::from_ymd_opt(year, second, first))
}

fn named_date(month: u32, day: u32, year: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year.parse().ok()?, month, day);
    }

    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

/// Two-digit years below 50 are 20xx, the rest 19xx.
fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        1 | 2 if year < 50 => Some(2000 + year),
        1 | 2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Map the 0=Sunday..6=Saturday index onto a weekday.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Count how often `weekday` falls within `start..=end`.
pub fn count_weekday_occurrences(start: NaiveDate, end: NaiveDate, weekday: Weekday) -> u32 {
    if end < start {
        return 0;
    }

    let count = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| day.weekday() == weekday)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolver() -> DateResolver {
        DateResolver::new(date(2025, 4, 10))
    }

    #[test]
    fn test_count_weekdays_april_2025() {
        let start = date(2025, 4, 1);
        let end = date(2025, 4, 30);

        // April 1st 2025 is a Tuesday
        assert_eq!(start.weekday(), Weekday::Tue);
        assert_eq!(count_weekday_occurrences(start, end, Weekday::Tue), 5);
        assert_eq!(count_weekday_occurrences(start, end, Weekday::Wed), 5);
        assert_eq!(count_weekday_occurrences(start, end, Weekday::Thu), 4);
        assert_eq!(count_weekday_occurrences(start, end, Weekday::Sun), 4);
    }

    #[test]
    fn test_count_weekdays_edges() {
        let day = date(2025, 4, 1);
        assert_eq!(count_weekday_occurrences(day, day, Weekday::Tue), 1);
        assert_eq!(count_weekday_occurrences(day, day, Weekday::Mon), 0);
        assert_eq!(count_weekday_occurrences(date(2025, 4, 30), day, Weekday::Tue), 0);
    }

    #[test]
    fn test_weekday_from_index() {
        assert_eq!(weekday_from_index(0), Some(Weekday::Sun));
        assert_eq!(weekday_from_index(2), Some(Weekday::Tue));
        assert_eq!(weekday_from_index(6), Some(Weekday::Sat));
        assert_eq!(weekday_from_index(7), None);
    }

    #[test]
    fn test_relative_terms() {
        let info = resolver().resolve("Please pay. Due in 14 days.");
        assert_eq!(info.due_days, Some(14));
        assert_eq!(info.due_date, Some(date(2025, 4, 24)));

        assert_eq!(resolver().resolve("due within 2 weeks").due_days, Some(14));
        assert_eq!(resolver().resolve("payable in 1 month").due_days, Some(30));
        assert_eq!(resolver().resolve("Terms: Net 30").due_days, Some(30));
        assert_eq!(resolver().resolve("payment terms of 45 days").due_days, Some(45));
    }

    #[test]
    fn test_relative_beats_absolute() {
        let info = resolver().resolve("Due in 7 days, or due by 05/30/2025 at the latest");
        assert_eq!(info.due_days, Some(7));
        assert_eq!(info.due_date, Some(date(2025, 4, 17)));
    }

    #[test]
    fn test_trigger_phrases() {
        let info = resolver().resolve("Logo for $300, due by 05/15/2025.");
        assert_eq!(info.due_days, None);
        assert_eq!(info.due_date, Some(date(2025, 5, 15)));

        let info = resolver().resolve("Payment due on the 3rd of June");
        assert_eq!(info.due_date, Some(date(2025, 6, 3)));

        let info = resolver().resolve("to be paid by May 2, 2026");
        assert_eq!(info.due_date, Some(date(2026, 5, 2)));
    }

    #[test]
    fn test_leftmost_trigger_wins() {
        let info = resolver().resolve("Deadline: 2025-06-01. Payment due by 2025-07-01.");
        assert_eq!(info.due_date, Some(date(2025, 6, 1)));
    }

    #[test]
    fn test_unparseable_after_trigger() {
        let info = resolver().resolve("Payment due upon receipt. Work done 2025-05-01.");
        assert!(info.is_empty());

        let err = resolver().leading_date("upon receipt. Work done 2025-05-01.").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidDate(ref s) if s == "upon receipt. Work done"));
        assert_eq!(resolver().leading_date("05/15/2025.").ok(), Some(date(2025, 5, 15)));
    }

    #[test]
    fn test_scan_prefers_earliest_future_date() {
        let info = resolver().resolve("Work on 2025-03-01 and 2025-05-20, review 2025-05-02");
        assert_eq!(info.due_date, Some(date(2025, 5, 2)));

        let info = resolver().resolve("Work on 2025-03-01 and 2025-02-20");
        assert_eq!(info.due_date, Some(date(2025, 2, 20)));

        assert!(resolver().resolve("no dates here").is_empty());
    }

    #[test]
    fn test_parse_date_orders() {
        let today = date(2025, 4, 10);
        assert_eq!(parse_date_str("04/05/2025", today), Some(date(2025, 4, 5)));
        assert_eq!(parse_date_str("15/04/2025", today), Some(date(2025, 4, 15)));
        assert_eq!(parse_date_str("2025/04/15", today), Some(date(2025, 4, 15)));
        assert_eq!(parse_date_str("2025-04-15", today), Some(date(2025, 4, 15)));
        assert_eq!(parse_date_str("April 15th, 2025", today), Some(date(2025, 4, 15)));
        assert_eq!(parse_date_str("15 Apr 2025", today), Some(date(2025, 4, 15)));
        assert_eq!(parse_date_str("31/31/2025", today), None);
        assert_eq!(parse_date_str("soon", today), None);
    }

    #[test]
    fn test_two_digit_years() {
        let today = date(2025, 4, 10);
        assert_eq!(parse_date_str("04/15/25", today), Some(date(2025, 4, 15)));
        assert_eq!(parse_date_str("04/15/49", today), Some(date(2049, 4, 15)));
        assert_eq!(parse_date_str("04/15/50", today), Some(date(1950, 4, 15)));
    }

    #[test]
    fn test_missing_year_rolls_forward() {
        let today = date(2025, 4, 10);
        assert_eq!(parse_date_str("May 1", today), Some(date(2025, 5, 1)));
        assert_eq!(parse_date_str("March 1", today), Some(date(2026, 3, 1)));
    }
}
