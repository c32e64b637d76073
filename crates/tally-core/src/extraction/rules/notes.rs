//! Free-text invoice notes.

use lazy_static::lazy_static;
use regex::Captures;
use tracing::debug;

use super::patterns::{NOTES_LABEL, PAYMENT_INSTRUCTIONS, PAY_VIA, PLEASE_ADD_NOTE, QUOTED_NOTE};
use super::{capitalize, clean_value, first_match, ExtractionMatch, Rule};

/// Note used when the text asks for none and no payment terms are known.
pub const DEFAULT_NOTES: &str = "Thank you for your business.";

fn note(caps: &Captures<'_>) -> Option<String> {
    clean_value(&caps[1]).map(|value| capitalize(&value))
}

lazy_static! {
    /// Note patterns in priority order.
    static ref NOTE_RULES: Vec<Rule<String>> = vec![
        Rule::new("notes_label", &NOTES_LABEL, note),
        Rule::new("please_add_note", &PLEASE_ADD_NOTE, note),
        Rule::new("quoted_note", &QUOTED_NOTE, note),
        Rule::new("payment_instructions", &PAYMENT_INSTRUCTIONS, note),
        Rule::new("pay_via", &PAY_VIA, note),
    ];
}

/// The note the text asks for, if any.
pub fn find_notes(text: &str) -> Option<ExtractionMatch<String>> {
    first_match(&NOTE_RULES, text)
}

/// Notes for an invoice: the requested note, else one synthesised from the
/// payment terms, else [`DEFAULT_NOTES`].
pub fn extract_notes(text: &str, due_days: Option<u32>) -> String {
    if let Some(found) = find_notes(text) {
        return found.value;
    }

    debug!("No notes found, synthesising");
    match due_days {
        Some(days) => format!("Payment due within {} days. {}", days, DEFAULT_NOTES),
        None => DEFAULT_NOTES.to_string(),
    }
}
