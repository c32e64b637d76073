//! Completeness score for an extraction.
//!
//! This is a heuristic proxy for how much of an invoice the text described,
//! not a statistical confidence.

use rust_decimal::Decimal;

use super::notes::DEFAULT_NOTES;
use crate::models::extraction::{ExtractedParty, DEFAULT_TAX_RATE};
use crate::models::invoice::LineItem;

const BASE: f32 = 0.5;
const CLIENT_NAME_WEIGHT: f32 = 0.10;
const ITEMS_WEIGHT: f32 = 0.20;
const TAX_RATE_WEIGHT: f32 = 0.05;
const DUE_INFO_WEIGHT: f32 = 0.10;
const NOTES_WEIGHT: f32 = 0.05;

/// Which parts of an invoice the text supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfidenceFlags {
    pub has_client_name: bool,
    pub has_items: bool,
    pub has_tax_rate: bool,
    pub has_due_info: bool,
    pub has_notes: bool,
}

impl ConfidenceFlags {
    /// Derive flags from extracted fields. Sentinel values count as absent.
    pub fn from_fields(
        client: &ExtractedParty,
        items: &[LineItem],
        tax_rate: Decimal,
        has_due_info: bool,
        notes: Option<&str>,
    ) -> Self {
        Self {
            has_client_name: client.has_name(),
            has_items: !items.is_empty(),
            has_tax_rate: tax_rate != DEFAULT_TAX_RATE,
            has_due_info,
            has_notes: notes.is_some_and(|n| !n.trim().is_empty() && n != DEFAULT_NOTES),
        }
    }
}

/// Score in `[0.5, 1.0]`.
pub fn score_confidence(flags: ConfidenceFlags) -> f32 {
    let weighted = [
        (flags.has_client_name, CLIENT_NAME_WEIGHT),
        (flags.has_items, ITEMS_WEIGHT),
        (flags.has_tax_rate, TAX_RATE_WEIGHT),
        (flags.has_due_info, DUE_INFO_WEIGHT),
        (flags.has_notes, NOTES_WEIGHT),
    ];

    let score = weighted
        .iter()
        .filter(|(present, _)| *present)
        .fold(BASE, |acc, (_, weight)| acc + weight);

    score.min(1.0)
}
