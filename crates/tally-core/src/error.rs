//! Error types for the tally-core library.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the tally library.
#[derive(Error, Debug)]
pub enum TallyError {
    /// Extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Invoice edit error.
    #[error("invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// Error from the completion layer.
    #[error("completion error: {0}")]
    Completion(#[from] tally_completion::CompletionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised inside the extraction pipeline.
///
/// Only `EmptyInput` is meant for callers. The others are recovered inside
/// the pipeline: remote failures by falling back to local rules, invalid
/// dates by the default due date.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The input text is empty or whitespace.
    #[error("input text is empty")]
    EmptyInput,

    /// The remote backend answered, but not with the expected shape.
    #[error("malformed remote response: {0}")]
    MalformedResponse(String),

    /// A due date after a trigger phrase, or from the remote backend, could
    /// not be understood.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// No line items could be extracted.
    #[error("no line items extracted")]
    NoItems,

    /// The remote call itself failed.
    #[error("remote call failed: {0}")]
    Completion(#[from] tally_completion::CompletionError),

    /// The remote call did not finish in time.
    #[error("remote call timed out after {0}s")]
    Timeout(u64),
}

/// Errors related to editing an assembled invoice.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvoiceError {
    /// Line item index does not exist.
    #[error("line item {index} out of range (invoice has {len})")]
    LineItemOutOfRange { index: usize, len: usize },

    /// Quantity must be at least one.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// Unit price must not be negative.
    #[error("unit price must not be negative, got {0}")]
    NegativePrice(Decimal),

    /// Tax rate must not be negative.
    #[error("tax rate must not be negative, got {0}")]
    NegativeTaxRate(Decimal),
}

/// Result type for the tally library.
pub type Result<T> = std::result::Result<T, TallyError>;
