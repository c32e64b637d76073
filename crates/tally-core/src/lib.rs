//! Core library for turning plain-language work descriptions into invoices.
//!
//! This crate provides:
//! - Rule-based field extraction (due dates, parties, line items, tax, notes)
//! - Recurring delivery expansion over a date range
//! - Synthetic provider rule engines and a remote model backend with local fallback
//! - Invoice assembly with exact decimal arithmetic

pub mod assembler;
pub mod error;
pub mod extraction;
pub mod models;

pub use assembler::{assemble_invoice, InvoiceAssembler};
pub use error::{ExtractionError, InvoiceError, Result, TallyError};
pub use extraction::{
    validate_input, ExtractOptions, ExtractionBackend, Extractor, LocalRules, RemoteBackend,
    SyntheticProvider,
};
pub use models::config::{ExtractionConfig, RemoteConfig, TallyConfig};
pub use models::extraction::{
    BusinessDetails, ClientDetails, ExtractedParty, ExtractionResult, InvoiceOverrides, ProviderId,
};
pub use models::invoice::{format_amount, Invoice, InvoiceStatus, LineItem, PartyDetails};

/// Re-export the completion layer used by the remote backend.
pub use tally_completion::{CompletionBackend, CompletionError, CompletionRequest, CompletionResponse};
