//! Data models: extraction output, invoices and configuration.

pub mod config;
pub mod extraction;
pub mod invoice;
