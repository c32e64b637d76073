//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod invoice;
pub mod providers;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use tally_core::models::invoice::format_amount;
use tally_core::{ExtractionResult, Invoice, ProviderId, TallyConfig};

/// Output format for results and invoices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
    /// CSV, one row per line item
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
            OutputFormat::Csv => "csv",
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("config.json")
}

/// `--config` path if given, else the per-user file.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration. An explicit path must exist; the per-user file is optional.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<TallyConfig> {
    if let Some(path) = explicit {
        return TallyConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        return Ok(TallyConfig::from_file(&path)?);
    }
    Ok(TallyConfig::default())
}

/// Description text from the argument, a file, or stdin.
pub fn read_input(text: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    match (text, file) {
        (Some(_), Some(_)) => anyhow::bail!("Pass either TEXT or --file, not both"),
        (Some(text), None) => Ok(text),
        (None, Some(path)) => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            Ok(fs::read_to_string(path)?)
        }
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

pub fn parse_provider(value: &str) -> Result<ProviderId, String> {
    value.parse()
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(format_result_text(result)),
        OutputFormat::Csv => items_csv(
            result
                .items
                .iter()
                .map(|i| (i.description.as_str(), i.quantity(), i.unit_price(), i.amount())),
        ),
    }
}

pub fn format_invoice(invoice: &Invoice, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(invoice)?),
        OutputFormat::Text => Ok(format_invoice_text(invoice)),
        OutputFormat::Csv => items_csv(
            invoice
                .line_items()
                .iter()
                .map(|i| (i.description.as_str(), i.quantity(), i.unit_price(), i.amount())),
        ),
    }
}

fn items_csv<'a>(
    rows: impl Iterator<Item = (&'a str, u32, rust_decimal::Decimal, rust_decimal::Decimal)>,
) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["description", "quantity", "unit_price", "amount"])?;

    for (description, quantity, unit_price, amount) in rows {
        wtr.write_record([
            description,
            &quantity.to_string(),
            &unit_price.to_string(),
            &amount.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_result_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Provider: {}\n", result.provider));
    output.push_str(&format!("Confidence: {:.0}%\n", result.confidence * 100.0));
    output.push('\n');

    output.push_str("Client:\n");
    output.push_str(&format!("  {}\n", result.client_info.name));
    output.push_str(&format!("  {}\n", result.client_info.email));
    output.push_str(&format!("  {}\n", result.client_info.address));

    if let Some(company) = &result.company_info {
        output.push_str("Company:\n");
        output.push_str(&format!("  {}\n", company.name));
        output.push_str(&format!("  {}\n", company.email));
        output.push_str(&format!("  {}\n", company.address));
    }
    output.push('\n');

    output.push_str("Items:\n");
    for item in &result.items {
        output.push_str(&format!(
            "  {} x {} @ {} = {}\n",
            item.quantity(),
            item.description,
            format_amount(item.unit_price()),
            format_amount(item.amount())
        ));
    }
    output.push('\n');

    output.push_str(&format!("Tax rate: {}%\n", result.tax_rate));
    if let Some(days) = result.due_days {
        output.push_str(&format!("Due in: {} days\n", days));
    }
    if let Some(date) = result.due_date {
        output.push_str(&format!("Due date: {}\n", date));
    }
    if let Some(notes) = &result.notes {
        output.push_str(&format!("Notes: {}\n", notes));
    }

    output
}

fn format_invoice_text(invoice: &Invoice) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", invoice.invoice_number));
    output.push_str(&format!("Date: {}\n", invoice.date));
    output.push_str(&format!("Due: {}\n", invoice.due_date));
    output.push('\n');

    output.push_str("From:\n");
    output.push_str(&format!("  {}\n", invoice.company.name));
    if let Some(tax_id) = &invoice.company.tax_id {
        output.push_str(&format!("  Tax ID: {}\n", tax_id));
    }
    output.push_str(&format!("  {}\n", invoice.company.address));
    output.push('\n');

    output.push_str("Bill to:\n");
    output.push_str(&format!("  {}\n", invoice.client.name));
    output.push_str(&format!("  {}\n", invoice.client.email));
    output.push_str(&format!("  {}\n", invoice.client.address));
    output.push('\n');

    output.push_str("Items:\n");
    for item in invoice.line_items() {
        output.push_str(&format!(
            "  {} x {} @ {} = {}\n",
            item.quantity(),
            item.description,
            format_amount(item.unit_price()),
            format_amount(item.amount())
        ));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Subtotal: {}\n", format_amount(invoice.subtotal())));
    output.push_str(&format!(
        "  Tax ({}%): {}\n",
        invoice.tax_rate(),
        format_amount(invoice.tax_amount())
    ));
    output.push_str(&format!("  Total:    {}\n", format_amount(invoice.total())));

    if !invoice.notes.is_empty() {
        output.push_str(&format!("\n{}\n", invoice.notes));
    }

    if let Some(bank) = &invoice.company.bank {
        output.push_str("\nPayment details:\n");
        for (label, value) in [
            ("Bank", &bank.bank_name),
            ("Account name", &bank.account_name),
            ("Account number", &bank.account_number),
            ("Routing", &bank.routing_code),
        ] {
            if let Some(value) = value {
                output.push_str(&format!("  {}: {}\n", label, value));
            }
        }
    }

    output
}
