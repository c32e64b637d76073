//! Invoice command - extract and assemble a complete invoice.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use tally_core::{
    validate_input, BusinessDetails, ClientDetails, ExtractOptions, Extractor, InvoiceAssembler,
    ProviderId,
};

use super::{format_invoice, load_config, parse_provider, read_input, OutputFormat};

/// Arguments for the invoice command.
#[derive(Args)]
pub struct InvoiceArgs {
    /// Description text (reads stdin when neither TEXT nor --file is given)
    text: Option<String>,

    /// Read the description from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Extraction provider (local-rules, remote, provider-a, provider-b, provider-c)
    #[arg(short, long, value_parser = parse_provider)]
    provider: Option<ProviderId>,

    /// Client name, replacing the extracted one
    #[arg(long)]
    client_name: Option<String>,

    /// Client email, replacing the extracted one
    #[arg(long)]
    client_email: Option<String>,

    /// Client address, replacing the extracted one
    #[arg(long)]
    client_address: Option<String>,

    /// JSON file with your business details (name, tax_id, bank fields...)
    #[arg(long)]
    business: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show extraction confidence
    #[arg(long)]
    show_confidence: bool,

    /// Validate the assembled invoice
    #[arg(long)]
    validate: bool,
}

impl InvoiceArgs {
    fn client(&self) -> Option<ClientDetails> {
        if self.client_name.is_none() && self.client_email.is_none() && self.client_address.is_none() {
            return None;
        }
        Some(ClientDetails {
            name: self.client_name.clone(),
            email: self.client_email.clone(),
            address: self.client_address.clone(),
        })
    }
}

pub async fn run(args: InvoiceArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let input = read_input(args.text.clone(), args.file.as_deref())?;
    let text = validate_input(&input)?;

    let mut options = ExtractOptions::default();
    if let Some(provider) = args.provider {
        options = options.with_provider(provider);
    }
    if let Some(client) = args.client() {
        options = options.with_client(client);
    }
    if let Some(path) = &args.business {
        let business = BusinessDetails::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load business details {}: {}", path.display(), e))?;
        options = options.with_business(business);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Extracting invoice details...");

    let default_due_days = config.extraction.default_due_days;
    let extractor = Extractor::from_config(config);
    let result = extractor.extract(text, &options).await;

    pb.set_message("Assembling invoice...");
    let invoice = InvoiceAssembler::new(Local::now().date_naive())
        .with_default_due_days(default_due_days)
        .assemble(&result, &options.overrides());
    pb.finish_and_clear();

    if args.validate {
        let issues = invoice.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let output = format_invoice(&invoice, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Invoice written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        eprintln!(
            "{} Extraction confidence: {:.0}% ({})",
            style("ℹ").blue(),
            result.confidence * 100.0,
            result.provider
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
