//! Extract command - print the fields found in one description.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use tally_core::{validate_input, ExtractOptions, Extractor, ProviderId};

use super::{format_result, load_config, parse_provider, read_input, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Description text (reads stdin when neither TEXT nor --file is given)
    text: Option<String>,

    /// Read the description from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Extraction provider (local-rules, remote, provider-a, provider-b, provider-c)
    #[arg(short, long, value_parser = parse_provider)]
    provider: Option<ProviderId>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let input = read_input(args.text, args.file.as_deref())?;
    let text = validate_input(&input)?;

    let mut options = ExtractOptions::default();
    if let Some(provider) = args.provider {
        options = options.with_provider(provider);
    }

    let extractor = Extractor::from_config(config);
    let result = extractor.extract(text, &options).await;
    info!("Extracted {} items with {}", result.items.len(), result.provider);

    println!("{}", format_result(&result, args.format)?);

    Ok(())
}
