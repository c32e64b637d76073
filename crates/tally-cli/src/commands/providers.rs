//! Providers command - list extraction backends.

use console::style;

use tally_core::ProviderId;

use super::load_config;

pub fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let default = load_config(config_path)?.extraction.default_provider;

    println!("{}", style("Extraction providers:").bold());
    println!();

    for provider in ProviderId::ALL {
        let marker = if provider == default {
            style(" (default)").dim().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<12} {}{}",
            style(provider.as_str()).cyan(),
            provider.describe(),
            marker
        );
    }

    Ok(())
}
