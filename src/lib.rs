pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::convert::OutputFormat;
use crate::core::config::AppConfig;
use crate::core::{Converter, CurrencyDictionary, RateSource};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: f64,
        from: String,
        to: Vec<String>,
        format: OutputFormat,
    },
    Watch {
        amount: f64,
        from: String,
        to: Vec<String>,
        format: OutputFormat,
    },
    Rates {
        codes: Vec<String>,
    },
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let dictionary = CurrencyDictionary::load()?;
    if let AppCommand::Currencies = command {
        cli::rates::list_currencies(&dictionary);
        return Ok(());
    }

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let source = build_rate_source(&config)?;
    let converter = Converter::new(&config.default_currency);

    match command {
        AppCommand::Convert {
            amount,
            from,
            to,
            format,
        } => {
            let request = cli::convert::build_request(&dictionary, amount, &from, &to)?;
            cli::convert::run(&source, &converter, &request, format).await
        }
        AppCommand::Watch {
            amount,
            from,
            to,
            format,
        } => {
            let request = cli::convert::build_request(&dictionary, amount, &from, &to)?;
            cli::convert::watch(&source, &converter, &request, format).await
        }
        AppCommand::Rates { codes } => cli::rates::run(&source, &dictionary, &codes).await,
        AppCommand::Currencies => Ok(()),
    }
}

/// Builds the shared rate source from the configured provider.
pub fn build_rate_source(config: &AppConfig) -> Result<RateSource> {
    let rates = config.rates_provider();
    debug!(base_url = %rates.base_url, base = %rates.base_currency, "Using rates provider");
    let provider = providers::FixerProvider::new(&rates.base_url, &rates.base_currency)?;
    Ok(RateSource::new(Arc::new(provider), config.refresh_interval()))
}
