use super::ui;
use crate::core::{
    ConversionRequest, Converter, CurrencyDictionary, RateSnapshot, RateSource, Resolution,
};
use anyhow::{Result, bail};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Clipboard-ready text
    #[default]
    Plain,
    /// Preview fragment
    Html,
}

/// Maps user text to a currency code. Unknown codes are passed through so the
/// rate snapshot has the final say.
pub fn resolve_code(dictionary: &CurrencyDictionary, text: &str) -> Result<String> {
    match dictionary.resolve(text) {
        Resolution::Code(code) => Ok(code),
        Resolution::Ambiguous(codes) => {
            let candidates: Vec<String> = codes.iter().map(|c| dictionary.describe(c)).collect();
            bail!(
                "Currency '{}' is ambiguous, use one of: {}",
                text.trim(),
                candidates.join(", ")
            )
        }
        Resolution::Unknown => {
            let code = text.trim().to_uppercase();
            warn!(code = %code, "Unknown currency, using it as a code");
            Ok(code)
        }
    }
}

pub fn build_request(
    dictionary: &CurrencyDictionary,
    amount: f64,
    from: &str,
    to: &[String],
) -> Result<ConversionRequest> {
    if !amount.is_finite() || amount < 0.0 {
        bail!("Amount must be a non-negative number, got {amount}");
    }
    let from = resolve_code(dictionary, from)?;
    let to = to
        .iter()
        .map(|target| resolve_code(dictionary, target))
        .collect::<Result<Vec<_>>>()?;
    Ok(ConversionRequest::new(amount, from, to))
}

pub fn render(
    converter: &Converter,
    request: &ConversionRequest,
    snapshot: &RateSnapshot,
    format: OutputFormat,
) -> Option<String> {
    match format {
        OutputFormat::Plain => converter.plain(request, snapshot),
        OutputFormat::Html => converter.html(request, snapshot),
    }
}

/// One-shot conversion. Prints nothing when no rates could be fetched.
pub async fn run(
    source: &RateSource,
    converter: &Converter,
    request: &ConversionRequest,
    format: OutputFormat,
) -> Result<()> {
    if !source.refresh().await {
        debug!("Rate refresh failed, using the latest known rates");
    }

    match render(converter, request, &source.latest(), format) {
        Some(output) => println!("{output}"),
        None => info!("No exchange rates available, nothing to show"),
    }
    Ok(())
}

fn refresh_label(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("every {}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("every {}m", secs / 60)
    } else {
        format!("every {secs}s")
    }
}

/// Re-renders the conversion every time new rates arrive, until Ctrl-C.
pub async fn watch(
    source: &RateSource,
    converter: &Converter,
    request: &ConversionRequest,
    format: OutputFormat,
) -> Result<()> {
    let refresh = refresh_label(source.interval());
    let mut updates = std::pin::pin!(source.subscribe().into_stream());
    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            next = updates.next() => {
                let Some(snapshot) = next else {
                    debug!("Rate source closed");
                    break;
                };
                if let Some(output) = render(converter, request, &snapshot, format) {
                    let as_of = snapshot
                        .fetched_at()
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_default();
                    ui::print_separator();
                    let header = format!("Rates as of {as_of}, refreshing {refresh}");
                    println!("{}", ui::style_text(&header, ui::StyleType::Subtle));
                    println!("{output}");
                }
            }
            result = &mut shutdown => {
                result?;
                info!("Stopping rate watch");
                break;
            }
        }
    }
    Ok(())
}
