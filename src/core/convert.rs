//! Converts amounts between currencies using a rate snapshot and renders the
//! results for plain-text and HTML output.
use crate::core::rates::RateSnapshot;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

/// An already-parsed request: convert `amount` of `from` into each of `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    /// Target codes in the order requested. Empty means "use the default
    /// currency".
    pub to: Vec<String>,
}

impl ConversionRequest {
    pub fn new(amount: f64, from: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            amount,
            from: from.into(),
            to,
        }
    }
}

/// The outcome of converting into a single target currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub from: String,
    pub to: String,
    pub from_amount: f64,
    pub to_amount: f64,
}

impl ConversionResult {
    /// `false` when a rate was missing and the amount is not a usable number.
    pub fn is_valid(&self) -> bool {
        self.to_amount.is_finite() && self.to_amount >= 0.0
    }

    /// The target amount rounded for display, `None` when invalid.
    pub fn rounded_amount(&self) -> Option<Decimal> {
        if self.is_valid() {
            round_amount(self.to_amount)
        } else {
            None
        }
    }

    fn display_amount(&self) -> Option<String> {
        if self.is_valid() {
            format_amount(self.to_amount)
        } else {
            None
        }
    }

    fn as_line(&self) -> Option<String> {
        self.display_amount()
            .map(|amount| format!("{} {} = {} {}", self.from_amount, self.from, amount, self.to))
    }

    fn as_compact(&self) -> Option<String> {
        self.display_amount()
            .map(|amount| format!("{}{}", amount, self.to))
    }
}

/// Converts `request` against `snapshot`, one result per target, in request
/// order.
///
/// The amount is normalised through the snapshot's base currency. A code
/// missing from the snapshot yields a NaN amount; callers decide what to do
/// with it (see [`ConversionResult::is_valid`]).
pub fn convert(
    request: &ConversionRequest,
    snapshot: &RateSnapshot,
    default_currency: &str,
) -> Vec<ConversionResult> {
    let from_rate = snapshot.rate(&request.from).unwrap_or(f64::NAN);
    let in_base = request.amount / from_rate;

    let default_target = [default_currency.to_string()];
    let targets: &[String] = if request.to.is_empty() {
        &default_target
    } else {
        &request.to
    };

    targets
        .iter()
        .map(|to| {
            let to_rate = snapshot.rate(to).unwrap_or(f64::NAN);
            ConversionResult {
                from: request.from.clone(),
                to: to.clone(),
                from_amount: request.amount,
                to_amount: in_base * to_rate,
            }
        })
        .collect()
}

/// Rounds to 2 decimal places, midpoints away from zero, and drops trailing
/// zeros (`9.00` becomes `9`, `12.30` becomes `12.3`).
///
/// Rounding works on the shortest decimal form of the float, so `9.055`
/// rounds to `9.06` even though its binary value sits just below.
pub fn round_amount(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    let exact = value
        .to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64_retain(value))?;
    Some(
        exact
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize(),
    )
}

/// Display text for a converted amount, rounded like [`round_amount`].
///
/// Amounts too large for `Decimal` are printed as plain floats; at that
/// magnitude an `f64` has no fractional part left to round.
pub fn format_amount(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    Some(match round_amount(value) {
        Some(rounded) => rounded.to_string(),
        None => value.to_string(),
    })
}

fn valid_results(results: &[ConversionResult]) -> Vec<&ConversionResult> {
    results
        .iter()
        .filter(|result| {
            if result.is_valid() {
                true
            } else {
                warn!(
                    from = %result.from,
                    to = %result.to,
                    "No usable rate, skipping target"
                );
                false
            }
        })
        .collect()
}

/// Clipboard text. A single target renders compactly as `12.34USD`; several
/// targets render one `10 EUR = 10.8 USD` line each, newline separated.
///
/// Targets without a usable rate are skipped. Returns `None` when nothing is
/// left to show.
pub fn render_plain(results: &[ConversionResult]) -> Option<String> {
    let valid = valid_results(results);
    if valid.is_empty() {
        return None;
    }

    if results.len() == 1 {
        return valid[0].as_compact();
    }

    let lines: Vec<String> = valid.iter().filter_map(|r| r.as_line()).collect();
    Some(lines.join("\n"))
}

/// Preview fragment: one line per target joined with `<br />`.
pub fn render_html(results: &[ConversionResult]) -> Option<String> {
    let lines: Vec<String> = valid_results(results)
        .iter()
        .filter_map(|r| r.as_line())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("<br />"))
    }
}

/// Host-facing adapter that applies the configured default currency and
/// withholds output until rates are available.
#[derive(Debug, Clone)]
pub struct Converter {
    default_currency: String,
}

impl Converter {
    pub fn new(default_currency: &str) -> Self {
        Self {
            default_currency: default_currency.trim().to_uppercase(),
        }
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    pub fn convert(
        &self,
        request: &ConversionRequest,
        snapshot: &RateSnapshot,
    ) -> Vec<ConversionResult> {
        convert(request, snapshot, &self.default_currency)
    }

    pub fn plain(&self, request: &ConversionRequest, snapshot: &RateSnapshot) -> Option<String> {
        if snapshot.is_empty() {
            debug!("No exchange rates yet, withholding conversion");
            return None;
        }
        render_plain(&self.convert(request, snapshot))
    }

    pub fn html(&self, request: &ConversionRequest, snapshot: &RateSnapshot) -> Option<String> {
        if snapshot.is_empty() {
            debug!("No exchange rates yet, withholding preview");
            return None;
        }
        render_html(&self.convert(request, snapshot))
    }
}
