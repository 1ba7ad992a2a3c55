//! Exchange rate snapshots and the abstraction over where they come from.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// An immutable point-in-time mapping of currency code to rate, expressed
/// relative to a base currency.
///
/// The base currency always maps to exactly `1.0`. A snapshot is never
/// mutated once built; a new fetch produces a new snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSnapshot {
    base: Option<String>,
    rates: HashMap<String, f64>,
    date: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
}

impl RateSnapshot {
    /// Builds a snapshot from a provider's rate table.
    ///
    /// Codes are upper-cased, entries that are not positive finite numbers are
    /// dropped, and `base` is set to exactly `1.0` whatever the table said.
    pub fn new(base: &str, rates: HashMap<String, f64>) -> Self {
        let base = base.trim().to_uppercase();
        let mut rates: HashMap<String, f64> = rates
            .into_iter()
            .filter_map(|(code, rate)| {
                if rate.is_finite() && rate > 0.0 {
                    Some((code.trim().to_uppercase(), rate))
                } else {
                    debug!(code = %code, rate, "Dropping invalid rate");
                    None
                }
            })
            .collect();
        rates.insert(base.clone(), 1.0);

        Self {
            base: Some(base),
            rates,
            date: None,
            fetched_at: Some(Utc::now()),
        }
    }

    /// The placeholder snapshot published before any fetch has succeeded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attaches the provider's publication date (e.g. `2024-05-17`).
    pub fn with_date(mut self, date: Option<String>) -> Self {
        self.date = date;
        self
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Currency codes in the snapshot, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.rates.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

/// A source of complete rate tables, typically a remote exchange-rate API.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateSnapshot>;
}
