//! The currency dictionary: display names, qualifiers and flags per code.
//!
//! The data lives in `docs/currencies.yaml` and is embedded at build time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const EMBEDDED_DICTIONARY: &str = include_str!("../../docs/currencies.yaml");

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CurrencyInfo {
    pub singular: Vec<String>,
    #[serde(default)]
    pub plural: Vec<String>,
    /// Disambiguates names shared across countries, e.g. "Dollar".
    #[serde(default)]
    pub qualifiers: Vec<String>,
    pub flag: Option<String>,
}

impl CurrencyInfo {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.singular
            .iter()
            .chain(self.plural.iter())
            .map(String::as_str)
    }
}

/// What a piece of user text refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Code(String),
    Ambiguous(Vec<String>),
    Unknown,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrencyDictionary {
    pub version: u32,
    currencies: BTreeMap<String, CurrencyInfo>,
}

impl CurrencyDictionary {
    /// Loads the dictionary shipped with the binary.
    pub fn load() -> Result<Self> {
        Self::from_yaml(EMBEDDED_DICTIONARY).context("Failed to parse embedded currency dictionary")
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let dictionary: Self =
            serde_yaml::from_str(yaml).context("Failed to parse currency dictionary")?;
        Ok(dictionary)
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyInfo> {
        self.currencies.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.currencies.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurrencyInfo)> {
        self.currencies.iter().map(|(code, info)| (code.as_str(), info))
    }

    /// Sorted currency codes.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.currencies.keys().map(String::as_str)
    }

    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.get(code)
            .and_then(|info| info.singular.first())
            .map(String::as_str)
    }

    pub fn flag(&self, code: &str) -> Option<&str> {
        self.get(code).and_then(|info| info.flag.as_deref())
    }

    /// Resolves a code or any singular/plural name, case-insensitively.
    pub fn resolve(&self, text: &str) -> Resolution {
        let text = text.trim();
        let upper = text.to_uppercase();
        if self.contains(&upper) {
            return Resolution::Code(upper);
        }

        let lower = text.to_lowercase();
        let matches: BTreeSet<&str> = self
            .iter()
            .filter(|(_, info)| info.names().any(|name| name.to_lowercase() == lower))
            .map(|(code, _)| code)
            .collect();

        let mut codes: Vec<String> = matches.into_iter().map(String::from).collect();
        match codes.len() {
            0 => Resolution::Unknown,
            1 => Resolution::Code(codes.remove(0)),
            _ => Resolution::Ambiguous(codes),
        }
    }

    /// A code with its qualifier, e.g. `CAD (Canada)`, for listing candidates.
    pub fn describe(&self, code: &str) -> String {
        match self.get(code).and_then(|info| info.qualifiers.first()) {
            Some(qualifier) => format!("{code} ({qualifier})"),
            None => code.to_string(),
        }
    }
}
