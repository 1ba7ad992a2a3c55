//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod dictionary;
pub mod log;
pub mod rates;
pub mod source;

// Re-export main types for cleaner imports
pub use convert::{ConversionRequest, ConversionResult, Converter};
pub use dictionary::{CurrencyDictionary, Resolution};
pub use rates::{RateFetcher, RateSnapshot};
pub use source::{RateSource, RateSubscription};
