// Define a new module for logging initialization
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. Warnings from `xcc` are always shown so a
/// failed rate fetch is visible; `--verbose` turns on debug output and
/// `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    let (level_filter, level) = if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::WARN, "warn")
    };
    let app_filter = Targets::new().with_target("xcc", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_filter)
        .with(env_filter)
        .init();
}
