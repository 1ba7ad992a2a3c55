use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use xcc::cli::convert::{OutputFormat, build_request, render};
use xcc::core::{Converter, CurrencyDictionary, RateFetcher, RateSource};
use xcc::providers::FixerProvider;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rates_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(base_url: &str, base_currency: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
        default_currency: "EUR"
        providers:
          rates:
            base_url: {base_url}
            base_currency: {base_currency}
    "#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config file");
        config_file
    }
}

const USD_RATES: &str = r#"{"base": "USD", "date": "2024-05-17", "rates": {"EUR": 0.92, "GBP": 0.79}}"#;

#[test_log::test(tokio::test)]
async fn test_end_to_end_multi_target_conversion() {
    let mock_server = test_utils::create_rates_server(200, USD_RATES).await;
    let provider = FixerProvider::new(&mock_server.uri(), "USD").unwrap();
    let source = RateSource::new(Arc::new(provider), Duration::from_secs(3600));

    let mut subscription = source.subscribe();
    let snapshot = subscription.changed().await.expect("Rate source closed");
    info!(currencies = snapshot.len(), "Received rates");

    let dictionary = CurrencyDictionary::load().unwrap();
    let request = build_request(
        &dictionary,
        100.0,
        "USD",
        &["EUR".to_string(), "GBP".to_string()],
    )
    .unwrap();
    let converter = Converter::new("EUR");

    let plain = render(&converter, &request, &snapshot, OutputFormat::Plain).unwrap();
    let lines: Vec<&str> = plain.lines().collect();
    assert_eq!(lines, vec!["100 USD = 92 EUR", "100 USD = 79 GBP"]);
}

#[test_log::test(tokio::test)]
async fn test_default_currency_fallback() {
    let mock_server = test_utils::create_rates_server(200, USD_RATES).await;
    let provider = FixerProvider::new(&mock_server.uri(), "USD").unwrap();
    let snapshot = provider.fetch_rates().await.unwrap();

    let converter = Converter::new("GBP");
    let request = xcc::core::ConversionRequest::new(10.0, "USD", vec![]);
    let results = converter.convert(&request, &snapshot);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].to, "GBP");
    assert_eq!(converter.plain(&request, &snapshot).unwrap(), "7.9GBP");
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_rates_server(200, USD_RATES).await;
    let config_file = test_utils::write_config(&mock_server.uri(), "USD");

    let result = xcc::run_command(
        xcc::AppCommand::Convert {
            amount: 100.0,
            from: "usd".to_string(),
            to: vec!["euros".to_string(), "GBP".to_string()],
            format: OutputFormat::Plain,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );

    let result = xcc::run_command(
        xcc::AppCommand::Rates { codes: vec![] },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Rates command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_provider_failure_produces_no_error() {
    let mock_server = test_utils::create_rates_server(503, "unavailable").await;
    let config_file = test_utils::write_config(&mock_server.uri(), "EUR");

    let result = xcc::run_command(
        xcc::AppCommand::Convert {
            amount: 10.0,
            from: "USD".to_string(),
            to: vec![],
            format: OutputFormat::Html,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_stale_rates_survive_failed_refresh() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/latest"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(USD_RATES))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/latest"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let provider = FixerProvider::new(&mock_server.uri(), "USD").unwrap();
    let source = RateSource::new(Arc::new(provider), Duration::from_secs(3600));

    assert!(source.refresh().await);
    assert!(!source.refresh().await);

    let snapshot = source.latest();
    assert_eq!(snapshot.rate("EUR"), Some(0.92));
    assert_eq!(snapshot.rate("USD"), Some(1.0));
}

#[test_log::test(tokio::test)]
async fn test_currencies_without_config() {
    let result =
        xcc::run_command(xcc::AppCommand::Currencies, Some("/nonexistent/config.yaml")).await;
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_ambiguous_currency_fails() {
    let mock_server = test_utils::create_rates_server(200, USD_RATES).await;
    let config_file = test_utils::write_config(&mock_server.uri(), "USD");

    let result = xcc::run_command(
        xcc::AppCommand::Convert {
            amount: 1.0,
            from: "dollar".to_string(),
            to: vec!["EUR".to_string()],
            format: OutputFormat::Plain,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.unwrap_err().to_string().contains("ambiguous"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("missing.yaml");
    assert!(!path.exists());
    assert!(fs::read_to_string(&path).is_err());
    assert!(xcc::core::config::AppConfig::load_from_path(&path).is_err());
}
