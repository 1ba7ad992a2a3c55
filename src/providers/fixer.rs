use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use crate::core::rates::{RateFetcher, RateSnapshot};

/// Fetches the latest rates from a fixer.io-compatible API such as
/// frankfurter.app (`GET {base_url}/latest`).
pub struct FixerProvider {
    base_url: String,
    base_currency: String,
    client: reqwest::Client,
}

impl FixerProvider {
    pub fn new(base_url: &str, base_currency: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent("xcc/0.1").build()?;
        Ok(FixerProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            base_currency: base_currency.trim().to_uppercase(),
            client,
        })
    }

    pub fn url(&self) -> String {
        format!("{}/latest", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: Option<String>,
    date: Option<String>,
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateFetcher for FixerProvider {
    #[instrument(name = "FixerRatesFetch", skip(self), fields(base = %self.base_currency))]
    async fn fetch_rates(&self) -> Result<RateSnapshot> {
        let url = self.url();
        debug!("Requesting exchange rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        debug!(response = ?response, "Received rates response");

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for {}", response.status(), url));
        }

        let text = response.text().await?;

        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse rates response from {}: {}", url, e))?;

        if data.rates.is_empty() {
            return Err(anyhow!("No rates found in response from {}", url));
        }

        let base = match data.base {
            Some(base) if !base.eq_ignore_ascii_case(&self.base_currency) => {
                warn!(
                    configured = %self.base_currency,
                    reported = %base,
                    "Provider reports a different base currency, using the reported one"
                );
                base
            }
            _ => self.base_currency.clone(),
        };

        Ok(RateSnapshot::new(&base, data.rates).with_date(data.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_response = r#"{
            "amount": 1.0,
            "base": "EUR",
            "date": "2024-05-17",
            "rates": {
                "USD": 1.0866,
                "GBP": 0.85553,
                "JPY": 169.1
            }
        }"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let provider = FixerProvider::new(&mock_server.uri(), "EUR").unwrap();
        let snapshot = provider.fetch_rates().await.unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.rate("EUR"), Some(1.0));
        assert_eq!(snapshot.rate("USD"), Some(1.0866));
        assert_eq!(snapshot.base(), Some("EUR"));
        assert_eq!(snapshot.date(), Some("2024-05-17"));
    }

    #[tokio::test]
    async fn test_base_currency_forced_to_one() {
        let mock_response = r#"{"rates": {"EUR": 1.3, "USD": 1.09}}"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let provider = FixerProvider::new(&format!("{}/", mock_server.uri()), "eur").unwrap();
        let snapshot = provider.fetch_rates().await.unwrap();

        assert_eq!(snapshot.rate("EUR"), Some(1.0));
        assert_eq!(snapshot.rate("USD"), Some(1.09));
        assert!(snapshot.date().is_none());
    }

    #[tokio::test]
    async fn test_reported_base_currency_wins() {
        let mock_response = r#"{"base": "USD", "rates": {"EUR": 0.92}}"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let provider = FixerProvider::new(&mock_server.uri(), "EUR").unwrap();
        let snapshot = provider.fetch_rates().await.unwrap();

        assert_eq!(snapshot.base(), Some("USD"));
        assert_eq!(snapshot.rate("USD"), Some(1.0));
        assert_eq!(snapshot.rate("EUR"), Some(0.92));
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server(ResponseTemplate::new(500)).await;

        let provider = FixerProvider::new(&mock_server.uri(), "EUR").unwrap();
        let result = provider.fetch_rates().await;

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            format!(
                "HTTP error: 500 Internal Server Error for {}/latest",
                mock_server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_missing_rates_field() {
        let mock_response = r#"{"base": "EUR", "date": "2024-05-17"}"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let provider = FixerProvider::new(&mock_server.uri(), "EUR").unwrap();
        let result = provider.fetch_rates().await;

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse rates response")
        );
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
                .await;

        let provider = FixerProvider::new(&mock_server.uri(), "EUR").unwrap();
        assert!(provider.fetch_rates().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_rates() {
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(r#"{"rates": {}}"#))
                .await;

        let provider = FixerProvider::new(&mock_server.uri(), "EUR").unwrap();
        let result = provider.fetch_rates().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("No rates found in response")
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let provider = FixerProvider::new("http://127.0.0.1:9", "EUR").unwrap();
        let result = provider.fetch_rates().await;
        assert!(result.unwrap_err().to_string().starts_with("Request error"));
    }
}
