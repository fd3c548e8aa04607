//! Fan-out of a shipment request to every configured courier.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};
use validator::Validate;

use bookswap_core::config::couriers::CourierConfig;
use bookswap_core::error::AppError;
use bookswap_core::result::AppResult;
use bookswap_entity::quote::{Quote, QuoteComparison, ShipmentRequest};

use crate::compare::compare_quotes;
use crate::http::build_client;
use crate::provider::CourierProvider;
use crate::providers::fastway::FASTWAY;
use crate::providers::rates_api::{COURIER_GUY, SHIPLOGIC};
use crate::providers::{FastwayProvider, RatesApiProvider};

/// Queries all providers in parallel and merges their quotes.
///
/// A provider that fails or exceeds the timeout contributes nothing; the
/// others are unaffected.
#[derive(Debug, Clone)]
pub struct QuoteAggregator {
    /// Providers in result order.
    providers: Vec<Arc<dyn CourierProvider>>,
    /// Per-provider deadline.
    timeout: Duration,
}

impl QuoteAggregator {
    /// Create an aggregator over explicit providers.
    pub fn new(providers: Vec<Arc<dyn CourierProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Build the enabled providers from configuration.
    ///
    /// Providers without an API key are skipped with a warning.
    pub fn from_config(config: &CourierConfig) -> Result<Self, AppError> {
        let client = build_client(config.timeout())?;
        let mut providers: Vec<Arc<dyn CourierProvider>> = Vec::new();

        if usable(COURIER_GUY, config.courier_guy.enabled, &config.courier_guy.api_key) {
            providers.push(Arc::new(RatesApiProvider::courier_guy(
                &config.courier_guy,
                client.clone(),
            )));
        }
        if usable(SHIPLOGIC, config.shiplogic.enabled, &config.shiplogic.api_key) {
            providers.push(Arc::new(RatesApiProvider::shiplogic(
                &config.shiplogic,
                client.clone(),
            )));
        }
        if usable(FASTWAY, config.fastway.enabled, &config.fastway.api_key) {
            providers.push(Arc::new(FastwayProvider::new(&config.fastway, client)));
        }

        let aggregator = Self::new(providers, config.timeout());
        info!(providers = ?aggregator.provider_names(), "Courier providers configured");
        Ok(aggregator)
    }

    /// Names of the active providers.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Collect quotes from every provider.
    ///
    /// Never fails: errors and timeouts are logged and the provider is
    /// left out. Quotes keep provider order, then the provider's own order.
    pub async fn get_all_quotes(&self, request: &ShipmentRequest) -> Vec<Quote> {
        let calls = self.providers.iter().map(|provider| async move {
            let result = tokio::time::timeout(self.timeout, provider.get_quotes(request)).await;
            (provider.name(), result)
        });

        let mut quotes = Vec::new();
        for (name, result) in join_all(calls).await {
            match result {
                Ok(Ok(provider_quotes)) => {
                    let before = provider_quotes.len();
                    quotes.extend(
                        provider_quotes
                            .into_iter()
                            .filter(|q| q.price.is_finite() && q.price >= 0.0),
                    );
                    debug!(provider = name, received = before, "Provider quotes collected");
                }
                Ok(Err(e)) => {
                    warn!(provider = name, error = %e, "Courier quote request failed");
                }
                Err(_) => {
                    warn!(
                        provider = name,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Courier quote request timed out"
                    );
                }
            }
        }
        quotes
    }

    /// Validate the request, fetch all quotes and pick the highlights.
    pub async fn get_quote_comparison(
        &self,
        request: &ShipmentRequest,
    ) -> AppResult<QuoteComparison> {
        request.validate()?;
        let quotes = self.get_all_quotes(request).await;
        if quotes.is_empty() {
            info!("No courier returned a quote");
        }
        Ok(compare_quotes(quotes))
    }
}

fn usable(name: &str, enabled: bool, api_key: &str) -> bool {
    if !enabled {
        debug!(provider = name, "Courier provider disabled");
        return false;
    }
    if api_key.trim().is_empty() {
        warn!(provider = name, "Courier provider has no API key, skipping");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bookswap_core::error::ErrorKind;
    use bookswap_entity::quote::{Address, Parcel};

    #[derive(Debug)]
    struct FakeProvider {
        name: &'static str,
        delay: Duration,
        outcome: Result<Vec<(f64, u32)>, ()>,
    }

    impl FakeProvider {
        fn ok(name: &'static str, prices: Vec<(f64, u32)>) -> Arc<dyn CourierProvider> {
            Arc::new(Self {
                name,
                delay: Duration::ZERO,
                outcome: Ok(prices),
            })
        }

        fn failing(name: &'static str) -> Arc<dyn CourierProvider> {
            Arc::new(Self {
                name,
                delay: Duration::ZERO,
                outcome: Err(()),
            })
        }

        fn slow(name: &'static str, delay: Duration) -> Arc<dyn CourierProvider> {
            Arc::new(Self {
                name,
                delay,
                outcome: Ok(vec![(10.0, 1)]),
            })
        }
    }

    #[async_trait]
    impl CourierProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn get_quotes(&self, _request: &ShipmentRequest) -> AppResult<Vec<Quote>> {
            tokio::time::sleep(self.delay).await;
            match &self.outcome {
                Ok(prices) => Ok(prices
                    .iter()
                    .map(|(price, transit_days)| Quote {
                        provider: self.name.to_string(),
                        service_code: "STD".to_string(),
                        service_name: "Standard".to_string(),
                        price: *price,
                        transit_days: *transit_days,
                        features: Vec::new(),
                    })
                    .collect()),
                Err(()) => Err(AppError::service_unavailable("503 from upstream")),
            }
        }
    }

    fn request() -> ShipmentRequest {
        let address = |suburb: &str, code: &str| Address {
            street: "5 Lover's Walk".to_string(),
            suburb: suburb.to_string(),
            city: "Pretoria".to_string(),
            province: "Gauteng".to_string(),
            postal_code: code.to_string(),
            country: "ZA".to_string(),
        };
        ShipmentRequest {
            from: address("Hatfield", "0083"),
            to: address("Brooklyn", "0181"),
            parcel: Parcel::textbook(),
        }
    }

    #[tokio::test]
    async fn test_failing_provider_is_excluded() {
        let aggregator = QuoteAggregator::new(
            vec![
                FakeProvider::ok("a", vec![(100.0, 3)]),
                FakeProvider::failing("b"),
                FakeProvider::ok("c", vec![(90.0, 1), (70.0, 4)]),
            ],
            Duration::from_secs(5),
        );

        let quotes = aggregator.get_all_quotes(&request()).await;
        let providers: Vec<&str> = quotes.iter().map(|q| q.provider.as_str()).collect();
        assert_eq!(providers, vec!["a", "c", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let aggregator = QuoteAggregator::new(
            vec![
                FakeProvider::slow("slow", Duration::from_secs(60)),
                FakeProvider::ok("quick", vec![(55.0, 2)]),
            ],
            Duration::from_secs(10),
        );

        let started = tokio::time::Instant::now();
        let comparison = aggregator.get_quote_comparison(&request()).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(11));
        assert_eq!(comparison.quotes.len(), 1);
        assert_eq!(comparison.cheapest.unwrap().provider, "quick");
    }

    #[tokio::test]
    async fn test_invalid_prices_are_dropped() {
        let aggregator = QuoteAggregator::new(
            vec![FakeProvider::ok(
                "a",
                vec![(f64::NAN, 1), (-5.0, 1), (42.0, 2)],
            )],
            Duration::from_secs(5),
        );
        let quotes = aggregator.get_all_quotes(&request()).await;
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].price, 42.0);
    }

    #[tokio::test]
    async fn test_all_failing_yields_empty_comparison() {
        let aggregator =
            QuoteAggregator::new(vec![FakeProvider::failing("b")], Duration::from_secs(5));
        let comparison = aggregator.get_quote_comparison(&request()).await.unwrap();
        assert!(comparison.is_empty());
        assert!(comparison.recommended.is_none());
    }

    #[tokio::test]
    async fn test_invalid_parcel_is_rejected() {
        let aggregator =
            QuoteAggregator::new(vec![FakeProvider::ok("a", vec![])], Duration::from_secs(5));
        let mut req = request();
        req.parcel.weight_kg = 0.0;

        let err = aggregator.get_quote_comparison(&req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_from_config_skips_keyless_providers() {
        let mut config = CourierConfig::default();
        config.shiplogic.api_key = "sl-key".to_string();
        config.fastway.api_key = "fw-key".to_string();
        config.fastway.enabled = false;

        let aggregator = QuoteAggregator::from_config(&config).unwrap();
        assert_eq!(aggregator.provider_names(), vec!["shiplogic"]);
    }
}
