//! Fastway parcel lookup.
//!
//! `GET {base}/latest/psc/lookup/{region}/{suburb}/{postcode}/{weight}?api_key=...`
//! Prices and the delivery timeframe come back as numbers or strings
//! depending on the endpoint version.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use bookswap_core::config::couriers::FastwayConfig;
use bookswap_core::error::AppError;
use bookswap_core::result::AppResult;
use bookswap_entity::quote::{Parcel, Quote, ShipmentRequest};

use super::DEFAULT_TRANSIT_DAYS;
use crate::http::{ensure_success, request_error};
use crate::provider::CourierProvider;

/// Provider name of the Fastway integration.
pub const FASTWAY: &str = "fastway";

/// Divisor turning cubic centimetres into volumetric kilograms.
const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Fastway lookup client.
#[derive(Debug, Clone)]
pub struct FastwayProvider {
    /// API base URL.
    base_url: String,
    /// Query-string API key.
    api_key: String,
    /// Franchise region of the collection point.
    region_code: String,
    /// Shared HTTP client.
    client: Client,
}

impl FastwayProvider {
    /// Create a client from configuration.
    pub fn new(config: &FastwayConfig, client: Client) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            region_code: config.region_code.clone(),
            client,
        }
    }

    fn lookup_url(&self, request: &ShipmentRequest) -> Result<Url, AppError> {
        lookup_url(&self.base_url, &self.region_code, &self.api_key, request)
    }
}

#[async_trait]
impl CourierProvider for FastwayProvider {
    fn name(&self) -> &str {
        FASTWAY
    }

    async fn get_quotes(&self, request: &ShipmentRequest) -> AppResult<Vec<Quote>> {
        let url = self.lookup_url(request)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(FASTWAY, e))?;
        let response = ensure_success(FASTWAY, response)?;
        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| request_error(FASTWAY, e))?;

        let quotes = lookup.into_quotes()?;
        debug!(provider = FASTWAY, count = quotes.len(), "Rates received");
        Ok(quotes)
    }
}

fn lookup_url(
    base_url: &str,
    region_code: &str,
    api_key: &str,
    request: &ShipmentRequest,
) -> Result<Url, AppError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::configuration(format!("Invalid Fastway base URL: {e}")))?;
    let weight = chargeable_weight(&request.parcel).to_string();
    url.path_segments_mut()
        .map_err(|_| AppError::configuration("Fastway base URL cannot have a path"))?
        .pop_if_empty()
        .extend([
            "latest",
            "psc",
            "lookup",
            region_code,
            request.to.suburb.as_str(),
            request.to.postal_code.as_str(),
            weight.as_str(),
        ]);
    url.query_pairs_mut().append_pair("api_key", api_key);
    Ok(url)
}

/// Whole kilograms billed: the larger of actual and volumetric weight,
/// rounded up, at least 1.
fn chargeable_weight(parcel: &Parcel) -> u32 {
    let volumetric = parcel.length_cm * parcel.width_cm * parcel.height_cm / VOLUMETRIC_DIVISOR;
    let kg = parcel.weight_kg.max(volumetric).ceil();
    if kg.is_finite() && kg >= 1.0 {
        kg as u32
    } else {
        1
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    result: Option<LookupResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    #[serde(default)]
    services: Vec<FastwayService>,
    #[serde(default, deserialize_with = "lenient_days")]
    delivery_timeframe_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FastwayService {
    #[serde(default)]
    name: String,
    #[serde(default)]
    labelcode: String,
    #[serde(deserialize_with = "lenient_price")]
    totalprice_normal: f64,
    #[serde(rename = "type", default)]
    service_type: String,
}

impl LookupResponse {
    fn into_quotes(self) -> Result<Vec<Quote>, AppError> {
        if let Some(error) = self.error {
            return Err(AppError::external_service(format!(
                "fastway lookup failed: {error}"
            )));
        }
        let Some(result) = self.result else {
            return Ok(Vec::new());
        };

        let transit_days = result.delivery_timeframe_days.unwrap_or(DEFAULT_TRANSIT_DAYS);
        Ok(result
            .services
            .into_iter()
            .map(|service| {
                let mut features = vec!["tracking".to_string()];
                if !service.service_type.is_empty() {
                    features.push(service.service_type.to_lowercase());
                }
                Quote {
                    provider: FASTWAY.to_string(),
                    service_code: service.labelcode,
                    service_name: service.name,
                    price: service.totalprice_normal,
                    transit_days: transit_days.max(1),
                    features,
                }
            })
            .collect())
    }
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("price out of range")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid price '{s}'"))),
        other => Err(serde::de::Error::custom(format!("invalid price {other}"))),
    }
}

fn lenient_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
