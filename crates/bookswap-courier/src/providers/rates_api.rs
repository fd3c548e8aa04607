//! ShipLogic-style rates API, used by ShipLogic and The Courier Guy.
//!
//! `POST {base}/v2/rates` with collection/delivery addresses and parcels;
//! the response lists one rate per service level with a delivery window.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bookswap_core::config::couriers::ProviderConfig;
use bookswap_core::result::AppResult;
use bookswap_entity::quote::{Address, Quote, ShipmentRequest};

use super::DEFAULT_TRANSIT_DAYS;
use crate::http::{ensure_success, request_error};
use crate::provider::CourierProvider;

/// Provider name of the ShipLogic integration.
pub const SHIPLOGIC: &str = "shiplogic";
/// Provider name of The Courier Guy integration.
pub const COURIER_GUY: &str = "courier-guy";

/// Client for one deployment of the rates API.
#[derive(Debug, Clone)]
pub struct RatesApiProvider {
    /// Provider name placed on quotes.
    name: &'static str,
    /// API base URL without trailing slash.
    base_url: String,
    /// Bearer token.
    api_key: String,
    /// Shared HTTP client.
    client: Client,
}

impl RatesApiProvider {
    /// ShipLogic.
    pub fn shiplogic(config: &ProviderConfig, client: Client) -> Self {
        Self::new(SHIPLOGIC, config, client)
    }

    /// The Courier Guy, which runs the same API under its own host.
    pub fn courier_guy(config: &ProviderConfig, client: Client) -> Self {
        Self::new(COURIER_GUY, config, client)
    }

    fn new(name: &'static str, config: &ProviderConfig, client: Client) -> Self {
        Self {
            name,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        }
    }
}

#[async_trait]
impl CourierProvider for RatesApiProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn get_quotes(&self, request: &ShipmentRequest) -> AppResult<Vec<Quote>> {
        let collection_date = Utc::now().date_naive();
        let body = RatesRequest::new(request, collection_date);
        let url = format!("{}/v2/rates", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(self.name, e))?;
        let response = ensure_success(self.name, response)?;
        let rates: RatesResponse = response
            .json()
            .await
            .map_err(|e| request_error(self.name, e))?;

        let quotes = rates.into_quotes(self.name, collection_date);
        debug!(provider = self.name, count = quotes.len(), "Rates received");
        Ok(quotes)
    }
}

#[derive(Debug, Serialize)]
struct RatesRequest<'a> {
    collection_address: RatesAddress<'a>,
    delivery_address: RatesAddress<'a>,
    parcels: Vec<RatesParcel>,
    declared_value: f64,
    collection_min_date: String,
}

#[derive(Debug, Serialize)]
struct RatesAddress<'a> {
    #[serde(rename = "type")]
    address_type: &'static str,
    street_address: &'a str,
    local_area: &'a str,
    city: &'a str,
    zone: &'a str,
    country: &'a str,
    code: &'a str,
}

#[derive(Debug, Serialize)]
struct RatesParcel {
    submitted_length_cm: f64,
    submitted_width_cm: f64,
    submitted_height_cm: f64,
    submitted_weight_kg: f64,
}

impl<'a> RatesRequest<'a> {
    fn new(request: &'a ShipmentRequest, collection_date: NaiveDate) -> Self {
        let parcel = &request.parcel;
        Self {
            collection_address: RatesAddress::from(&request.from),
            delivery_address: RatesAddress::from(&request.to),
            parcels: vec![RatesParcel {
                submitted_length_cm: parcel.length_cm,
                submitted_width_cm: parcel.width_cm,
                submitted_height_cm: parcel.height_cm,
                submitted_weight_kg: parcel.weight_kg,
            }],
            declared_value: 0.0,
            collection_min_date: collection_date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl<'a> From<&'a Address> for RatesAddress<'a> {
    fn from(address: &'a Address) -> Self {
        Self {
            address_type: "residential",
            street_address: &address.street,
            local_area: &address.suburb,
            city: &address.city,
            zone: &address.province,
            country: &address.country,
            code: &address.postal_code,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: Vec<Rate>,
}

#[derive(Debug, Deserialize)]
struct Rate {
    rate: f64,
    service_level: ServiceLevel,
}

#[derive(Debug, Deserialize)]
struct ServiceLevel {
    #[serde(default)]
    code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    delivery_date_from: Option<String>,
    #[serde(default)]
    delivery_date_to: Option<String>,
}

impl RatesResponse {
    fn into_quotes(self, provider: &str, collection_date: NaiveDate) -> Vec<Quote> {
        self.rates
            .into_iter()
            .map(|rate| {
                let level = rate.service_level;
                let latest = level
                    .delivery_date_to
                    .as_deref()
                    .or(level.delivery_date_from.as_deref())
                    .and_then(parse_date);
                Quote {
                    provider: provider.to_string(),
                    service_name: if level.name.is_empty() {
                        level.code.clone()
                    } else {
                        level.name
                    },
                    service_code: level.code,
                    price: rate.rate,
                    transit_days: latest
                        .map(|date| transit_days(collection_date, date))
                        .unwrap_or(DEFAULT_TRANSIT_DAYS),
                    features: vec!["tracking".to_string(), "door-to-door".to_string()],
                }
            })
            .collect()
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

fn transit_days(collection: NaiveDate, delivery: NaiveDate) -> u32 {
    let days = (delivery - collection).num_days().max(1);
    u32::try_from(days).unwrap_or(u32::MAX)
}
