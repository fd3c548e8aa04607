//! Courier quote CLI command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use bookswap_core::config::AppConfig;
use bookswap_core::error::AppError;
use bookswap_courier::QuoteAggregator;
use bookswap_entity::quote::{Quote, ShipmentRequest};

/// Arguments for the quotes command
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// JSON file holding the shipment (`from`, `to`, `parcel`)
    pub request: String,
}

/// Quote display row for table output
#[derive(Debug, Serialize, Tabled)]
struct QuoteRow {
    /// Highlights
    #[tabled(rename = "")]
    tags: String,
    /// Provider
    provider: String,
    /// Service
    service: String,
    /// Price
    price: String,
    /// Transit days
    days: u32,
}

/// Execute the quotes command
pub async fn execute(
    args: &QuoteArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let contents = tokio::fs::read_to_string(&args.request).await?;
    let request: ShipmentRequest = serde_json::from_str(&contents)?;

    let aggregator = QuoteAggregator::from_config(&config.couriers)?;
    if aggregator.provider_names().is_empty() {
        output::print_warning("No courier provider is configured with an API key.");
    }

    let comparison = aggregator.get_quote_comparison(&request).await?;

    match format {
        OutputFormat::Json => output::print_json(&comparison),
        OutputFormat::Table => {
            let tag = |q: &Quote| {
                let mut tags = Vec::new();
                if comparison.cheapest.as_ref() == Some(q) {
                    tags.push("cheapest");
                }
                if comparison.fastest.as_ref() == Some(q) {
                    tags.push("fastest");
                }
                if comparison.recommended.as_ref() == Some(q) {
                    tags.push("recommended");
                }
                tags.join(", ")
            };
            let rows: Vec<QuoteRow> = comparison
                .quotes
                .iter()
                .map(|q| QuoteRow {
                    tags: tag(q),
                    provider: q.provider.clone(),
                    service: q.service_name.clone(),
                    price: format!("R {:.2}", q.price),
                    days: q.transit_days,
                })
                .collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
