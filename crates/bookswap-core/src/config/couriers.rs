//! Courier provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for every courier integration plus shared HTTP limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Per-provider request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Courier Guy (ShipLogic-compatible rates API).
    #[serde(default = "default_courier_guy")]
    pub courier_guy: ProviderConfig,
    /// ShipLogic rates API.
    #[serde(default = "default_shiplogic")]
    pub shiplogic: ProviderConfig,
    /// Fastway parcel lookup API.
    #[serde(default = "default_fastway")]
    pub fastway: FastwayConfig,
}

impl CourierConfig {
    /// Provider timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            courier_guy: default_courier_guy(),
            shiplogic: default_shiplogic(),
            fastway: default_fastway(),
        }
    }
}

/// Connection settings for a single rates API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether the provider takes part in quote aggregation.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of the provider API.
    pub base_url: String,
    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,
}

/// Fastway lookups additionally need the franchise region code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastwayConfig {
    /// Whether the provider takes part in quote aggregation.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of the Fastway API.
    #[serde(default = "default_fastway_url")]
    pub base_url: String,
    /// API key sent as the `api_key` query parameter.
    #[serde(default)]
    pub api_key: String,
    /// Regional franchise code used for lookups.
    #[serde(default = "default_fastway_region")]
    pub region_code: String,
}

fn default_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_courier_guy() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        base_url: "https://api.portal.thecourierguy.co.za".to_string(),
        api_key: String::new(),
    }
}

fn default_shiplogic() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        base_url: "https://api.shiplogic.com".to_string(),
        api_key: String::new(),
    }
}

fn default_fastway_url() -> String {
    "https://sa.api.fastway.org".to_string()
}

fn default_fastway_region() -> String {
    "JNB".to_string()
}

fn default_fastway() -> FastwayConfig {
    FastwayConfig {
        enabled: true,
        base_url: default_fastway_url(),
        api_key: String::new(),
        region_code: default_fastway_region(),
    }
}
