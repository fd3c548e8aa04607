//! Normalised courier quote.

use serde::{Deserialize, Serialize};

/// One priced delivery option from one courier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Provider identifier (e.g. `"shiplogic"`).
    pub provider: String,
    /// Provider-specific service level code.
    pub service_code: String,
    /// Human-readable service name.
    pub service_name: String,
    /// Price in rand, VAT inclusive.
    pub price: f64,
    /// Estimated business days in transit.
    pub transit_days: u32,
    /// Extra features (tracking, insurance, collection).
    #[serde(default)]
    pub features: Vec<String>,
}

/// All quotes for a shipment plus the derived selections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteComparison {
    /// Every quote that was obtained, in provider order.
    pub quotes: Vec<Quote>,
    /// Lowest price; first encountered wins ties.
    pub cheapest: Option<Quote>,
    /// Fewest transit days; first encountered wins ties.
    pub fastest: Option<Quote>,
    /// Best weighted price/transit score.
    pub recommended: Option<Quote>,
}

impl QuoteComparison {
    /// Whether no provider returned a quote.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
