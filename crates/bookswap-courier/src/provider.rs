//! Courier provider trait.

use async_trait::async_trait;

use bookswap_core::result::AppResult;
use bookswap_entity::quote::{Quote, ShipmentRequest};

/// A courier that can price a shipment.
#[async_trait]
pub trait CourierProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Identifier placed in [`Quote::provider`].
    fn name(&self) -> &str;

    /// All service levels this courier offers for the shipment.
    async fn get_quotes(&self, request: &ShipmentRequest) -> AppResult<Vec<Quote>>;
}
