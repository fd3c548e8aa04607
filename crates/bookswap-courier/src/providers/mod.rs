//! Courier integrations.

pub mod fastway;
pub mod rates_api;

pub use fastway::FastwayProvider;
pub use rates_api::RatesApiProvider;

/// Used when a provider gives no delivery estimate.
pub(crate) const DEFAULT_TRANSIT_DAYS: u32 = 3;
