//! # bookswap-courier
//!
//! Shipping quotes for textbook deliveries. Each courier integration
//! implements [`CourierProvider`]; [`QuoteAggregator`] queries them
//! concurrently and [`compare_quotes`] picks the cheapest, fastest and
//! recommended option.

pub mod aggregator;
pub mod compare;
pub mod http;
pub mod provider;
pub mod providers;

pub use aggregator::QuoteAggregator;
pub use compare::compare_quotes;
pub use provider::CourierProvider;
pub use providers::{FastwayProvider, RatesApiProvider};
