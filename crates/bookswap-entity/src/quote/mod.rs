//! Shipping quote value objects. Quotes are produced per request and never stored.

pub mod model;
pub mod shipment;

pub use model::{Quote, QuoteComparison};
pub use shipment::{Address, Parcel, ShipmentRequest};
