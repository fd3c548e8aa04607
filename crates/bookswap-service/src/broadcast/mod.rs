//! Admin broadcasts: listing, management and viewed-state tracking.

pub mod dismissed;
pub mod service;

pub use service::BroadcastService;
