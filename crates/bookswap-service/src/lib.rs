//! # bookswap-service
//!
//! Business logic service layer for BookSwap. Services orchestrate the
//! store traits from `bookswap-database`, the read-through cache, the local
//! key/value store and the resilience primitives.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references, including shared circuit
//! breakers.

pub mod broadcast;
pub mod context;
pub mod notification;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::BroadcastService;
pub use context::{UserIdentity, parse_id};
pub use notification::NotificationService;
