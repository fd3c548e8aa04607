//! # bookswap-core
//!
//! Core crate for BookSwap. Contains the unified error system, configuration
//! schemas, storage/cache traits, and the resilience primitives (retry,
//! circuit breaker, debounce, log throttling) shared by every service.
//!
//! This crate has **no** internal dependencies on other BookSwap crates.

pub mod config;
pub mod error;
pub mod resilience;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
