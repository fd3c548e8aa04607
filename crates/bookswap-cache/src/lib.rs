//! # bookswap-cache
//!
//! Cache and local storage implementations for BookSwap:
//!
//! - **memory**: in-process read-through cache using [moka](https://crates.io/crates/moka)
//! - **local**: small persistent key/value stores (JSON file or in-memory)
//!   backing client-local flags such as dismissed broadcasts

pub mod keys;
pub mod local;
pub mod memory;
pub mod provider;

pub use local::{FileLocalStore, MemoryLocalStore};
pub use provider::CacheManager;
