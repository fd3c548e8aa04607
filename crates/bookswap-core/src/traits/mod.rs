//! Core traits defined in `bookswap-core` and implemented by other crates.

pub mod cache;
pub mod local_store;

pub use cache::CacheProvider;
pub use local_store::LocalStore;
