//! # bookswap-database
//!
//! PostgreSQL connection management, migrations, the store traits the
//! service layer depends on, and their sqlx-backed repository
//! implementations.

pub mod connection;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{BroadcastStore, BroadcastViewStore, NotificationStore};
