//! # bookswap-entity
//!
//! Domain entity models for BookSwap. Database rows derive
//! `sqlx::FromRow`; shipping quotes are ephemeral value objects that are
//! never persisted.

pub mod broadcast;
pub mod notification;
pub mod quote;
