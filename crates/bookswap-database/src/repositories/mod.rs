//! sqlx-backed repository implementations for all BookSwap entities.

pub mod broadcast;
pub mod broadcast_view;
pub mod notification;

pub use broadcast::BroadcastRepository;
pub use broadcast_view::BroadcastViewRepository;
pub use notification::NotificationRepository;
