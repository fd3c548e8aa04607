//! Storage traits the service layer depends on.
//!
//! The sqlx repositories in [`crate::repositories`] implement these; tests
//! substitute in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use bookswap_core::result::AppResult;
use bookswap_entity::broadcast::{Broadcast, BroadcastPatch, NewBroadcast};
use bookswap_entity::notification::{NewNotification, Notification};

/// Persistence of per-user notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// All notifications of a user, newest first.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>>;

    /// Number of unread notifications of a user.
    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64>;

    /// Insert a notification.
    async fn create(&self, input: &NewNotification) -> AppResult<Notification>;

    /// Flip `read` on one notification. Returns `false` if no row matched.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Flip `read` on every unread notification of a user.
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;

    /// Delete one notification. Returns `false` if no row matched.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Delete every notification of a user.
    async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Delete notifications created before `before`.
    async fn delete_older_than(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Persistence of admin broadcasts.
#[async_trait]
pub trait BroadcastStore: Send + Sync + std::fmt::Debug + 'static {
    /// Active, unexpired broadcasts at `now`, newest first.
    async fn find_active(&self, now: DateTime<Utc>) -> AppResult<Vec<Broadcast>>;

    /// Most recent broadcasts regardless of state.
    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Broadcast>>;

    /// One broadcast by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Broadcast>>;

    /// Insert a broadcast.
    async fn create(&self, input: &NewBroadcast) -> AppResult<Broadcast>;

    /// Apply a partial update. Returns `None` if no row matched.
    async fn update(&self, id: Uuid, patch: &BroadcastPatch) -> AppResult<Option<Broadcast>>;

    /// Delete a broadcast. Returns `false` if no row matched.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Switch off broadcasts whose expiry has passed.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Durable per-user broadcast view records.
#[async_trait]
pub trait BroadcastViewStore: Send + Sync + std::fmt::Debug + 'static {
    /// Record a view. Returns `true` only for a first view.
    async fn record_view(&self, broadcast_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Forget one view so it can be recorded again. Returns `false` if
    /// there was none.
    async fn remove_view(&self, broadcast_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// IDs of all broadcasts the user has viewed.
    async fn viewed_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Forget all views of a user.
    async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64>;
}
