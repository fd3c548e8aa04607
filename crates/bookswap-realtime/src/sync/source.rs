//! Where the synchroniser fetches notifications from.

use async_trait::async_trait;
use uuid::Uuid;

use bookswap_core::result::AppResult;
use bookswap_entity::notification::Notification;
use bookswap_service::NotificationService;

/// Pull side of the synchroniser.
#[async_trait]
pub trait NotificationSource: Send + Sync + std::fmt::Debug + 'static {
    /// The user's full notification list.
    async fn fetch_notifications(&self, user_id: Uuid) -> AppResult<Vec<Notification>>;

    /// Drop any cached copy so the next fetch reads fresh rows.
    async fn invalidate(&self, user_id: Uuid);
}

#[async_trait]
impl NotificationSource for NotificationService {
    async fn fetch_notifications(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        self.get_notifications(user_id).await
    }

    async fn invalidate(&self, user_id: Uuid) {
        self.invalidate_cache(user_id).await;
    }
}
