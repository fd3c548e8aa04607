//! Notification CRUD with a read-through per-user cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use bookswap_cache::CacheManager;
use bookswap_cache::keys;
use bookswap_core::config::notifications::NotificationConfig;
use bookswap_core::error::AppError;
use bookswap_core::resilience::{RetryPolicy, retry_with_connection};
use bookswap_core::traits::cache::CacheProvider;
use bookswap_database::NotificationStore;
use bookswap_entity::notification::{NewNotification, Notification};

/// Reads and writes a user's notifications.
///
/// Reads go through the cache; every write drops the affected user's
/// cache entries so the next read sees the change.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Notification persistence.
    store: Arc<dyn NotificationStore>,
    /// Read-through cache.
    cache: Arc<CacheManager>,
    /// Retry policy for reads.
    retry: RetryPolicy,
    /// TTL of cached lists and counts.
    cache_ttl: Duration,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        cache: Arc<CacheManager>,
        config: &NotificationConfig,
    ) -> Self {
        Self {
            store,
            cache,
            retry: RetryPolicy::fixed(
                config.connection_retries,
                Duration::from_millis(config.connection_retry_delay_ms),
            ),
            cache_ttl: config.cache_ttl(),
        }
    }

    /// All notifications of a user, newest first.
    pub async fn get_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let key = keys::notification_list(user_id);
        if let Some(cached) = self.cache_get::<Vec<Notification>>(&key).await {
            return Ok(cached);
        }

        let store = Arc::clone(&self.store);
        let notifications = retry_with_connection("notifications.list", &self.retry, || {
            let store = Arc::clone(&store);
            async move { store.find_by_user(user_id).await }
        })
        .await?;

        self.cache_put(&key, &notifications).await;
        Ok(notifications)
    }

    /// Number of unread notifications of a user.
    pub async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        let key = keys::unread_notification_count(user_id);
        if let Some(cached) = self.cache_get::<i64>(&key).await {
            return Ok(cached);
        }

        let store = Arc::clone(&self.store);
        let count = retry_with_connection("notifications.unread", &self.retry, || {
            let store = Arc::clone(&store);
            async move { store.count_unread(user_id).await }
        })
        .await?;

        self.cache_put(&key, &count).await;
        Ok(count)
    }

    /// Create a notification for a user.
    pub async fn create_notification(
        &self,
        input: NewNotification,
    ) -> Result<Notification, AppError> {
        input.validate()?;

        let notification = self.store.create(&input).await?;
        self.invalidate_cache(input.user_id).await;

        info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            notification_type = %notification.notification_type,
            "Notification created"
        );
        Ok(notification)
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
        let updated = self.store.mark_read(notification_id, user_id).await?;
        if !updated {
            return Err(AppError::not_found(format!(
                "Notification {notification_id} not found"
            )));
        }
        self.invalidate_cache(user_id).await;
        Ok(())
    }

    /// Mark all of a user's notifications as read.
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let count = self.store.mark_all_read(user_id).await?;
        self.invalidate_cache(user_id).await;
        debug!(user_id = %user_id, count, "Marked all notifications read");
        Ok(count)
    }

    /// Delete one notification.
    pub async fn delete_notification(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<(), AppError> {
        let deleted = self.store.delete(notification_id, user_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!(
                "Notification {notification_id} not found"
            )));
        }
        self.invalidate_cache(user_id).await;
        Ok(())
    }

    /// Delete every notification of a user (profile deletion).
    pub async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let count = self.store.delete_all_for_user(user_id).await?;
        self.invalidate_cache(user_id).await;
        info!(user_id = %user_id, count, "Deleted all notifications of user");
        Ok(count)
    }

    /// Drop the cached list and count of a user.
    ///
    /// Cache failures are logged and otherwise ignored.
    pub async fn invalidate_cache(&self, user_id: Uuid) {
        for key in [
            keys::notification_list(user_id),
            keys::unread_notification_count(user_id),
        ] {
            if let Err(e) = self.cache.delete(&key).await {
                warn!(key = %key, error = %e, "Failed to invalidate notification cache");
            }
        }
    }

    /// Delete notifications created before `cutoff`.
    pub async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let count = self.store.delete_older_than(cutoff).await?;
        if count > 0 {
            if let Err(e) = self.cache.delete_pattern(&keys::notification_pattern()).await {
                warn!(error = %e, "Failed to flush notification cache after cleanup");
            }
        }
        info!(cutoff = %cutoff, count, "Old notifications cleaned up");
        Ok(count)
    }

    async fn cache_get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.cache.get_json::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Notification cache read failed");
                None
            }
        }
    }

    async fn cache_put<T: serde::Serialize + Send + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set_json(key, value, self.cache_ttl).await {
            warn!(key, error = %e, "Notification cache write failed");
        }
    }
}
