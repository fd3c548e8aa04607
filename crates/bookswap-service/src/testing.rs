//! In-memory store implementations for service tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use bookswap_cache::CacheManager;
use bookswap_core::config::cache::CacheConfig;
use bookswap_core::error::AppError;
use bookswap_core::result::AppResult;
use bookswap_database::{BroadcastStore, BroadcastViewStore, NotificationStore};
use bookswap_entity::broadcast::{Broadcast, BroadcastPatch, NewBroadcast};
use bookswap_entity::notification::{NewNotification, Notification};

pub(crate) fn cache() -> Arc<CacheManager> {
    Arc::new(CacheManager::new(&CacheConfig::default()))
}

#[derive(Debug, Default)]
pub(crate) struct FakeNotificationStore {
    rows: Mutex<Vec<Notification>>,
    list_calls: AtomicU32,
    failing_lists: AtomicU32,
    failing_creates: AtomicU32,
}

impl FakeNotificationStore {
    pub(crate) fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_lists(&self, n: u32) {
        self.failing_lists.store(n, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_creates(&self, n: u32) {
        self.failing_creates.store(n, Ordering::SeqCst);
    }

    pub(crate) fn rows(&self) -> Vec<Notification> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationStore for FakeNotificationStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_lists.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_lists.store(failing - 1, Ordering::SeqCst);
            return Err(AppError::database("connection reset"));
        }
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }

    async fn create(&self, input: &NewNotification) -> AppResult<Notification> {
        let failing = self.failing_creates.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_creates.store(failing - 1, Ordering::SeqCst);
            return Err(AppError::database("connection reset"));
        }
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            title: input.title.clone(),
            message: input.message.clone(),
            notification_type: input.notification_type.as_str().to_string(),
            read: false,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(notification.clone());
        Ok(notification)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let mut count = 0;
        for n in self.rows.lock().unwrap().iter_mut() {
            if n.user_id == user_id && !n.read {
                n.read = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(rows.len() < before)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| n.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }

    async fn delete_older_than(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let len = rows.len();
        rows.retain(|n| n.created_at >= before);
        Ok((len - rows.len()) as u64)
    }
}

/// Broadcast store whose reads can be switched to fail.
#[derive(Debug, Default)]
pub(crate) struct FakeBroadcastStore {
    rows: Mutex<Vec<Broadcast>>,
    read_calls: AtomicU32,
    failure: Mutex<Option<AppError>>,
}

impl FakeBroadcastStore {
    pub(crate) fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_with(&self, err: Option<AppError>) {
        *self.failure.lock().unwrap() = err;
    }

    pub(crate) fn insert(&self, broadcast: Broadcast) {
        self.rows.lock().unwrap().push(broadcast);
    }

    fn check(&self) -> AppResult<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BroadcastStore for FakeBroadcastStore {
    async fn find_active(&self, now: DateTime<Utc>) -> AppResult<Vec<Broadcast>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.is_live_at(now))
            .cloned()
            .collect())
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Broadcast>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Broadcast>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, input: &NewBroadcast) -> AppResult<Broadcast> {
        self.check()?;
        let broadcast = Broadcast {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            message: input.message.clone(),
            broadcast_type: input.broadcast_type.as_str().to_string(),
            priority: input.priority.as_str().to_string(),
            target_audience: input.target_audience.as_str().to_string(),
            active: true,
            created_by: input.created_by,
            created_at: Utc::now(),
            expires_at: input.expires_at,
        };
        self.insert(broadcast.clone());
        Ok(broadcast)
    }

    async fn update(&self, id: Uuid, patch: &BroadcastPatch) -> AppResult<Option<Broadcast>> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(b) = rows.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            b.title = title.clone();
        }
        if let Some(message) = &patch.message {
            b.message = message.clone();
        }
        if let Some(priority) = patch.priority {
            b.priority = priority.as_str().to_string();
        }
        if let Some(audience) = patch.target_audience {
            b.target_audience = audience.as_str().to_string();
        }
        if let Some(active) = patch.active {
            b.active = active;
        }
        if patch.clear_expiry {
            b.expires_at = None;
        } else if patch.expires_at.is_some() {
            b.expires_at = patch.expires_at;
        }
        Ok(Some(b.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| b.id != id);
        Ok(rows.len() < before)
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.check()?;
        let mut count = 0;
        for b in self.rows.lock().unwrap().iter_mut() {
            if b.active && b.is_expired_at(now) {
                b.active = false;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeViewStore {
    views: Mutex<HashSet<(Uuid, Uuid)>>,
    missing_table: std::sync::atomic::AtomicBool,
}

impl FakeViewStore {
    pub(crate) fn set_missing_table(&self, missing: bool) {
        self.missing_table.store(missing, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.missing_table.load(Ordering::SeqCst) {
            Err(AppError::feature_unavailable("relation \"broadcast_views\" does not exist"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BroadcastViewStore for FakeViewStore {
    async fn record_view(&self, broadcast_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        self.check()?;
        Ok(self.views.lock().unwrap().insert((broadcast_id, user_id)))
    }

    async fn remove_view(&self, broadcast_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        self.check()?;
        Ok(self.views.lock().unwrap().remove(&(broadcast_id, user_id)))
    }

    async fn viewed_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.check()?;
        Ok(self
            .views
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, u)| *u == user_id)
            .map(|(b, _)| *b)
            .collect())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        self.check()?;
        let mut views = self.views.lock().unwrap();
        let before = views.len();
        views.retain(|(_, u)| *u != user_id);
        Ok((before - views.len()) as u64)
    }
}
