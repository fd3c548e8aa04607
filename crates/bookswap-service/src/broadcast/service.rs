//! Broadcast listing and management behind a circuit breaker.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use bookswap_cache::keys::BROADCASTS_DISABLED;
use bookswap_core::config::broadcasts::BroadcastConfig;
use bookswap_core::error::{AppError, ErrorKind};
use bookswap_core::resilience::{CircuitBreaker, LogThrottle};
use bookswap_core::traits::local_store::LocalStore;
use bookswap_database::{BroadcastStore, BroadcastViewStore};
use bookswap_entity::broadcast::{Broadcast, BroadcastPatch, NewBroadcast};
use bookswap_entity::notification::{NewNotification, Notification, NotificationType};

use super::dismissed::DismissedBroadcasts;
use crate::context::UserIdentity;
use crate::notification::NotificationService;

/// Lists, manages and tracks views of admin broadcasts.
///
/// Reads degrade to an empty list: while the shared breaker is open, after
/// a query failure, and for the rest of the session once the broadcasts
/// table turned out to be missing.
#[derive(Debug)]
pub struct BroadcastService {
    /// Broadcast persistence.
    store: Arc<dyn BroadcastStore>,
    /// Durable views of signed-in users.
    views: Arc<dyn BroadcastViewStore>,
    /// Used to materialise viewed broadcasts.
    notifications: Arc<NotificationService>,
    /// Local flags and the guest dismissal list.
    local: Arc<dyn LocalStore>,
    /// Guest dismissals.
    dismissed: DismissedBroadcasts,
    /// Breaker shared with every caller of the broadcasts table.
    breaker: Arc<CircuitBreaker>,
    /// Error log suppression.
    log_throttle: LogThrottle,
    /// Set once the broadcasts table is known to be missing.
    disabled: AtomicBool,
}

impl BroadcastService {
    /// Creates a new broadcast service.
    pub fn new(
        store: Arc<dyn BroadcastStore>,
        views: Arc<dyn BroadcastViewStore>,
        notifications: Arc<NotificationService>,
        local: Arc<dyn LocalStore>,
        breaker: Arc<CircuitBreaker>,
        config: &BroadcastConfig,
    ) -> Self {
        Self {
            store,
            views,
            notifications,
            dismissed: DismissedBroadcasts::new(Arc::clone(&local)),
            local,
            breaker,
            log_throttle: LogThrottle::new(config.max_logged_errors, config.log_window()),
            disabled: AtomicBool::new(false),
        }
    }

    /// Pick up a `broadcasts_disabled` flag persisted by an earlier session.
    pub async fn load_persisted_state(&self) -> Result<bool, AppError> {
        let disabled = self
            .local
            .get(BROADCASTS_DISABLED)
            .await?
            .is_some_and(|v| v == "true");
        if disabled {
            self.disabled.store(true, Ordering::SeqCst);
            info!("Broadcasts disabled by persisted flag");
        }
        Ok(disabled)
    }

    /// Whether broadcasts are switched off for this session.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Switch broadcasts back on after the table has been provisioned.
    pub async fn enable(&self) -> Result<(), AppError> {
        self.local.remove(BROADCASTS_DISABLED).await?;
        self.disabled.store(false, Ordering::SeqCst);
        self.breaker.reset();
        info!("Broadcasts re-enabled");
        Ok(())
    }

    /// Live broadcasts visible to `viewer` (`None` for a guest), most
    /// important first, then newest first.
    pub async fn get_active_broadcasts(
        &self,
        viewer: Option<&UserIdentity>,
    ) -> Result<Vec<Broadcast>, AppError> {
        if self.is_disabled() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let store = Arc::clone(&self.store);
        match self.breaker.call(|| async move { store.find_active(now).await }).await {
            Ok(Some(rows)) => Ok(visible_to(rows, viewer, now)),
            Ok(None) => {
                debug!(breaker = %self.breaker.name(), "Circuit open, skipping broadcast query");
                Ok(Vec::new())
            }
            Err(e) => {
                self.handle_error("broadcasts.active", &e).await;
                Ok(Vec::new())
            }
        }
    }

    /// One broadcast, provided it is live and meant for `viewer`.
    pub async fn get_broadcast(
        &self,
        viewer: Option<&UserIdentity>,
        broadcast_id: Uuid,
    ) -> Result<Broadcast, AppError> {
        self.ensure_enabled()?;

        let store = Arc::clone(&self.store);
        let found = match self
            .breaker
            .call(|| async move { store.find_by_id(broadcast_id).await })
            .await
        {
            Ok(Some(found)) => found,
            Ok(None) => {
                return Err(AppError::service_unavailable(
                    "Broadcasts are temporarily unavailable",
                ));
            }
            Err(e) => {
                self.handle_error("broadcasts.get", &e).await;
                return Err(e);
            }
        };

        found
            .and_then(|b| visible_to(vec![b], viewer, Utc::now()).pop())
            .ok_or_else(|| AppError::not_found(format!("No active broadcast {broadcast_id}")))
    }

    /// The most recent broadcasts regardless of state (admin listing).
    pub async fn get_all_broadcasts(
        &self,
        admin: &UserIdentity,
        limit: i64,
    ) -> Result<Vec<Broadcast>, AppError> {
        admin.require_admin()?;
        self.ensure_enabled()?;

        let store = Arc::clone(&self.store);
        match self.breaker.call(|| async move { store.find_recent(limit).await }).await {
            Ok(rows) => Ok(rows.unwrap_or_default()),
            Err(e) => {
                self.handle_error("broadcasts.all", &e).await;
                Err(e)
            }
        }
    }

    /// Publish a broadcast.
    pub async fn create_broadcast(
        &self,
        admin: &UserIdentity,
        mut input: NewBroadcast,
    ) -> Result<Broadcast, AppError> {
        admin.require_admin()?;
        input.validate()?;
        self.ensure_enabled()?;

        input.created_by = Some(admin.user_id);
        let broadcast = match self.store.create(&input).await {
            Ok(b) => b,
            Err(e) => {
                self.handle_error("broadcasts.create", &e).await;
                return Err(e);
            }
        };

        info!(
            broadcast_id = %broadcast.id,
            priority = %broadcast.priority,
            audience = %broadcast.target_audience,
            created_by = %admin.user_id,
            "Broadcast created"
        );
        Ok(broadcast)
    }

    /// Apply a partial update.
    pub async fn update_broadcast(
        &self,
        admin: &UserIdentity,
        broadcast_id: Uuid,
        patch: BroadcastPatch,
    ) -> Result<Broadcast, AppError> {
        admin.require_admin()?;
        patch.validate()?;
        if patch.clear_expiry && patch.expires_at.is_some() {
            return Err(AppError::validation(
                "A patch cannot both set and clear the expiry",
            ));
        }
        self.ensure_enabled()?;

        let updated = match self.store.update(broadcast_id, &patch).await {
            Ok(b) => b,
            Err(e) => {
                self.handle_error("broadcasts.update", &e).await;
                return Err(e);
            }
        };
        let broadcast = updated
            .ok_or_else(|| AppError::not_found(format!("Broadcast {broadcast_id} not found")))?;

        info!(broadcast_id = %broadcast_id, active = broadcast.active, "Broadcast updated");
        Ok(broadcast)
    }

    /// Switch a broadcast off without deleting it.
    pub async fn deactivate_broadcast(
        &self,
        admin: &UserIdentity,
        broadcast_id: Uuid,
    ) -> Result<Broadcast, AppError> {
        let patch = BroadcastPatch {
            active: Some(false),
            ..BroadcastPatch::default()
        };
        self.update_broadcast(admin, broadcast_id, patch).await
    }

    /// Delete a broadcast. Its view records go with it.
    pub async fn delete_broadcast(
        &self,
        admin: &UserIdentity,
        broadcast_id: Uuid,
    ) -> Result<(), AppError> {
        admin.require_admin()?;
        self.ensure_enabled()?;

        let deleted = match self.store.delete(broadcast_id).await {
            Ok(d) => d,
            Err(e) => {
                self.handle_error("broadcasts.delete", &e).await;
                return Err(e);
            }
        };
        if !deleted {
            return Err(AppError::not_found(format!(
                "Broadcast {broadcast_id} not found"
            )));
        }

        info!(broadcast_id = %broadcast_id, "Broadcast deleted");
        Ok(())
    }

    /// Active broadcasts the viewer has not seen yet.
    pub async fn get_unviewed_broadcasts(
        &self,
        viewer: Option<&UserIdentity>,
    ) -> Result<Vec<Broadcast>, AppError> {
        let active = self.get_active_broadcasts(viewer).await?;
        if active.is_empty() {
            return Ok(active);
        }

        let viewed = self.viewed_ids(viewer).await?;
        Ok(active
            .into_iter()
            .filter(|b| !viewed.contains(&b.id))
            .collect())
    }

    /// Record that the viewer has seen a broadcast.
    ///
    /// For a signed-in viewer the first view also copies the broadcast into
    /// their notifications; the new notification is returned. Guests only
    /// get a local dismissal.
    pub async fn mark_broadcast_viewed(
        &self,
        viewer: Option<&UserIdentity>,
        broadcast: &Broadcast,
    ) -> Result<Option<Notification>, AppError> {
        let Some(user) = viewer else {
            self.dismissed.insert(broadcast.id).await?;
            return Ok(None);
        };

        let first_view = match self.views.record_view(broadcast.id, user.user_id).await {
            Ok(first) => first,
            Err(e) if e.kind == ErrorKind::FeatureUnavailable => {
                self.log_throttled("broadcast_views.record", &e);
                self.dismissed.insert(broadcast.id).await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if !first_view {
            return Ok(None);
        }

        let created = self
            .notifications
            .create_notification(NewNotification::new(
                user.user_id,
                broadcast.title.clone(),
                broadcast.message.clone(),
                NotificationType::Broadcast,
            ))
            .await;
        let notification = match created {
            Ok(n) => n,
            Err(e) => {
                // The view must not outlive a failed materialisation.
                if let Err(undo) = self.views.remove_view(broadcast.id, user.user_id).await {
                    warn!(
                        broadcast_id = %broadcast.id,
                        user_id = %user.user_id,
                        error = %undo,
                        "Failed to roll back broadcast view"
                    );
                }
                return Err(e);
            }
        };

        debug!(
            broadcast_id = %broadcast.id,
            user_id = %user.user_id,
            "Broadcast materialised into notification"
        );
        Ok(Some(notification))
    }

    /// Drop every view record of a user (profile deletion).
    pub async fn forget_viewer(&self, user_id: Uuid) -> Result<u64, AppError> {
        match self.views.delete_for_user(user_id).await {
            Ok(count) => {
                info!(user_id = %user_id, count, "Deleted broadcast views of user");
                Ok(count)
            }
            Err(e) if e.kind == ErrorKind::FeatureUnavailable => {
                self.log_throttled("broadcast_views.delete", &e);
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Switch off broadcasts whose expiry has passed.
    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        if self.is_disabled() {
            return Ok(0);
        }

        let now = Utc::now();
        match self.store.deactivate_expired(now).await {
            Ok(count) => {
                if count > 0 {
                    info!(count, "Expired broadcasts deactivated");
                }
                Ok(count)
            }
            Err(e) => {
                self.handle_error("broadcasts.cleanup", &e).await;
                Err(e)
            }
        }
    }

    async fn viewed_ids(&self, viewer: Option<&UserIdentity>) -> Result<HashSet<Uuid>, AppError> {
        let Some(user) = viewer else {
            return Ok(self.dismissed.load().await?.into_iter().collect());
        };

        match self.views.viewed_ids(user.user_id).await {
            Ok(ids) => Ok(ids.into_iter().collect()),
            Err(e) if e.kind == ErrorKind::FeatureUnavailable => {
                self.log_throttled("broadcast_views.list", &e);
                Ok(self.dismissed.load().await?.into_iter().collect())
            }
            Err(e) => Err(e),
        }
    }

    fn ensure_enabled(&self) -> Result<(), AppError> {
        if self.is_disabled() {
            Err(AppError::feature_unavailable(
                "Broadcasts are disabled: the broadcasts table is not provisioned",
            ))
        } else {
            Ok(())
        }
    }

    async fn handle_error(&self, source: &str, err: &AppError) {
        if err.kind == ErrorKind::FeatureUnavailable {
            self.disable().await;
            return;
        }
        self.log_throttled(source, err);
    }

    async fn disable(&self) {
        if self.disabled.swap(true, Ordering::SeqCst) {
            return;
        }
        warn!("Broadcasts table is missing, disabling broadcasts");
        if let Err(e) = self.local.set(BROADCASTS_DISABLED, "true").await {
            warn!(error = %e, "Failed to persist broadcasts_disabled flag");
        }
    }

    fn log_throttled(&self, source: &str, err: &AppError) {
        if self.log_throttle.should_log(source) {
            warn!(source, error = %err, "Broadcast query failed");
        }
    }
}

/// Keep broadcasts that are live at `now` and meant for `viewer`, ordered
/// by priority then recency.
fn visible_to(
    rows: Vec<Broadcast>,
    viewer: Option<&UserIdentity>,
    now: DateTime<Utc>,
) -> Vec<Broadcast> {
    let is_admin = viewer.is_some_and(|u| u.is_admin);
    let mut visible: Vec<Broadcast> = rows
        .into_iter()
        .filter(|b| b.is_live_at(now) && b.audience().includes(is_admin))
        .collect();
    visible.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    visible
}
