//! The notification synchroniser.
//!
//! ```text
//!   set_user ──► subscribe(change feed) ──► initial refresh
//!
//!   change event ──► debounce ──► invalidate cache ──► refresh
//!                      (skipped while a refresh is in flight, or while
//!                       failing unless an insert arrived)
//!
//!   refresh failed ──► retry after 5s / 15s / 30s ──► surface error
//! ```
//!
//! Every user switch bumps a generation counter. Timers, subscriptions and
//! fetch results belonging to an older generation are discarded.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use bookswap_core::config::notifications::NotificationConfig;
use bookswap_core::resilience::Debouncer;
use bookswap_core::result::AppResult;
use bookswap_entity::notification::Notification;
use bookswap_service::UserIdentity;

use super::snapshot::{SyncSnapshot, dedup_by_id, same_contents};
use super::source::NotificationSource;
use crate::feed::{ChangeEvent, ChangeFeed, ChangeSubscription};

/// Delay used when the retry table is empty.
const FALLBACK_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Keeps one user's notification list current.
///
/// The state is published through a [`watch`] channel; [`snapshot`]
/// returns the latest value.
///
/// [`snapshot`]: NotificationSync::snapshot
#[derive(Debug)]
pub struct NotificationSync {
    inner: Arc<SyncInner>,
}

#[derive(Debug)]
struct SyncInner {
    /// Pull side.
    source: Arc<dyn NotificationSource>,
    /// Push side.
    feed: Arc<dyn ChangeFeed>,
    /// Delay before retry N, clamped to the last entry.
    retry_delays: Vec<Duration>,
    /// Scheduled retries after a failed fetch.
    max_retries: u32,
    /// Mutable state; never held across an await point.
    state: Mutex<SyncState>,
    /// Published snapshots.
    snapshot_tx: watch::Sender<SyncSnapshot>,
    /// Push-path debounce.
    debouncer: Debouncer,
    /// Pending retry timer.
    retry_timer: Mutex<Option<JoinHandle<()>>>,
    /// Change subscription task.
    listener: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Default)]
struct SyncState {
    user: Option<UserIdentity>,
    generation: u64,
    /// Generation of the fetch in flight.
    in_flight: Option<u64>,
    notifications: Vec<Notification>,
    retry_count: u32,
    /// The last fetch failed, whether or not that is surfaced yet.
    failing: bool,
    has_error: bool,
    last_error: Option<String>,
    /// An insert arrived since the debounce timer was last started.
    pending_insert: bool,
}

impl SyncState {
    fn is_loading(&self) -> bool {
        self.in_flight == Some(self.generation)
    }

    fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            unread_count: self.notifications.iter().filter(|n| n.is_unread()).count(),
            total_count: self.notifications.len(),
            notifications: self.notifications.clone(),
            is_loading: self.is_loading(),
            has_error: self.has_error,
            last_error: self.last_error.clone(),
        }
    }
}

/// Clears the in-flight marker if the fetch future is dropped early.
struct InFlightGuard<'a> {
    inner: &'a SyncInner,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if state.in_flight == Some(self.generation) {
            state.in_flight = None;
        }
    }
}

impl NotificationSync {
    /// Create an idle synchroniser with no user.
    pub fn new(
        source: Arc<dyn NotificationSource>,
        feed: Arc<dyn ChangeFeed>,
        config: &NotificationConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(SyncSnapshot::default());
        Self {
            inner: Arc::new(SyncInner {
                source,
                feed,
                retry_delays: config.retry_delays(),
                max_retries: config.max_retries,
                state: Mutex::new(SyncState::default()),
                snapshot_tx,
                debouncer: Debouncer::new(config.debounce()),
                retry_timer: Mutex::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Begin syncing for `user`; `None` leaves the state empty.
    pub async fn start(&self, user: Option<UserIdentity>) {
        self.set_user(user).await;
    }

    /// Switch to another user (or sign out with `None`).
    ///
    /// Cancels timers, drops the old subscription, clears the list, then
    /// subscribes and fetches for the new user.
    pub async fn set_user(&self, user: Option<UserIdentity>) {
        self.inner.set_user(user).await;
    }

    /// Fetch the list now. A no-op while another fetch is in flight.
    pub async fn refresh_notifications(&self) {
        self.inner.refresh().await;
    }

    /// Hide the surfaced error and rearm the retry schedule. The list is
    /// left as it is.
    pub fn clear_error(&self) {
        let mut state = self.inner.lock();
        state.has_error = false;
        state.last_error = None;
        state.failing = false;
        state.retry_count = 0;
        self.inner.publish(&state);
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver that is notified whenever the published state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// The user being synced.
    pub fn current_user(&self) -> Option<UserIdentity> {
        self.inner.lock().user.clone()
    }

    /// Stop timers and the subscription. Late fetch results are ignored.
    pub fn shutdown(&self) {
        self.inner.teardown();
        let mut state = self.inner.lock();
        state.generation += 1;
        state.user = None;
        state.in_flight = None;
        self.inner.publish(&state);
    }
}

impl Drop for NotificationSync {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl SyncInner {
    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish `state`. Callers keep the state lock held until the send is
    /// done so concurrent publishers cannot overwrite a newer snapshot.
    fn publish(&self, state: &SyncState) {
        let snapshot = state.snapshot();
        self.snapshot_tx.send_if_modified(move |current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }

    async fn set_user(self: &Arc<Self>, user: Option<UserIdentity>) {
        self.teardown();
        let generation = {
            let mut state = self.lock();
            let generation = state.generation + 1;
            *state = SyncState {
                user: user.clone(),
                generation,
                ..SyncState::default()
            };
            self.publish(&state);
            generation
        };

        let Some(user) = user else {
            debug!("Notification sync idle, no user");
            return;
        };
        info!(user_id = %user.user_id, "Starting notification sync");

        match self.subscribe_changes(&user).await {
            Ok(subscription) => {
                if self.generation() != generation {
                    return;
                }
                let handle = self.spawn_listener(subscription);
                replace_task(&self.listener, Some(handle));
            }
            Err(e) => {
                warn!(
                    user_id = %user.user_id,
                    error = %e,
                    "Change feed unavailable, relying on pull refresh"
                );
            }
        }

        self.refresh().await;
    }

    async fn subscribe_changes(&self, user: &UserIdentity) -> AppResult<ChangeSubscription> {
        self.feed.subscribe(user.user_id).await
    }

    fn spawn_listener(self: &Arc<Self>, mut subscription: ChangeSubscription) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.on_change(event);
            }
            debug!(user_id = %subscription.user_id(), "Change subscription ended");
        })
    }

    fn on_change(self: &Arc<Self>, event: ChangeEvent) {
        {
            let mut state = self.lock();
            let Some(user) = state.user.as_ref() else {
                return;
            };
            if user.user_id != event.user_id {
                return;
            }
            state.pending_insert |= event.is_insert();
        }

        let weak = Arc::downgrade(self);
        self.debouncer.schedule(move || async move {
            if let Some(inner) = weak.upgrade() {
                inner.on_debounce_elapsed().await;
            }
        });
    }

    async fn on_debounce_elapsed(self: &Arc<Self>) {
        let target = {
            let mut state = self.lock();
            let insert = std::mem::take(&mut state.pending_insert);
            match state.user.as_ref() {
                Some(user) if !state.is_loading() && (!state.failing || insert) => {
                    Some(user.user_id)
                }
                Some(_) => {
                    debug!(
                        in_flight = state.is_loading(),
                        failing = state.failing,
                        "Skipping push-triggered refresh"
                    );
                    None
                }
                None => None,
            }
        };

        if let Some(user_id) = target {
            self.source.invalidate(user_id).await;
            self.refresh().await;
        }
    }

    async fn refresh(self: &Arc<Self>) {
        let (user_id, generation) = {
            let mut state = self.lock();
            let Some(user_id) = state.user.as_ref().map(|u| u.user_id) else {
                return;
            };
            if state.is_loading() {
                debug!(user_id = %user_id, "Refresh already in flight");
                return;
            }
            state.in_flight = Some(state.generation);
            self.publish(&state);
            (user_id, state.generation)
        };

        let guard = InFlightGuard {
            inner: self.as_ref(),
            generation,
        };
        let result = self.source.fetch_notifications(user_id).await;
        drop(guard);

        self.complete(generation, result);
    }

    fn complete(self: &Arc<Self>, generation: u64, result: AppResult<Vec<Notification>>) {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding notification fetch for a previous user");
            return;
        }

        match result {
            Ok(fetched) => {
                let fetched = dedup_by_id(fetched);
                if !same_contents(&state.notifications, &fetched) {
                    state.notifications = fetched;
                }
                state.retry_count = 0;
                state.failing = false;
                state.has_error = false;
                state.last_error = None;
                replace_task(&self.retry_timer, None);
            }
            Err(e) => {
                state.failing = true;
                if state.retry_count < self.max_retries {
                    let delay = self.retry_delay(state.retry_count);
                    state.retry_count += 1;
                    warn!(
                        attempt = state.retry_count,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Notification fetch failed, retry scheduled"
                    );
                    self.schedule_retry(delay, generation);
                } else {
                    warn!(error = %e, "Notification fetch failed, retries exhausted");
                    state.has_error = true;
                    state.last_error = Some(e.to_string());
                }
            }
        }
        self.publish(&state);
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let index = (attempt as usize).min(self.retry_delays.len().saturating_sub(1));
        self.retry_delays
            .get(index)
            .copied()
            .unwrap_or(FALLBACK_RETRY_DELAY)
    }

    fn schedule_retry(self: &Arc<Self>, delay: Duration, generation: u64) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.generation() == generation {
                // Detached so that cancelling the timer cannot cut the fetch short.
                tokio::spawn(async move { inner.refresh().await });
            }
        });
        replace_task(&self.retry_timer, Some(handle));
    }

    fn teardown(&self) {
        self.debouncer.cancel();
        replace_task(&self.retry_timer, None);
        replace_task(&self.listener, None);
    }
}

/// Store `next` in `slot`, aborting whatever task was there.
fn replace_task(slot: &Mutex<Option<JoinHandle<()>>>, next: Option<JoinHandle<()>>) {
    let previous = {
        let mut slot = slot.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *slot, next)
    };
    if let Some(previous) = previous {
        previous.abort();
    }
}
