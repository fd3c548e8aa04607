//! Change feed backed by Postgres `LISTEN notification_changes`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bookswap_core::result::AppResult;
use bookswap_database::DatabasePool;

use super::{ChangeEvent, ChangeFeed, ChangeSubscription, MemoryChangeFeed};

/// Channel the `notifications_change_feed` trigger notifies on.
pub const NOTIFICATION_CHANNEL: &str = "notification_changes";

/// Delay before polling again after a listener error.
const LISTENER_ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// Relays trigger notifications from one dedicated connection to
/// in-process per-user subscribers.
#[derive(Debug)]
pub struct PgChangeFeed {
    /// In-process fan-out.
    bus: Arc<MemoryChangeFeed>,
    /// Stops the listener task.
    cancel: CancellationToken,
    /// The listener task.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PgChangeFeed {
    /// Open the `LISTEN` connection and start relaying.
    pub async fn start(pool: &DatabasePool, buffer_size: usize) -> AppResult<Self> {
        let listener = pool.listener(NOTIFICATION_CHANNEL).await?;
        let bus = Arc::new(MemoryChangeFeed::new(buffer_size));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_listener(listener, Arc::clone(&bus), cancel.clone()));

        Ok(Self {
            bus,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    /// Stop relaying and wait for the listener task to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Change feed listener task ended abnormally");
            }
        }
    }
}

impl Drop for PgChangeFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self, user_id: Uuid) -> AppResult<ChangeSubscription> {
        self.bus.subscribe(user_id).await
    }
}

async fn run_listener(
    mut listener: PgListener,
    bus: Arc<MemoryChangeFeed>,
    cancel: CancellationToken,
) {
    info!(channel = NOTIFICATION_CHANNEL, "Change feed listener started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = listener.try_recv() => match received {
                Ok(Some(notification)) => {
                    forward_payload(&bus, notification.payload()).await;
                }
                Ok(None) => {
                    // Notifications sent while disconnected are lost.
                    warn!("Change feed connection lost, reconnecting");
                    bus.publish_resync().await;
                }
                Err(e) => {
                    error!(error = %e, "Change feed listener error");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(LISTENER_ERROR_BACKOFF) => {}
                    }
                }
            }
        }
    }

    info!(channel = NOTIFICATION_CHANNEL, "Change feed listener stopped");
}

/// Parse a trigger payload and hand it to the bus. Returns whether the
/// payload was valid.
async fn forward_payload(bus: &MemoryChangeFeed, payload: &str) -> bool {
    match ChangeEvent::from_payload(payload) {
        Ok(event) => {
            let delivered = bus.publish(event).await;
            debug!(delivered, "Change event relayed");
            true
        }
        Err(e) => {
            warn!(payload, error = %e, "Ignoring malformed change payload");
            false
        }
    }
}
