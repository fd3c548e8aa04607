//! Notification change events and the feeds that deliver them.

pub mod event;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use bookswap_core::result::AppResult;

pub use event::{ChangeEvent, ChangeKind};
pub use memory::MemoryChangeFeed;
pub use postgres::PgChangeFeed;

/// Source of change events for a user's notification rows.
#[async_trait]
pub trait ChangeFeed: Send + Sync + std::fmt::Debug + 'static {
    /// Subscribe to events for one user's rows.
    async fn subscribe(&self, user_id: Uuid) -> AppResult<ChangeSubscription>;
}

/// A live subscription to one user's change events.
#[derive(Debug)]
pub struct ChangeSubscription {
    /// The user whose rows are watched.
    user_id: Uuid,
    /// Receiving end of the user's channel.
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    pub(crate) fn new(user_id: Uuid, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { user_id, receiver }
    }

    /// The user whose rows are watched.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Next event, or `None` once the feed is gone.
    ///
    /// If the subscriber fell behind and events were dropped, a synthetic
    /// update event is returned so the caller resynchronises.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.user_id == self.user_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(user_id = %self.user_id, skipped, "Change subscription lagged");
                    return Some(ChangeEvent::resync(self.user_id));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
