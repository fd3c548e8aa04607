//! In-process change feed for single-node deployments and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use bookswap_core::result::AppResult;

use super::{ChangeEvent, ChangeFeed, ChangeSubscription};

/// Per-user broadcast channels.
#[derive(Debug)]
pub struct MemoryChangeFeed {
    /// User ID → broadcast sender
    channels: RwLock<HashMap<Uuid, broadcast::Sender<ChangeEvent>>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl MemoryChangeFeed {
    /// Create a new in-memory feed
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Deliver an event to the subscribers of its user. Returns how many
    /// subscribers received it.
    pub async fn publish(&self, event: ChangeEvent) -> usize {
        let channels = self.channels.read().await;
        match channels.get(&event.user_id) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Send a resync event to every user with subscribers.
    pub async fn publish_resync(&self) {
        let channels = self.channels.read().await;
        for (user_id, tx) in channels.iter() {
            let _ = tx.send(ChangeEvent::resync(*user_id));
        }
    }

    /// Drop channels nobody listens to any more.
    pub async fn prune(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn subscribe(&self, user_id: Uuid) -> AppResult<ChangeSubscription> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        Ok(ChangeSubscription::new(user_id, tx.subscribe()))
    }
}
