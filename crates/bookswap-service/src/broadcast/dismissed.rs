//! Guest-side record of viewed broadcasts, kept in the local store.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use bookswap_cache::keys::DISMISSED_BROADCASTS;
use bookswap_core::error::AppError;
use bookswap_core::traits::local_store::LocalStore;

/// The set of broadcast IDs dismissed on this device.
#[derive(Debug, Clone)]
pub struct DismissedBroadcasts {
    store: Arc<dyn LocalStore>,
}

impl DismissedBroadcasts {
    /// Wrap a local store.
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// All dismissed IDs. An unreadable entry counts as empty.
    pub async fn load(&self) -> Result<BTreeSet<Uuid>, AppError> {
        let Some(raw) = self.store.get(DISMISSED_BROADCASTS).await? else {
            return Ok(BTreeSet::new());
        };
        match serde_json::from_str::<BTreeSet<Uuid>>(&raw) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                warn!(error = %e, "Dismissed broadcast list is corrupt, starting empty");
                Ok(BTreeSet::new())
            }
        }
    }

    /// Add an ID. Returns `true` if it was not dismissed before.
    pub async fn insert(&self, broadcast_id: Uuid) -> Result<bool, AppError> {
        let mut ids = self.load().await?;
        if !ids.insert(broadcast_id) {
            return Ok(false);
        }
        let raw = serde_json::to_string(&ids)?;
        self.store.set(DISMISSED_BROADCASTS, &raw).await?;
        Ok(true)
    }

    /// Forget every dismissal.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.store.remove(DISMISSED_BROADCASTS).await
    }
}
