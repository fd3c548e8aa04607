//! Small persistent key/value store for client-local flags and lists.

use async_trait::async_trait;

use crate::result::AppResult;

/// Persistent string key/value storage local to this process or device.
///
/// Used for state that has no server-side home: the broadcast IDs a guest
/// has dismissed and the "broadcasts disabled" flag.
#[async_trait]
pub trait LocalStore: Send + Sync + std::fmt::Debug + 'static {
    /// Read a value.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> AppResult<()>;
}
