//! Read-through cache abstraction used by the notification accessor.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// String-valued key/value cache with per-entry expiry.
///
/// Typed values travel as JSON through [`get_json`](Self::get_json) and
/// [`set_json`](Self::set_json). Cache failures are never fatal to callers;
/// they fall back to the backing store.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Value under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store `value` for at most `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Remove one key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Remove every key starting with the prefix of a `prefix*` pattern.
    /// Returns the number of removed entries.
    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Deserialize the JSON stored under `key`.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        self.get(key)
            .await?
            .map(|raw| serde_json::from_str(&raw).map_err(Into::into))
            .transpose()
    }

    /// Serialize `value` as JSON and store it for `ttl`.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json, ttl).await
    }
}
