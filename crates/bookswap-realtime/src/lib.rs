//! # bookswap-realtime
//!
//! Keeps a user's in-memory notification list in step with the database.
//!
//! - **Change feed**: row-level `INSERT`/`UPDATE`/`DELETE` events on the
//!   `notifications` table, fanned out per user.
//! - **Synchroniser**: pull refresh with deduplication, re-entrancy guard,
//!   scheduled retries and a debounced push path.

pub mod feed;
pub mod sync;

pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription, MemoryChangeFeed, PgChangeFeed};
pub use sync::{NotificationSource, NotificationSync, SyncSnapshot};
