//! Client-side synchronisation of a user's notification list.

pub mod snapshot;
pub mod source;
pub mod synchronizer;

#[cfg(test)]
mod tests;

pub use snapshot::SyncSnapshot;
pub use source::NotificationSource;
pub use synchronizer::NotificationSync;
