//! Admin broadcast entities.

pub mod audience;
pub mod model;

pub use audience::{BroadcastPriority, TargetAudience};
pub use model::{Broadcast, BroadcastPatch, BroadcastView, NewBroadcast};
