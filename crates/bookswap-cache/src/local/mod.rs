//! Local persistent key/value stores.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileLocalStore;
pub use memory_store::MemoryLocalStore;
