//! Durable chart cache.
//!
//! The store maps `YYYY-MM-DD` keys to chart entries and is:
//! - loaded whole into a [`ChartCache`] snapshot at startup
//! - only rewritten by a backfill, whole, via read-modify-write
//! - never deleted from here

mod layer;
mod storage;

pub use layer::ChartCache;
pub use storage::{CacheStorage, JsonFileStorage, MemoryStorage};

#[cfg(test)]
pub(crate) use storage::ChartMap;
