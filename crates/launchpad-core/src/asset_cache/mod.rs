//! Offline asset cache.
//!
//! A cache-first interceptor for the launcher's own site. On install it
//! stores a fixed list of core assets into a named store; once active it
//! answers same-origin requests from the store and fills the store from the
//! network on a miss. Cross-origin requests pass straight through.
//!
//! Entries are immutable blobs, so two concurrent misses for one URL may
//! both fetch and both write; the last write wins.

pub mod error;
pub mod store;
pub mod worker;

pub use error::AssetCacheError;
pub use store::{AssetStore, CachedData, StoreStats};
pub use worker::{AssetCache, CacheLifecycle, DEFAULT_CACHE_NAME, DEFAULT_CORE_ASSETS};
