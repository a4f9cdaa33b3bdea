//! Entry cache.
//!
//! Cache-aside storage sitting between [`crate::application::entries`] and
//! the storage backend. Lookups never fall through on their own; the facade
//! decides when to read the backend and refill.
//!
//! ```toml
//! [cache]
//! capacity = 200
//! ttl_seconds = 3600
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::{IdKey, SlugKey};
pub use store::EntryCache;

pub(crate) mod metric_names {
    pub(crate) use super::lock::METRIC_LOCK_POISONED;
    pub(crate) use super::store::{METRIC_EVICT, METRIC_EXPIRE, METRIC_HIT, METRIC_MISS};
}
