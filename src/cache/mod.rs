// Cache module for memoized API responses.
// One JSON file per store, whole-table persistence, lazy per-key expiry.

pub mod paths;
pub mod store;

pub use store::{ApiCache, CacheConfig, DEFAULT_LIFETIME};
