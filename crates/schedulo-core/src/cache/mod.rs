//! Local cache of the last good assignment list.
//!
//! The list is seeded from here at start-up so the dashboard has content
//! before the first fetch completes, and rewritten after every successful
//! fetch.

pub mod manager;

pub use manager::{CacheManager, CachedData};
