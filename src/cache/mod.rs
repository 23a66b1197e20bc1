//! In-memory response cache with time-based expiry
//!
//! This module provides an `ExpiringCache` that keeps raw response bodies keyed
//! by request URL. Every entry is stamped when it is added and removed by a
//! background sweep once it is older than the cache's interval. Nothing is
//! persisted: the cache lives and dies with the process.

mod expiring;

pub use expiring::{CacheError, ExpiringCache};
