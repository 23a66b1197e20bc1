//! Time-expiring key/value store with a background sweep
//!
//! Provides `ExpiringCache`, a cloneable handle over one shared entry map. Each
//! entry records when it was added; a sweep task spawned at construction wakes
//! every `interval` and removes entries older than `interval`. Reads never check
//! age themselves, so an entry stays visible until the sweep after it expires,
//! which bounds worst-case staleness at roughly twice the interval.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Errors that can occur when constructing a cache
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The expiry interval was zero
    #[error("Cache interval must be greater than zero")]
    ZeroInterval,
}

/// A single cached value with its insertion time
#[derive(Debug)]
struct CacheEntry {
    /// When the entry was added
    created_at: Instant,
    /// The raw payload
    value: Vec<u8>,
}

type EntryMap = Mutex<HashMap<String, CacheEntry>>;

/// Keeps the sweep task alive for as long as any cache handle exists
#[derive(Debug)]
struct SweepHandle {
    shutdown_tx: mpsc::Sender<()>,
}

/// In-memory cache whose entries expire after a fixed interval
///
/// Cloning is cheap: every clone shares the same entries and the same sweep
/// task. The sweep stops when [`ExpiringCache::close`] is called or when the
/// last handle is dropped.
#[derive(Debug, Clone)]
pub struct ExpiringCache {
    entries: Arc<EntryMap>,
    interval: Duration,
    sweep: Arc<SweepHandle>,
}

impl ExpiringCache {
    /// Creates a new cache and starts its background sweep
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `interval` - How long an entry lives, and how often the sweep runs
    ///
    /// # Returns
    /// * `Ok(ExpiringCache)` with an empty entry map
    /// * `Err(CacheError::ZeroInterval)` if `interval` is zero
    pub fn new(interval: Duration) -> Result<Self, CacheError> {
        if interval.is_zero() {
            return Err(CacheError::ZeroInterval);
        }

        let entries = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        spawn_sweep(Arc::downgrade(&entries), interval, shutdown_rx);

        Ok(Self {
            entries,
            interval,
            sweep: Arc::new(SweepHandle { shutdown_tx }),
        })
    }

    /// Inserts or replaces the value stored under `key`, stamped with the current time
    pub fn add(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let entry = CacheEntry {
            created_at: Instant::now(),
            value: value.into(),
        };
        lock(&self.entries).insert(key.into(), entry);
    }

    /// Returns a copy of the value stored under `key`
    ///
    /// Returns `None` if the key was never added or has already been swept.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.entries).get(key).map(|entry| entry.value.clone())
    }

    /// Number of entries currently held, expired-but-unswept included
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether the cache currently holds no entries
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// The expiry interval fixed at construction
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the background sweep
    ///
    /// Entries already stored stay readable but will no longer expire.
    /// Calling this more than once has no further effect.
    pub fn close(&self) {
        let _ = self.sweep.shutdown_tx.try_send(());
    }
}

/// Acquires the entry map, recovering from a poisoned lock
///
/// Every critical section is a single map operation, so a panic while the lock
/// was held cannot leave the map half-updated.
fn lock(entries: &EntryMap) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes every entry older than `interval` as of `now`, returning how many went
fn sweep_expired(entries: &EntryMap, interval: Duration, now: Instant) -> usize {
    let mut map = lock(entries);
    let before = map.len();
    map.retain(|_, entry| now.saturating_duration_since(entry.created_at) <= interval);
    before - map.len()
}

/// Spawns the sweep task for one cache instance
///
/// The task holds only a weak reference to the entries, and exits when a
/// shutdown is requested, when every sender is dropped, or when the entries
/// themselves are gone.
///
/// An interval too long to be expressed as a deadline on the clock can never
/// elapse, so no task is spawned and entries simply never expire.
fn spawn_sweep(entries: Weak<EntryMap>, interval: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
    let Some(start) = Instant::now().checked_add(interval) else {
        debug!(?interval, "cache interval exceeds the clock range, sweep disabled");
        return;
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(entries) = entries.upgrade() else {
                        break;
                    };
                    let removed = sweep_expired(&entries, interval, Instant::now());
                    if removed > 0 {
                        debug!(removed, "swept expired cache entries");
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        debug!("cache sweep stopped");
    });
}
