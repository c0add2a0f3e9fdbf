//! Reuse pools for the per-request wrappers.
//!
//! Every server owns one [`Pools`] set: five independent [`Pool`]s, one per
//! wrapper type. A pool hands out a boxed instance, either recycled or freshly
//! built with `T::default()`, and takes it back when the request is done.
//! Pools are unbounded and lazily populated; [`Pool::shrink`] drops idle
//! entries.
//!
//! Release takes the box by value, so an instance can never be returned while
//! something else still holds it.

use super::{Header, Request, Response, ResponseAdapter, Url};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one pool
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Instances built because the pool was empty
    created: AtomicU64,
    /// Successful acquisitions (fresh or reused)
    acquired: AtomicU64,
    /// Instances handed back
    released: AtomicU64,
}

impl PoolStats {
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Acquisitions not yet matched by a release
    pub fn in_use(&self) -> u64 {
        self.acquired().saturating_sub(self.released())
    }

    /// Fraction of acquisitions served from the pool
    pub fn reuse_rate(&self) -> f64 {
        let acquired = self.acquired();
        if acquired == 0 {
            return 0.0;
        }
        acquired.saturating_sub(self.created()) as f64 / acquired as f64
    }
}

/// An unbounded reuse pool of boxed `T`.
pub struct Pool<T> {
    free: Mutex<Vec<Box<T>>>,
    stats: PoolStats,
}

impl<T: Default> Pool<T> {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            stats: PoolStats::default(),
        }
    }

    /// Take an instance out of the pool, building one if none is idle.
    ///
    /// The instance may carry whatever a previous user left in it; callers
    /// rebind it before exposing it.
    pub fn acquire(&self) -> Box<T> {
        self.stats.acquired.fetch_add(1, Ordering::Relaxed);
        if let Some(item) = self.free.lock().pop() {
            return item;
        }
        self.stats.created.fetch_add(1, Ordering::Relaxed);
        Box::default()
    }

    /// Return an instance for reuse.
    pub fn release(&self, item: Box<T>) {
        self.stats.released.fetch_add(1, Ordering::Relaxed);
        self.free.lock().push(item);
    }

    /// Number of idle instances
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Drop every idle instance.
    pub fn shrink(&self) {
        let drained = std::mem::take(&mut *self.free.lock());
        drop(drained);
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.free.lock().len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// The five pools a server draws its per-request wrappers from.
#[derive(Debug, Default)]
pub struct Pools {
    pub request: Pool<Request>,
    pub response: Pool<Response>,
    pub response_adapter: Pool<ResponseAdapter>,
    pub header: Pool<Header>,
    pub url: Pool<Url>,
}

impl Pools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding acquisitions across all five pools
    pub fn in_use(&self) -> u64 {
        self.request.stats().in_use()
            + self.response.stats().in_use()
            + self.response_adapter.stats().in_use()
            + self.header.stats().in_use()
            + self.url.stats().in_use()
    }

    /// Drop idle instances in all five pools.
    pub fn shrink(&self) {
        self.request.shrink();
        self.response.shrink();
        self.response_adapter.shrink();
        self.header.shrink();
        self.url.shrink();
    }
}
