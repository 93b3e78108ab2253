//! Counters maintained by the engine to answer memcached `stats` queries.
//!
//! Counters are monotonic for the lifetime of the engine and are only
//! zeroed by an explicit [`CacheStats::reset`].

use crate::cache::error::{CacheError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! counters {
    ($($name:ident),* $(,)?) => {
        #[derive(Debug, Default)]
        pub struct CacheStats {
            $(pub(crate) $name: AtomicU64,)*
        }

        /// Point in time copy of engine and storage counters
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct StatsSnapshot {
            $(pub $name: u64,)*
            pub curr_items: u64,
            pub bytes: u64,
            pub limit_maxbytes: u64,
            pub evictions: u64,
            pub reclaimed: u64,
            pub uptime: u32,
            pub time: u32,
            pub version: &'static str,
        }

        impl CacheStats {
            pub fn reset(&self) {
                $(self.$name.store(0, Ordering::Relaxed);)*
            }

            /// Copies counters into a snapshot, storage related
            /// fields are left for the caller to fill in.
            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($name: self.$name.load(Ordering::Relaxed),)*
                    ..StatsSnapshot::default()
                }
            }
        }
    };
}

counters!(
    cmd_get,
    get_hits,
    get_misses,
    cmd_set,
    set_stored,
    set_not_stored,
    set_exists,
    cmd_touch,
    touch_hits,
    touch_misses,
    delete_hits,
    delete_misses,
    incr_hits,
    incr_misses,
    decr_hits,
    decr_misses,
    cas_hits,
    cas_misses,
    cas_badval,
    cmd_flush,
    total_items,
);

#[inline]
fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CacheStats {
    pub fn new() -> CacheStats {
        CacheStats::default()
    }

    pub fn record_get<T>(&self, result: &Result<T>) {
        incr(&self.cmd_get);
        match result {
            Ok(_) => incr(&self.get_hits),
            Err(_) => incr(&self.get_misses),
        }
    }

    pub fn record_store<T>(&self, result: &Result<T>) {
        incr(&self.cmd_set);
        match result {
            Ok(_) => {
                incr(&self.set_stored);
                incr(&self.total_items);
            }
            Err(CacheError::KeyExists) => incr(&self.set_exists),
            Err(_) => incr(&self.set_not_stored),
        }
    }

    pub fn record_cas<T>(&self, result: &Result<T>) {
        match result {
            Ok(_) => incr(&self.cas_hits),
            Err(CacheError::KeyExists) => incr(&self.cas_badval),
            Err(CacheError::NotFound) => incr(&self.cas_misses),
            Err(_) => {}
        }
        self.record_store(result);
    }

    pub fn record_touch<T>(&self, result: &Result<T>) {
        incr(&self.cmd_touch);
        match result {
            Ok(_) => incr(&self.touch_hits),
            Err(_) => incr(&self.touch_misses),
        }
    }

    pub fn record_delete<T>(&self, result: &Result<T>) {
        match result {
            Ok(_) => incr(&self.delete_hits),
            Err(_) => incr(&self.delete_misses),
        }
    }

    /// A counter created from its initial value is a miss
    pub fn record_delta(&self, increment: bool, hit: bool) {
        match (increment, hit) {
            (true, true) => incr(&self.incr_hits),
            (true, false) => incr(&self.incr_misses),
            (false, true) => incr(&self.decr_hits),
            (false, false) => incr(&self.decr_misses),
        }
    }

    pub fn record_flush(&self) {
        incr(&self.cmd_flush);
    }
}

impl StatsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.get_hits + self.get_misses;
        if total == 0 {
            0.0
        } else {
            self.get_hits as f64 / total as f64
        }
    }
}
