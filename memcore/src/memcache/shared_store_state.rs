use crate::cache::cache::{DeltaParam, Record, MAX_RELATIVE_EXPIRATION, NO_EXPIRATION};
use crate::cache::error::{CacheError, Result};
use crate::server::timer::Timer;
use std::sync::atomic::Ordering;
use std::sync::{atomic::AtomicU64, Arc};

/// State shared by all engine operations: the clock and the
/// process wide cas generator.
pub struct SharedStoreState {
    timer: Arc<dyn Timer + Send + Sync>,
    cas_id: AtomicU64,
}

impl SharedStoreState {
    pub fn new(timer: Arc<dyn Timer + Send + Sync>) -> SharedStoreState {
        SharedStoreState {
            timer,
            cas_id: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn cas_mismatch(expected_cas: u64, cas: u64) -> bool {
        expected_cas != 0 && cas != expected_cas
    }

    pub fn timestamp(&self) -> u32 {
        self.timer.timestamp()
    }

    pub fn get_cas_id(&self) -> u64 {
        self.cas_id.fetch_add(1, Ordering::AcqRel)
    }

    /// Turns expiration as sent by a client into an absolute unix timestamp.
    /// Values up to 30 days are seconds relative to now, bigger values are
    /// already absolute.
    pub fn normalize_expiration(&self, expiration: u32) -> u32 {
        match expiration {
            NO_EXPIRATION => NO_EXPIRATION,
            relative if relative <= MAX_RELATIVE_EXPIRATION => {
                self.timestamp().saturating_add(relative)
            }
            absolute => absolute,
        }
    }

    /// Stamps a record about to be stored with a fresh cas and
    /// absolute expiration time, returns the new cas.
    pub fn set_cas_ttl(&self, record: &mut Record) -> u64 {
        record.header.cas = self.get_cas_id();
        record.header.expiration = self.normalize_expiration(record.header.expiration);
        record.header.blocked_until = None;
        record.header.cas
    }

    /// Parses the record's value as a u64 and applies delta. Increment wraps
    /// around on overflow, decrement never goes below zero.
    pub fn incr_decr_common(record: &Record, delta: &DeltaParam, increment: bool) -> Result<u64> {
        let value = std::str::from_utf8(&record.value)
            .map_err(|_err| CacheError::ArithOnNonNumeric)?
            .parse::<u64>()
            .map_err(|_err| CacheError::ArithOnNonNumeric)?;
        if increment {
            Ok(value.wrapping_add(delta.delta))
        } else {
            Ok(value.saturating_sub(delta.delta))
        }
    }
}
