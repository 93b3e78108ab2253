use crate::cache::cache::{
    CacheMetaData as CacheMeta, DecrementParam, DeltaParam, DeltaResult, IncrementParam,
    KeyType as CacheKeyType, Op, Record as CacheRecord, SetStatus as CacheSetStatus, Storage,
    DELTA_NO_INITIAL_VALUE,
};
use crate::cache::error::{CacheError, Result};
use crate::memcache::shared_store_state::SharedStoreState;
use crate::memcache::stats::{CacheStats, StatsSnapshot};
use crate::server::timer::Timer;
use crate::version;
use bytes::{Bytes, BytesMut};
use std::sync::Arc;

pub type Record = CacheRecord;
pub type Meta = CacheMeta;
pub type SetStatus = CacheSetStatus;
pub type KeyType = CacheKeyType;

/**
 * Implements Memcache commands based
 * on Key Value Store
 */
pub struct MemcStore {
    store: Arc<dyn Storage + Send + Sync>,
    state: SharedStoreState,
    stats: CacheStats,
    started: u32,
}

impl MemcStore {
    pub fn new(
        store: Arc<dyn Storage + Send + Sync>,
        timer: Arc<dyn Timer + Send + Sync>,
    ) -> MemcStore {
        let started = timer.timestamp();
        MemcStore {
            store,
            state: SharedStoreState::new(timer),
            stats: CacheStats::new(),
            started,
        }
    }

    pub fn get(&self, key: &KeyType) -> Result<Record> {
        let result = self.store.get(key).ok_or(CacheError::NotFound);
        self.stats.record_get(&result);
        result
    }

    /// Looks up every key, a miss is reported per key
    pub fn get_multi(&self, keys: &[KeyType]) -> Vec<Result<Record>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    pub fn set(&self, record: Record) -> Result<SetStatus> {
        let key = record.key.clone();
        let mut result = Err(CacheError::ItemNotStored);
        let computed = self
            .store
            .compute(&key, &mut |_current: Option<&Record>| -> Op {
                let mut new_record = record.clone();
                let cas = self.state.set_cas_ttl(&mut new_record);
                result = Ok(SetStatus { cas });
                Op::Put(new_record)
            });
        let result = computed.and(result);
        self.stats.record_store(&result);
        result
    }

    pub fn add(&self, record: Record) -> Result<SetStatus> {
        let key = record.key.clone();
        let mut result = Err(CacheError::KeyExists);
        let computed = self
            .store
            .compute(&key, &mut |current: Option<&Record>| -> Op {
                if current.is_some() {
                    return Op::Nop;
                }
                let mut new_record = record.clone();
                let cas = self.state.set_cas_ttl(&mut new_record);
                result = Ok(SetStatus { cas });
                Op::Put(new_record)
            });
        let result = computed.and(result);
        self.stats.record_store(&result);
        result
    }

    pub fn replace(&self, record: Record) -> Result<SetStatus> {
        let key = record.key.clone();
        let mut result = Err(CacheError::ItemNotStored);
        let computed = self
            .store
            .compute(&key, &mut |current: Option<&Record>| -> Op {
                if current.is_none() {
                    return Op::Nop;
                }
                let mut new_record = record.clone();
                let cas = self.state.set_cas_ttl(&mut new_record);
                result = Ok(SetStatus { cas });
                Op::Put(new_record)
            });
        let result = computed.and(result);
        self.stats.record_store(&result);
        result
    }

    /// Stores the record only if the element wasn't modified since
    /// it was fetched with `expected_cas`
    pub fn cas_set(&self, record: Record, expected_cas: u64) -> Result<SetStatus> {
        let key = record.key.clone();
        let mut result = Err(CacheError::NotFound);
        let computed = self
            .store
            .compute(&key, &mut |current: Option<&Record>| -> Op {
                match current {
                    None => Op::Nop,
                    Some(current) if current.header.cas != expected_cas => {
                        result = Err(CacheError::KeyExists);
                        Op::Nop
                    }
                    Some(_) => {
                        let mut new_record = record.clone();
                        let cas = self.state.set_cas_ttl(&mut new_record);
                        result = Ok(SetStatus { cas });
                        Op::Put(new_record)
                    }
                }
            });
        let result = computed.and(result);
        self.stats.record_cas(&result);
        result
    }

    pub fn append(&self, new_record: Record) -> Result<SetStatus> {
        self.append_prepend_common(new_record, true)
    }

    pub fn prepend(&self, new_record: Record) -> Result<SetStatus> {
        self.append_prepend_common(new_record, false)
    }

    fn append_prepend_common(&self, new_record: Record, is_append: bool) -> Result<SetStatus> {
        let key = new_record.key.clone();
        let expected_cas = new_record.header.cas;
        let mut result = Err(CacheError::ItemNotStored);
        let computed = self
            .store
            .compute(&key, &mut |current: Option<&Record>| -> Op {
                let Some(prev_record) = current else {
                    return Op::Nop;
                };
                if SharedStoreState::cas_mismatch(expected_cas, prev_record.header.cas) {
                    result = Err(CacheError::KeyExists);
                    return Op::Nop;
                }
                let mut new_value =
                    BytesMut::with_capacity(prev_record.value.len() + new_record.value.len());
                if is_append {
                    new_value.extend_from_slice(&prev_record.value);
                    new_value.extend_from_slice(&new_record.value);
                } else {
                    new_value.extend_from_slice(&new_record.value);
                    new_value.extend_from_slice(&prev_record.value);
                }
                let mut record = prev_record.clone();
                record.value = new_value.freeze();
                record.header.cas = self.state.get_cas_id();
                result = Ok(SetStatus {
                    cas: record.header.cas,
                });
                Op::Put(record)
            });
        let result = computed.and(result);
        self.stats.record_store(&result);
        result
    }

    pub fn increment(
        &self,
        header: Meta,
        key: KeyType,
        increment: IncrementParam,
    ) -> Result<DeltaResult> {
        self.add_delta(header, key, increment, true)
    }

    pub fn decrement(
        &self,
        header: Meta,
        key: KeyType,
        decrement: DecrementParam,
    ) -> Result<DeltaResult> {
        self.add_delta(header, key, decrement, false)
    }

    /// Applies delta to a counter stored as decimal text.
    ///
    /// - `header.cas` if not 0 has to match stored cas
    /// - missing counter is created with `delta.value`, `header.flags` and
    ///   `header.expiration`, unless expiration is `DELTA_NO_INITIAL_VALUE`
    /// - expiration and flags of an existing counter are never changed
    pub fn add_delta(
        &self,
        header: Meta,
        key: KeyType,
        delta: DeltaParam,
        increment: bool,
    ) -> Result<DeltaResult> {
        let mut result = Err(CacheError::NotFound);
        let computed = self
            .store
            .compute(&key, &mut |current: Option<&Record>| -> Op {
                match current {
                    Some(record) => {
                        if SharedStoreState::cas_mismatch(header.cas, record.header.cas) {
                            result = Err(CacheError::KeyExists);
                            return Op::Nop;
                        }
                        match SharedStoreState::incr_decr_common(record, &delta, increment) {
                            Ok(value) => {
                                let mut record = record.clone();
                                record.value = Bytes::from(value.to_string());
                                record.header.cas = self.state.get_cas_id();
                                result = Ok(DeltaResult {
                                    cas: record.header.cas,
                                    value,
                                    defaulted: false,
                                });
                                Op::Put(record)
                            }
                            Err(err) => {
                                result = Err(err);
                                Op::Nop
                            }
                        }
                    }
                    None if header.expiration == DELTA_NO_INITIAL_VALUE => Op::Nop,
                    None => {
                        let mut record = Record::new(
                            key.clone(),
                            Bytes::from(delta.value.to_string()),
                            0,
                            header.flags,
                            header.expiration,
                        );
                        let cas = self.state.set_cas_ttl(&mut record);
                        result = Ok(DeltaResult {
                            cas,
                            value: delta.value,
                            defaulted: true,
                        });
                        Op::Put(record)
                    }
                }
            });
        let result = computed.and(result);
        match &result {
            Ok(delta_result) => self.stats.record_delta(increment, !delta_result.defaulted),
            Err(CacheError::NotFound) => self.stats.record_delta(increment, false),
            Err(_) => {}
        }
        result
    }

    /// Removes an element.
    ///
    /// - if header.cas is not 0 it has to match stored cas, KeyExists otherwise
    /// - if header.expiration is set the element is blocked for that time
    ///   instead of being removed, it stays invisible to all commands
    pub fn delete(&self, key: KeyType, header: Meta) -> Result<Record> {
        let mut result = Err(CacheError::NotFound);
        let blocked_until = match header.expiration {
            0 => None,
            hold => Some(self.state.normalize_expiration(hold)),
        };
        let computed = self
            .store
            .compute(&key, &mut |current: Option<&Record>| -> Op {
                let Some(record) = current else {
                    return Op::Nop;
                };
                if SharedStoreState::cas_mismatch(header.cas, record.header.cas) {
                    result = Err(CacheError::KeyExists);
                    return Op::Nop;
                }
                result = Ok(record.clone());
                match blocked_until {
                    Some(until) => {
                        let mut blocked = record.clone();
                        blocked.header.blocked_until = Some(until);
                        Op::Put(blocked)
                    }
                    None => Op::Remove,
                }
            });
        let result = computed.and(result);
        self.stats.record_delete(&result);
        result
    }

    /// Updates expiration of an element without changing its value or cas
    pub fn touch(&self, key: KeyType, expiration: u32) -> Result<SetStatus> {
        let result = self.touch_record(&key, expiration).map(|record| SetStatus {
            cas: record.header.cas,
        });
        self.stats.record_touch(&result);
        result
    }

    /// Fetches an element and updates its expiration
    pub fn get_and_touch(&self, key: KeyType, expiration: u32) -> Result<Record> {
        let result = self.touch_record(&key, expiration);
        self.stats.record_touch(&result);
        self.stats.record_get(&result);
        result
    }

    fn touch_record(&self, key: &KeyType, expiration: u32) -> Result<Record> {
        let expiration = self.state.normalize_expiration(expiration);
        let mut result = Err(CacheError::NotFound);
        let computed = self
            .store
            .compute(key, &mut |current: Option<&Record>| -> Op {
                let Some(record) = current else {
                    return Op::Nop;
                };
                let mut record = record.clone();
                record.header.expiration = expiration;
                result = Ok(record.clone());
                Op::Put(record)
            });
        computed.and(result)
    }

    /// Removes all elements from a store
    ///
    /// - if header.expiration is 0 elements are removed immediately,
    /// - otherwise every element currently stored expires
    ///   once the expiration time passes
    pub fn flush(&self, header: Meta) {
        self.stats.record_flush();
        match header.expiration {
            0 => self.store.clear(),
            delay => self
                .store
                .expire_all(self.state.normalize_expiration(delay)),
        }
    }

    /// Physically removes expired elements, returns number of removed elements
    pub fn sweep(&self) -> usize {
        self.store.remove_expired()
    }

    pub fn current_items(&self) -> u64 {
        self.store.current_items()
    }

    pub fn current_bytes(&self) -> u64 {
        self.store.current_bytes()
    }

    pub fn max_bytes(&self) -> u64 {
        self.store.max_bytes()
    }

    pub fn stats(&self) -> StatsSnapshot {
        let now = self.state.timestamp();
        StatsSnapshot {
            curr_items: self.store.current_items(),
            bytes: self.store.current_bytes(),
            limit_maxbytes: self.store.max_bytes(),
            evictions: self.store.evictions(),
            reclaimed: self.store.reclaimed(),
            uptime: now.saturating_sub(self.started),
            time: now,
            version: version::MEMCORE_VERSION,
            ..self.stats.snapshot()
        }
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
        self.store.reset_stats();
    }
}

#[cfg(test)]
mod eviction_tests;
#[cfg(test)]
mod set_tests;
