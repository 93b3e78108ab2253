use crate::cache::cache::{ComputeFn, KeyType, Op, Record, Storage};
use crate::cache::error::{CacheError, Result};
use crate::cache::eviction_policy::EvictionPolicy;
use crate::memory_store::parallelism;
use crate::server::timer::Timer;

use lru::LruCache;
use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const DEFAULT_MEMORY_LIMIT: u64 = 64 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct LruStoreConfig {
    pub memory_limit: u64,
    pub max_items: Option<u64>,
    pub policy: EvictionPolicy,
    pub segments: Option<usize>,
}

impl Default for LruStoreConfig {
    fn default() -> Self {
        LruStoreConfig {
            memory_limit: DEFAULT_MEMORY_LIMIT,
            max_items: None,
            policy: EvictionPolicy::LeastRecentlyUsed,
            segments: None,
        }
    }
}

struct Entry {
    record: Record,
    last_access: u64,
}

/// Independently locked part of the keyspace, entries kept
/// in recency order (least recently used at the back).
struct Segment {
    entries: LruCache<KeyType, Entry>,
    bytes: u64,
}

impl Segment {
    fn new() -> Segment {
        Segment {
            entries: LruCache::unbounded(),
            bytes: 0,
        }
    }

    // Oldest entry that can be evicted, blocked entries and
    // the record being published are never candidates.
    fn eviction_candidate(&self, now: u32, published: &KeyType) -> Option<(&KeyType, u64)> {
        self.entries
            .iter()
            .rev()
            .find(|(key, entry)| {
                *key != published && state(&entry.record, now) != RecordState::Blocked
            })
            .map(|(key, entry)| (key, entry.last_access))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum RecordState {
    Live,
    Blocked,
    Dead,
}

fn state(record: &Record, now: u32) -> RecordState {
    if record.is_expired(now) || record.is_block_elapsed(now) {
        RecordState::Dead
    } else if record.is_blocked(now) {
        RecordState::Blocked
    } else {
        RecordState::Live
    }
}

enum Eviction {
    Evicted,
    Retry,
    Exhausted,
}

pub struct LruMemoryStore {
    segments: Box<[Mutex<Segment>]>,
    hash_builder: RandomState,
    timer: Arc<dyn Timer + Send + Sync>,
    memory_limit: u64,
    max_items: Option<u64>,
    policy: EvictionPolicy,
    clock: AtomicU64,
    current_bytes: AtomicU64,
    current_items: AtomicU64,
    evictions: AtomicU64,
    reclaimed: AtomicU64,
}

impl LruMemoryStore {
    pub fn new(timer: Arc<dyn Timer + Send + Sync>, config: LruStoreConfig) -> LruMemoryStore {
        let segments = parallelism::segment_count(config.segments);
        info!("Number of segments: {}", segments);
        LruMemoryStore {
            segments: (0..segments).map(|_| Mutex::new(Segment::new())).collect(),
            hash_builder: RandomState::new(),
            timer,
            memory_limit: config.memory_limit,
            max_items: config.max_items,
            policy: config.policy,
            clock: AtomicU64::new(1),
            current_bytes: AtomicU64::new(0),
            current_items: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
        }
    }

    pub fn segments(&self) -> usize {
        self.segments.len()
    }

    fn segment_for(&self, key: &KeyType) -> &Mutex<Segment> {
        let hash = self.hash_builder.hash_one(key) as usize;
        &self.segments[hash & (self.segments.len() - 1)]
    }

    // Must be called with the segment lock held, so ticks within
    // a segment grow from the least to the most recently used entry.
    fn next_tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn lookup<'a>(
        &self,
        segment: &'a mut Segment,
        key: &KeyType,
        now: u32,
        promote: bool,
    ) -> Option<&'a mut Entry> {
        let record_state = segment
            .entries
            .peek(key)
            .map(|entry| state(&entry.record, now))?;
        match record_state {
            RecordState::Live if promote => {
                let tick = self.next_tick();
                let entry = segment.entries.get_mut(key)?;
                entry.last_access = tick;
                Some(entry)
            }
            RecordState::Live => segment.entries.peek_mut(key),
            RecordState::Blocked => None,
            RecordState::Dead => {
                trace!("Reclaiming expired key: {:?}", key);
                self.unlink(segment, key);
                self.reclaimed.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn publish(&self, segment: &mut Segment, record: Record) -> Result<()> {
        let new_len = record.len() as u64;
        if new_len > self.memory_limit {
            debug!(
                "Record of {} bytes exceeds memory limit of {} bytes",
                new_len, self.memory_limit
            );
            return Err(CacheError::ValueTooLarge);
        }
        let old_len = segment
            .entries
            .peek(&record.key)
            .map(|entry| entry.record.len() as u64);
        self.account(old_len, new_len)?;

        segment.bytes = segment.bytes + new_len - old_len.unwrap_or(0);
        let tick = self.next_tick();
        let key = record.key.clone();
        segment.entries.put(
            key,
            Entry {
                record,
                last_access: tick,
            },
        );
        Ok(())
    }

    // Updates global counters for a record of old_len replaced by new_len bytes,
    // with eviction disabled the limits are enforced here.
    fn account(&self, old_len: Option<u64>, new_len: u64) -> Result<()> {
        let previous = old_len.unwrap_or(0);
        let growth = new_len.saturating_sub(previous);
        let shrink = previous.saturating_sub(new_len);
        let new_item = old_len.is_none();

        if self.policy == EvictionPolicy::None {
            self.current_bytes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bytes| {
                    let next = bytes + growth;
                    (next <= self.memory_limit).then_some(next)
                })
                .map_err(|_| CacheError::OutOfMemory)?;
            if new_item {
                let max_items = self.max_items.unwrap_or(u64::MAX);
                let reserved =
                    self.current_items
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |items| {
                            (items < max_items).then_some(items + 1)
                        });
                if reserved.is_err() {
                    self.current_bytes.fetch_sub(growth, Ordering::SeqCst);
                    return Err(CacheError::OutOfMemory);
                }
            }
        } else {
            self.current_bytes.fetch_add(growth, Ordering::SeqCst);
            if new_item {
                self.current_items.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.current_bytes.fetch_sub(shrink, Ordering::SeqCst);
        Ok(())
    }

    fn unlink(&self, segment: &mut Segment, key: &KeyType) -> Option<Record> {
        let entry = segment.entries.pop(key)?;
        let len = entry.record.len() as u64;
        debug_assert!(segment.bytes >= len, "segment byte count out of sync");
        segment.bytes -= len;
        self.current_bytes.fetch_sub(len, Ordering::SeqCst);
        self.current_items.fetch_sub(1, Ordering::SeqCst);
        Some(entry.record)
    }

    fn over_budget(&self) -> bool {
        if self.current_bytes.load(Ordering::SeqCst) > self.memory_limit {
            return true;
        }
        match self.max_items {
            Some(max_items) => self.current_items.load(Ordering::SeqCst) > max_items,
            None => false,
        }
    }

    // Evicts until the store is within its limits again. If only the just
    // published record is left to evict, it is removed and the write fails.
    fn evict_if_needed(&self, published: &KeyType) -> Result<()> {
        if self.policy != EvictionPolicy::LeastRecentlyUsed {
            return Ok(());
        }
        let max_retries = self.segments.len() * 2;
        let mut retries = 0;
        let mut exhausted = 0;
        while self.over_budget() {
            match self.evict_one(published) {
                Eviction::Evicted => {
                    retries = 0;
                    exhausted = 0;
                }
                Eviction::Retry => {
                    retries += 1;
                    if retries > max_retries {
                        debug!("Eviction contended for {} retries", retries);
                        retries = 0;
                        std::thread::yield_now();
                    }
                }
                // concurrent writers may have drained the store between scans
                Eviction::Exhausted => {
                    exhausted += 1;
                    if exhausted > max_retries {
                        return self.reject_published(published);
                    }
                    std::thread::yield_now();
                }
            }
        }
        Ok(())
    }

    fn reject_published(&self, published: &KeyType) -> Result<()> {
        let mut segment = self.segment_for(published).lock();
        if !self.over_budget() {
            return Ok(());
        }
        debug!("Nothing left to evict, dropping key: {:?}", published);
        self.unlink(&mut segment, published);
        Err(CacheError::OutOfMemory)
    }

    // Locks one segment at a time to find the oldest evictable entry,
    // then removes it if it didn't change in the meantime.
    fn evict_one(&self, published: &KeyType) -> Eviction {
        let now = self.timer.timestamp();
        let mut oldest: Option<(usize, u64)> = None;
        for (index, segment) in self.segments.iter().enumerate() {
            let segment = segment.lock();
            if let Some((_key, last_access)) = segment.eviction_candidate(now, published) {
                if oldest.map_or(true, |(_, oldest_access)| last_access < oldest_access) {
                    oldest = Some((index, last_access));
                }
            }
        }

        let Some((index, last_access)) = oldest else {
            return Eviction::Exhausted;
        };

        let mut segment = self.segments[index].lock();
        let key = match segment.eviction_candidate(now, published) {
            Some((key, access)) if access == last_access => key.clone(),
            _ => return Eviction::Retry,
        };
        if let Some(record) = self.unlink(&mut segment, &key) {
            if state(&record, now) == RecordState::Dead {
                self.reclaimed.fetch_add(1, Ordering::Relaxed);
            } else {
                trace!("Evicted key: {:?}", key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        Eviction::Evicted
    }

    #[cfg(test)]
    fn segment_totals(&self) -> (u64, u64) {
        self.segments.iter().fold((0, 0), |(bytes, items), segment| {
            let segment = segment.lock();
            let segment_bytes: u64 = segment
                .entries
                .iter()
                .map(|(_key, entry)| entry.record.len() as u64)
                .sum();
            assert_eq!(segment_bytes, segment.bytes);
            (bytes + segment.bytes, items + segment.entries.len() as u64)
        })
    }
}

impl Storage for LruMemoryStore {
    fn get(&self, key: &KeyType) -> Option<Record> {
        let now = self.timer.timestamp();
        let mut segment = self.segment_for(key).lock();
        self.lookup(&mut segment, key, now, true)
            .map(|entry| entry.record.clone())
    }

    fn put(&self, record: Record) -> Result<()> {
        let key = record.key.clone();
        {
            let mut segment = self.segment_for(&key).lock();
            self.publish(&mut segment, record)?;
        }
        self.evict_if_needed(&key)
    }

    fn remove(&self, key: &KeyType) -> Option<Record> {
        let mut segment = self.segment_for(key).lock();
        self.unlink(&mut segment, key)
    }

    fn compute(&self, key: &KeyType, f: &mut ComputeFn<'_>) -> Result<()> {
        let now = self.timer.timestamp();
        let published = {
            let mut segment = self.segment_for(key).lock();
            let op = {
                let current = self
                    .lookup(&mut segment, key, now, false)
                    .map(|entry| &entry.record);
                f(current)
            };
            match op {
                Op::Nop => false,
                Op::Put(record) => {
                    debug_assert_eq!(&record.key, key, "compute must not change the key");
                    self.publish(&mut segment, record)?;
                    true
                }
                Op::Remove => {
                    self.unlink(&mut segment, key);
                    false
                }
            }
        };
        if published {
            self.evict_if_needed(key)?;
        }
        Ok(())
    }

    fn clear(&self) {
        for segment in self.segments.iter() {
            let mut segment = segment.lock();
            let items = segment.entries.len() as u64;
            self.current_bytes.fetch_sub(segment.bytes, Ordering::SeqCst);
            self.current_items.fetch_sub(items, Ordering::SeqCst);
            segment.entries.clear();
            segment.bytes = 0;
        }
    }

    fn expire_all(&self, deadline: u32) {
        for segment in self.segments.iter() {
            let mut segment = segment.lock();
            for (_key, entry) in segment.entries.iter_mut() {
                let expiration = entry.record.header.expiration;
                if expiration == 0 || expiration > deadline {
                    entry.record.header.expiration = deadline;
                }
            }
        }
    }

    fn remove_expired(&self) -> usize {
        let now = self.timer.timestamp();
        let mut removed = 0;
        for segment in self.segments.iter() {
            let mut segment = segment.lock();
            let dead: Vec<KeyType> = segment
                .entries
                .iter()
                .filter(|(_key, entry)| state(&entry.record, now) == RecordState::Dead)
                .map(|(key, _entry)| key.clone())
                .collect();
            for key in dead {
                if self.unlink(&mut segment, &key).is_some() {
                    removed += 1;
                }
            }
        }
        self.reclaimed.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    fn current_bytes(&self) -> u64 {
        self.current_bytes.load(Ordering::SeqCst)
    }

    fn current_items(&self) -> u64 {
        self.current_items.load(Ordering::SeqCst)
    }

    fn max_bytes(&self) -> u64 {
        self.memory_limit
    }

    fn max_items(&self) -> Option<u64> {
        self.max_items
    }

    fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    fn reclaimed(&self) -> u64 {
        self.reclaimed.load(Ordering::Relaxed)
    }

    fn reset_stats(&self) {
        self.evictions.store(0, Ordering::Relaxed);
        self.reclaimed.store(0, Ordering::Relaxed);
    }
}
