use super::error::Result;
use bytes::Bytes;

/// Cache key type
pub type KeyType = Bytes;

/// Cache value associated with a key
pub type ValueType = Bytes;

/// Expiration value meaning "never expires"
pub const NO_EXPIRATION: u32 = 0;

/// Expiration values up to 30 days are relative to the current time,
/// anything above is an absolute unix timestamp
pub const MAX_RELATIVE_EXPIRATION: u32 = 60 * 60 * 24 * 30;

/// Expiration passed with increment/decrement when the counter
/// must not be created if it doesn't exist
pub const DELTA_NO_INITIAL_VALUE: u32 = 0xffff_ffff;

/// Fixed per element cost used for memory accounting
pub const ELEMENT_OVERHEAD: usize = std::mem::size_of::<CacheMetaData>();

#[derive(Clone, Debug)]
pub struct DeltaParam {
    pub delta: u64,
    pub value: u64,
}

pub type IncrementParam = DeltaParam;
pub type DecrementParam = IncrementParam;

pub type DeltaResultValueType = u64;

#[derive(Debug)]
pub struct DeltaResult {
    pub cas: u64,
    pub value: DeltaResultValueType,
    /// counter didn't exist and was created with the initial value
    pub defaulted: bool,
}

/// Meta data stored with cache value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheMetaData {
    pub(crate) cas: u64,
    pub(crate) flags: u32,
    pub(crate) expiration: u32,
    pub(crate) blocked_until: Option<u32>,
}

impl CacheMetaData {
    pub fn new(cas: u64, flags: u32, expiration: u32) -> CacheMetaData {
        CacheMetaData {
            cas,
            flags,
            expiration,
            blocked_until: None,
        }
    }

    pub fn get_cas(&self) -> u64 {
        self.cas
    }

    pub fn get_flags(&self) -> u32 {
        self.flags
    }

    pub fn get_expiration(&self) -> u32 {
        self.expiration
    }

    pub fn get_blocked_until(&self) -> Option<u32> {
        self.blocked_until
    }

    pub const fn len(&self) -> usize {
        std::mem::size_of::<CacheMetaData>()
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key, value and meta data stored in cache
#[derive(Clone, Debug)]
pub struct Record {
    pub(crate) key: KeyType,
    pub(crate) header: CacheMetaData,
    pub(crate) value: ValueType,
}

impl Record {
    pub fn new(key: KeyType, value: ValueType, cas: u64, flags: u32, expiration: u32) -> Record {
        let header = CacheMetaData::new(cas, flags, expiration);
        Record { key, header, value }
    }

    pub fn key(&self) -> &KeyType {
        &self.key
    }

    pub fn value(&self) -> &ValueType {
        &self.value
    }

    pub fn header(&self) -> &CacheMetaData {
        &self.header
    }

    /// Size of the element used for memory accounting
    pub fn len(&self) -> usize {
        self.key.len() + self.value.len() + self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_expired(&self, now: u32) -> bool {
        self.header.expiration != NO_EXPIRATION && self.header.expiration <= now
    }

    /// Element was deleted with a hold time which didn't pass yet
    pub fn is_blocked(&self, now: u32) -> bool {
        matches!(self.header.blocked_until, Some(until) if until > now)
    }

    /// Element was deleted with a hold time which already passed
    pub fn is_block_elapsed(&self, now: u32) -> bool {
        matches!(self.header.blocked_until, Some(until) if until <= now)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

/// Result of set operation on cache
/// cas indicates version stored in cache
#[derive(Debug)]
pub struct SetStatus {
    pub cas: u64,
}

/// Decision taken by a read-modify-write closure passed to [`Storage::compute`]
pub enum Op {
    /// leave the entry as it is
    Nop,
    /// insert or overwrite the entry
    Put(Record),
    /// remove the entry
    Remove,
}

/// Compute closure, receives live element or None
pub type ComputeFn<'a> = dyn FnMut(Option<&Record>) -> Op + 'a;

// An abstraction over a capacity bound key <=> record store
pub trait Storage {
    /// Returns a live record associated with a key and marks it
    /// as recently used. Expired records are removed on the way.
    fn get(&self, key: &KeyType) -> Option<Record>;

    /// Inserts or overwrites a record, evicting least recently
    /// used records if memory budget is exceeded.
    ///
    /// - record bigger than the whole budget is rejected with ValueTooLarge
    /// - if eviction is disabled and there is no room OutOfMemory is returned
    fn put(&self, record: Record) -> Result<()>;

    /// Removes a record regardless of its state
    fn remove(&self, key: &KeyType) -> Option<Record>;

    /// Atomically reads, modifies and writes a record associated with key.
    /// The closure receives the live record (None if absent, expired or blocked)
    /// and decides what should be stored. No other operation on the same key
    /// can interleave with the closure.
    fn compute(&self, key: &KeyType, f: &mut ComputeFn<'_>) -> Result<()>;

    /// Removes all records from a store
    fn clear(&self);

    /// Makes every record expire no later than deadline
    fn expire_all(&self, deadline: u32);

    /// Removes expired records, returns number of removed records
    fn remove_expired(&self) -> usize;

    fn current_bytes(&self) -> u64;

    fn current_items(&self) -> u64;

    fn max_bytes(&self) -> u64;

    fn max_items(&self) -> Option<u64>;

    /// Number of live records removed to stay within limits
    fn evictions(&self) -> u64;

    /// Number of expired records reclaimed
    fn reclaimed(&self) -> u64;

    fn reset_stats(&self);
}
