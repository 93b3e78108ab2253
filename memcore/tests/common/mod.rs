use bytes::Bytes;
use memcore::cache::eviction_policy::EvictionPolicy;
use memcore::memcache::builder::{MemcacheStoreBuilder, MemcacheStoreConfig};
use memcore::memcache::store::{MemcStore, Record};
use memcore::server::timer::Timer;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const NOW: u32 = 1_700_000_000;

pub struct ManualTimer {
    now: AtomicU32,
}

impl ManualTimer {
    pub fn new() -> Self {
        ManualTimer {
            now: AtomicU32::new(NOW),
        }
    }

    #[allow(dead_code)]
    pub fn add_seconds(&self, seconds: u32) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    fn timestamp(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}

pub struct TestStore {
    #[allow(dead_code)]
    pub timer: Arc<ManualTimer>,
    pub store: Arc<MemcStore>,
}

pub fn create_store(memory_limit: u64, policy: EvictionPolicy, segments: usize) -> TestStore {
    let timer = Arc::new(ManualTimer::new());
    let config = MemcacheStoreConfig::new(memory_limit, None, policy, Some(segments));
    let store = MemcacheStoreBuilder::from_config(config, timer.clone());
    TestStore { timer, store }
}

pub fn record(key: &str, value: &str) -> Record {
    record_with_expiration(key, value, 0)
}

#[allow(dead_code)]
pub fn record_with_expiration(key: &str, value: &str, expiration: u32) -> Record {
    Record::new(
        Bytes::from(key.to_string()),
        Bytes::from(value.to_string()),
        0,
        0,
        expiration,
    )
}
