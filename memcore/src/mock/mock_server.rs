use crate::cache::eviction_policy::EvictionPolicy;
use crate::memcache::builder::{MemcacheStoreBuilder, MemcacheStoreConfig};
use crate::memcache::store::MemcStore;
use crate::server::timer;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Unix time the mock clock starts at
pub const MOCK_NOW: u32 = 1_700_000_000;

pub struct MockSystemTimer {
    pub current_time: AtomicU32,
}

pub trait SetableTimer: timer::Timer {
    fn set(&self, time: u32);
    fn add_seconds(&self, seconds: u32);
}

impl MockSystemTimer {
    pub fn new() -> Self {
        MockSystemTimer {
            current_time: AtomicU32::new(0),
        }
    }
}

impl Default for MockSystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl timer::Timer for MockSystemTimer {
    fn timestamp(&self) -> u32 {
        self.current_time.load(Ordering::Relaxed)
    }
}

impl SetableTimer for MockSystemTimer {
    fn set(&self, time: u32) {
        self.current_time.store(time, Ordering::Relaxed)
    }

    fn add_seconds(&self, seconds: u32) {
        self.current_time.fetch_add(seconds, Ordering::Release);
    }
}

pub struct MockServer {
    pub timer: Arc<MockSystemTimer>,
    pub storage: Arc<MemcStore>,
}

impl MockServer {
    pub fn new(config: MemcacheStoreConfig) -> Self {
        let timer = Arc::new(MockSystemTimer::new());
        timer.set(MOCK_NOW);
        let storage = MemcacheStoreBuilder::from_config(config, timer.clone());
        MockServer { timer, storage }
    }
}

pub fn create_server(memory_limit: u64, policy: EvictionPolicy, segments: usize) -> MockServer {
    MockServer::new(MemcacheStoreConfig {
        memory_limit,
        max_items: None,
        policy,
        segments: Some(segments),
    })
}

pub fn create_single_segment_server() -> MockServer {
    create_server(64 * 1024 * 1024, EvictionPolicy::LeastRecentlyUsed, 1)
}

pub fn create_segmented_server() -> MockServer {
    create_server(64 * 1024 * 1024, EvictionPolicy::LeastRecentlyUsed, 16)
}
