use super::store::MemcStore;
use crate::cache::cache::Storage;
use crate::cache::eviction_policy::EvictionPolicy;
use crate::memory_store::lru_store::{LruMemoryStore, LruStoreConfig};
use crate::server::timer;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct MemcacheStoreConfig {
    pub memory_limit: u64,
    pub max_items: Option<u64>,
    pub policy: EvictionPolicy,
    pub segments: Option<usize>,
}

impl MemcacheStoreConfig {
    pub fn new(
        memory_limit: u64,
        max_items: Option<u64>,
        policy: EvictionPolicy,
        segments: Option<usize>,
    ) -> MemcacheStoreConfig {
        MemcacheStoreConfig {
            memory_limit,
            max_items,
            policy,
            segments,
        }
    }
}

pub struct MemcacheStoreBuilder {}

impl MemcacheStoreBuilder {
    pub fn from_config(
        config: MemcacheStoreConfig,
        timer: Arc<dyn timer::Timer + Send + Sync>,
    ) -> Arc<MemcStore> {
        let store_config = LruStoreConfig {
            memory_limit: config.memory_limit,
            max_items: config.max_items,
            policy: config.policy,
            segments: config.segments,
        };
        let store: Arc<dyn Storage + Send + Sync> =
            Arc::new(LruMemoryStore::new(timer.clone(), store_config));
        Arc::new(MemcStore::new(store, timer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::mock_server::MockSystemTimer;

    #[test]
    fn builder_should_apply_limits() {
        let config = MemcacheStoreConfig::new(1024, Some(10), EvictionPolicy::None, Some(2));
        let store = MemcacheStoreBuilder::from_config(config, Arc::new(MockSystemTimer::new()));
        assert_eq!(store.max_bytes(), 1024);
        assert_eq!(store.current_items(), 0);
        assert_eq!(store.current_bytes(), 0);
    }
}
