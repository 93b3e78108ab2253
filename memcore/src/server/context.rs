use crate::memcache::builder::{MemcacheStoreBuilder, MemcacheStoreConfig};
use crate::memcache::store::MemcStore;
use crate::server::sweeper::ExpirySweeper;
use crate::server::timer;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Long lived server components sharing one cancellation token
pub struct ServerContext {
    cancellation_token: CancellationToken,
    system_timer: Arc<timer::SystemTimer>,
    store: Arc<MemcStore>,
    sweeper: Option<Arc<ExpirySweeper>>,
}

impl ServerContext {
    pub fn new(store_config: MemcacheStoreConfig, sweep_interval: Option<Duration>) -> Self {
        let cancellation_token = CancellationToken::new();
        let system_timer = Arc::new(timer::SystemTimer::new(cancellation_token.clone()));
        let store = MemcacheStoreBuilder::from_config(store_config, system_timer.clone());
        let sweeper = sweep_interval.map(|interval| {
            Arc::new(ExpirySweeper::new(
                store.clone(),
                interval,
                cancellation_token.clone(),
            ))
        });
        Self {
            cancellation_token,
            system_timer,
            store,
            sweeper,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn system_timer(&self) -> Arc<timer::SystemTimer> {
        self.system_timer.clone()
    }

    pub fn store(&self) -> Arc<MemcStore> {
        self.store.clone()
    }

    pub fn sweeper(&self) -> Option<Arc<ExpirySweeper>> {
        self.sweeper.clone()
    }
}
