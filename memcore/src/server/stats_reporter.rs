use crate::memcache::store::MemcStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

/// Logs a one line summary of cache stats at a fixed interval
pub struct StatsReporter {
    store: Arc<MemcStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl StatsReporter {
    pub fn new(
        store: Arc<MemcStore>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        StatsReporter {
            store,
            interval,
            cancellation_token,
        }
    }

    pub async fn run(&self) {
        let mut interval = interval_at(Instant::now() + self.interval, self.interval);
        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    debug!("Stats reporter cancelled");
                    break;
                }
                _ = interval.tick() => {
                    info!("{}", self.summary());
                }
            }
        }
    }

    pub fn summary(&self) -> String {
        let stats = self.store.stats();
        format!(
            "items: {}, bytes: {}/{}, hit rate: {:.2}, evictions: {}, reclaimed: {}, uptime: {}s",
            stats.curr_items,
            stats.bytes,
            stats.limit_maxbytes,
            stats.hit_rate(),
            stats.evictions,
            stats.reclaimed,
            stats.uptime
        )
    }
}
