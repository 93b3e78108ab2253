use crate::memcache::store::MemcStore;
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

/// Periodically removes expired items, so memory held by
/// items nobody asks for anymore is given back.
pub struct ExpirySweeper {
    store: Arc<MemcStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<MemcStore>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        debug!("Creating expiry sweeper, interval: {:?}", interval);
        ExpirySweeper {
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
                    debug!("Expiry sweeper cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.sweep();
                }
            }
        }
    }

    fn sweep(&self) {
        let start = StdInstant::now();
        let removed = self.store.sweep();
        let duration = start.elapsed();
        if duration > self.interval / 2 {
            warn!("Sweep removed {} items in: {:?}", removed, duration);
        } else {
            debug!("Sweep removed {} items in: {:?}", removed, duration);
        }
    }
}
