use log::debug;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

/// Source of the current time in unix seconds
pub trait Timer {
    fn timestamp(&self) -> u32;
}

pub fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}

/// Coarse wall clock refreshed once per second, so hot paths
/// only pay for an atomic load.
pub struct SystemTimer {
    seconds: AtomicU32,
    cancellation_token: CancellationToken,
}

impl SystemTimer {
    pub fn new(cancellation_token: CancellationToken) -> Self {
        debug!("Creating system timer");
        SystemTimer {
            seconds: AtomicU32::new(unix_timestamp()),
            cancellation_token,
        }
    }

    pub async fn run(&self) {
        let start = Instant::now();
        let mut interval = interval_at(start, Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    debug!("System timer cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.refresh();
                    trace!("Server tick: {}", self.timestamp());
                }
            }
        }
    }

    fn refresh(&self) {
        self.seconds.store(unix_timestamp(), Ordering::Release);
    }
}

impl Timer for SystemTimer {
    fn timestamp(&self) -> u32 {
        self.seconds.load(Ordering::Acquire)
    }
}
