use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Builder;

fn get_worker_thread_name() -> String {
    static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
    let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
    format!("memcored-wrk-{}", id)
}

/// Runtime for the background tasks, they are cheap
/// so two worker threads are plenty.
pub fn create_runtime() -> io::Result<tokio::runtime::Runtime> {
    Builder::new_multi_thread()
        .thread_name_fn(get_worker_thread_name)
        .worker_threads(2)
        .enable_all()
        .build()
}
