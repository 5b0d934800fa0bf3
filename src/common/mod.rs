pub mod errors;
pub mod time_limit;

/// Number of records fetched per read transaction while streaming media.
pub const ROW_BATCH_NUMBER: usize = 20;

/// Collection whose originals receive responsive variants.
pub const ORIGINAL_COLLECTION: &str = "media_library_original";

pub const DEFAULT_RESPONSIVE_WIDTHS: &[u32] = &[320, 640, 1024];

use std::sync::LazyLock;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::runtime::{Builder, Runtime};

pub static CURRENT_NUM_THREADS: LazyLock<usize> = LazyLock::new(rayon::current_num_threads);

// Background Worker-specific Tokio Runtime
// Drains the conversion queue when a background queue connection is configured.
pub static INDEX_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(*CURRENT_NUM_THREADS)
        .thread_name("background-task-worker")
        .enable_all()
        .build()
        .expect("Failed to build Worker Tokio runtime")
});

// Rayon thread pool for compute-intensive tasks
// Resizing for the conversions of a single record fans out here.
// It does not create a global Rayon pool, so it does not interfere with other threads.
pub static WORKER_RAYON_POOL: LazyLock<ThreadPool> = LazyLock::new(|| {
    ThreadPoolBuilder::new()
        .num_threads(*CURRENT_NUM_THREADS)
        .thread_name(|i| format!("cpu-intensive-worker-{}", i))
        .build()
        .expect("Failed to build Worker Rayon pool")
});
