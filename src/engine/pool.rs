// src/engine/pool.rs
//
// Global thread pool for batch conversion.
//
// A single pool is shared by every batch instead of building one per call;
// it is initialized lazily on first use and sized once. Changes to the
// environment after that have no effect.

use rayon::ThreadPool;
use std::sync::OnceLock;

/// Upper bound on the thread count a caller may request via RASTER_CONVERT_THREADS
pub const MAX_CONCURRENCY: usize = 1024;

/// Minimum number of rayon threads to ensure at least some parallelism
const MIN_RAYON_THREADS: usize = 1;

const THREADS_ENV: &str = "RASTER_CONVERT_THREADS";

static GLOBAL_THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// The shared batch pool, or `None` if no pool could be built; callers then
/// fall back to rayon's global pool.
pub fn get_pool() -> Option<&'static ThreadPool> {
    GLOBAL_THREAD_POOL
        .get_or_init(|| {
            let num_threads = configured_threads();
            match rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|i| format!("raster-convert-{i}"))
                .build()
            {
                Ok(pool) => {
                    tracing::debug!(num_threads, "batch thread pool ready");
                    Some(pool)
                }
                Err(e) => {
                    tracing::warn!(num_threads, error = %e, "failed to build batch thread pool");
                    None
                }
            }
        })
        .as_ref()
}

/// Thread count: the env override when it parses to a sane value, otherwise
/// the detected parallelism (which respects cgroup CPU quotas).
pub fn configured_threads() -> usize {
    std::env::var(THREADS_ENV)
        .ok()
        .and_then(|raw| parse_thread_count(&raw))
        .unwrap_or_else(detected_parallelism)
}

fn detected_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_RAYON_THREADS)
}

fn parse_thread_count(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if (MIN_RAYON_THREADS..=MAX_CONCURRENCY).contains(&n) => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_parsing() {
        assert_eq!(parse_thread_count("4"), Some(4));
        assert_eq!(parse_thread_count(" 2 "), Some(2));
        assert_eq!(parse_thread_count("0"), None);
        assert_eq!(parse_thread_count("100000"), None);
        assert_eq!(parse_thread_count("many"), None);
    }

    #[test]
    fn detected_parallelism_is_positive() {
        assert!(detected_parallelism() >= MIN_RAYON_THREADS);
    }

    #[test]
    fn pool_is_shared() {
        let a = get_pool().map(|p| p as *const ThreadPool);
        let b = get_pool().map(|p| p as *const ThreadPool);
        assert_eq!(a, b);
        if let Some(pool) = get_pool() {
            assert!(pool.current_num_threads() >= MIN_RAYON_THREADS);
        }
    }
}
