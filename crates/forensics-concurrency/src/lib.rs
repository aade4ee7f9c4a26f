//! Bounded, order-preserving parallel map.
//!
//! Git invocation is the dominant cost in every engine; this is the single
//! choke point all of them route through so the process never has more than
//! `limit` Git/filesystem operations outstanding at once.

#![forbid(unsafe_code)]

use rayon::prelude::*;
use tracing::warn;

/// Default fan-out ceiling used throughout the engine.
pub const DEFAULT_LIMIT: usize = 5;

/// Apply `f` to every item in `items`, running at most `limit` calls
/// concurrently. `result[i]` always corresponds to `f(items[i])`, regardless
/// of completion order.
pub fn map_concurrent<T, R, F>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let limit = limit.max(1);

    match rayon::ThreadPoolBuilder::new().num_threads(limit).build() {
        Ok(pool) => pool.install(|| items.into_par_iter().map(|item| f(item)).collect()),
        Err(err) => {
            warn!(error = %err, "failed to build bounded thread pool, falling back to sequential map");
            items.into_iter().map(f).collect()
        }
    }
}
