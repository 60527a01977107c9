//! Priority thread pool for decode and prefetch work.
//!
//! A fixed set of OS worker threads drains three FIFO priority lanes
//! (on-demand > prefetch > housekeeping). Idle workers escalate through
//! three phases — hot dequeue attempts, dequeue attempts with a CPU pause
//! hint, then parking on a condition variable — so bursts of work are
//! picked up with minimal latency while an empty pool costs nothing.
//!
//! Scheduling is cooperative: a higher-priority task preempts lower-lane
//! *dequeuing*, never a task that is already running. There is no aging,
//! so a saturated higher lane starves the lanes below it.

mod config;
mod pool;
mod priority;

pub use config::{
    default_worker_count, PoolConfig, DEFAULT_SPIN_ATTEMPTS, DEFAULT_YIELD_ATTEMPTS,
    FALLBACK_CPU_COUNT,
};
pub use pool::{Task, ThreadPool};
pub use priority::{Priority, LANE_COUNT};
