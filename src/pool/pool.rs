//! Worker pool core: lanes, counters, and the three-phase worker loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::config::PoolConfig;
use super::priority::{Priority, LANE_COUNT};

/// A queued unit of work. Executed exactly once by exactly one worker,
/// then discarded; the pool never re-queues a task.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Per-priority FIFO queues, guarded by a single mutex.
struct Lanes {
    queues: [VecDeque<Task>; LANE_COUNT],
}

impl Lanes {
    fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| VecDeque::new()),
        }
    }

    /// Pop from the highest-priority non-empty lane.
    fn pop_highest(&mut self) -> Option<Task> {
        self.queues.iter_mut().find_map(|queue| queue.pop_front())
    }

    fn has_work(&self) -> bool {
        self.queues.iter().any(|queue| !queue.is_empty())
    }
}

/// State shared between the pool handle and its workers.
struct PoolShared {
    lanes: Mutex<Lanes>,
    /// Wakes parked workers when tasks arrive or shutdown is requested.
    work_available: Condvar,
    /// Wakes `wait_idle` callers when the pool drains.
    idle: Condvar,
    /// Tasks queued but not yet started.
    pending: AtomicUsize,
    /// Tasks currently executing.
    active: AtomicUsize,
    /// Tasks finished over the pool's lifetime.
    completed: AtomicUsize,
    shutdown: AtomicBool,
    spin_attempts: usize,
    yield_attempts: usize,
}

impl PoolShared {
    /// Dequeue the highest-priority task.
    ///
    /// The pending→active handoff happens while the lane lock is held, so
    /// the idle predicate can never observe a task between the two counters.
    fn try_dequeue(&self) -> Option<Task> {
        let mut lanes = self.lanes.lock().unwrap();
        let task = lanes.pop_highest()?;
        self.active.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_sub(1, Ordering::Relaxed);
        Some(task)
    }

    /// Execute a dequeued task and settle the counters.
    ///
    /// The pool catches nothing: a task that panics takes its worker down
    /// with it, so tasks must handle their own error paths.
    fn run_task(&self, task: Task) {
        task();
        self.active.fetch_sub(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.notify_if_idle();
    }

    fn is_idle(&self) -> bool {
        self.pending.load(Ordering::Relaxed) == 0 && self.active.load(Ordering::Relaxed) == 0
    }

    /// Wake `wait_idle` callers if all work has drained.
    ///
    /// Takes the lane lock first so the wake cannot slip between a
    /// waiter's predicate check and its park.
    fn notify_if_idle(&self) {
        let _lanes = self.lanes.lock().unwrap();
        if self.is_idle() {
            self.idle.notify_all();
        }
    }
}

/// The worker body: run until shutdown, escalating through the three idle
/// phases whenever the lanes come up empty. A task found in any phase
/// restarts the cycle from phase one.
fn worker_loop(shared: &PoolShared) {
    'cycle: loop {
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }

        // Phase 1: hot dequeue attempts, no backoff.
        for _ in 0..shared.spin_attempts {
            if let Some(task) = shared.try_dequeue() {
                shared.run_task(task);
                continue 'cycle;
            }
        }

        // Phase 2: keep trying with a CPU pause hint between attempts.
        for _ in 0..shared.yield_attempts {
            std::hint::spin_loop();
            if let Some(task) = shared.try_dequeue() {
                shared.run_task(task);
                continue 'cycle;
            }
        }

        // Phase 3: park until work arrives or shutdown is requested.
        let mut lanes = shared.lanes.lock().unwrap();
        while !lanes.has_work() && !shared.shutdown.load(Ordering::Relaxed) {
            lanes = shared.work_available.wait(lanes).unwrap();
        }
    }
}

/// Priority thread pool.
///
/// See the [module docs](super) for the scheduling model. Submitting work
/// after [`shutdown`](ThreadPool::shutdown) is a caller error; the pool
/// does not defend against it.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl ThreadPool {
    /// Start a pool with the given configuration.
    pub fn new(config: PoolConfig) -> Self {
        let worker_count = config.effective_worker_count();
        let shared = Arc::new(PoolShared {
            lanes: Mutex::new(Lanes::new()),
            work_available: Condvar::new(),
            idle: Condvar::new(),
            pending: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            spin_attempts: config.spin_attempts,
            yield_attempts: config.yield_attempts,
        });

        let mut workers = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("decode-worker-{i}"))
                .spawn(move || worker_loop(&shared))
                .expect("failed to spawn decode worker thread");
            workers.push(handle);
        }

        debug!(workers = worker_count, "thread pool started");

        Self {
            shared,
            workers: Mutex::new(workers),
            worker_count,
        }
    }

    /// Append a task to the tail of a lane and wake one worker.
    pub fn submit<F>(&self, priority: Priority, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut lanes = self.shared.lanes.lock().unwrap();
            lanes.queues[priority.index()].push_back(Box::new(task));
            self.shared.pending.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.work_available.notify_one();
    }

    /// Prepend a task to a lane, jumping everything already queued there.
    ///
    /// For latency-sensitive work such as decoding the image the user just
    /// scrolled to.
    pub fn submit_front<F>(&self, priority: Priority, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut lanes = self.shared.lanes.lock().unwrap();
            lanes.queues[priority.index()].push_front(Box::new(task));
            self.shared.pending.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.work_available.notify_one();
    }

    /// Append a whole batch atomically with respect to the lane lock and
    /// wake all workers.
    pub fn submit_batch(&self, priority: Priority, tasks: Vec<Task>) {
        if tasks.is_empty() {
            return;
        }
        let count = tasks.len();
        {
            let mut lanes = self.shared.lanes.lock().unwrap();
            lanes.queues[priority.index()].extend(tasks);
            self.shared.pending.fetch_add(count, Ordering::Relaxed);
        }
        self.shared.work_available.notify_all();
    }

    /// Drop every not-yet-started task. Returns the number dropped.
    pub fn purge_all(&self) -> usize {
        let mut lanes = self.shared.lanes.lock().unwrap();
        let purged: usize = lanes
            .queues
            .iter_mut()
            .map(|queue| {
                let count = queue.len();
                queue.clear();
                count
            })
            .sum();
        self.settle_purge(purged);
        purged
    }

    /// Drop not-yet-started tasks from one lane. Returns the number dropped.
    pub fn purge_priority(&self, priority: Priority) -> usize {
        let mut lanes = self.shared.lanes.lock().unwrap();
        let queue = &mut lanes.queues[priority.index()];
        let purged = queue.len();
        queue.clear();
        self.settle_purge(purged);
        purged
    }

    /// Adjust the pending counter after a purge and wake idle waiters if
    /// the pool drained. Caller holds the lane lock.
    ///
    /// The subtraction saturates: tasks that started between the caller's
    /// observation and the purge are already out of pending.
    fn settle_purge(&self, purged: usize) {
        let _ = self
            .shared
            .pending
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |p| {
                Some(p.saturating_sub(purged))
            });
        if self.shared.is_idle() {
            self.shared.idle.notify_all();
        }
    }

    /// Block until no task is queued and none is executing.
    ///
    /// Intended for deterministic shutdown and test synchronization, not
    /// steady-state use; calling it from inside a pool task deadlocks.
    pub fn wait_idle(&self) {
        let mut lanes = self.shared.lanes.lock().unwrap();
        while !self.shared.is_idle() {
            lanes = self.shared.idle.wait(lanes).unwrap();
        }
    }

    /// Whether no task is queued and none is executing.
    pub fn is_idle(&self) -> bool {
        self.shared.is_idle()
    }

    /// Tasks queued but not yet started.
    pub fn pending_count(&self) -> usize {
        self.shared.pending.load(Ordering::Relaxed)
    }

    /// Tasks currently executing.
    pub fn active_count(&self) -> usize {
        self.shared.active.load(Ordering::Relaxed)
    }

    /// Tasks finished over the pool's lifetime.
    pub fn completed_count(&self) -> usize {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stop the pool: in-flight tasks finish, queued-but-unstarted tasks
    /// are silently abandoned, and all workers are joined. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        {
            // Hold the lane lock while waking so a worker checking its
            // park predicate cannot miss the signal.
            let _lanes = self.shared.lanes.lock().unwrap();
            self.shared.work_available.notify_all();
        }

        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                warn!("decode worker thread panicked");
            }
        }

        debug!(
            completed = self.shared.completed.load(Ordering::Relaxed),
            "thread pool shut down"
        );
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
