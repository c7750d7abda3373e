//! The cooperative, multi-threaded scheduler: a fixed worker pool with
//! per-worker run-queues and work stealing (§4.8(1)).

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};
use rand::Rng;
use tracing::debug;

// Layer 3: Internal module imports
use crate::util::ActorId;

/// One unit of scheduled work: resume the actor identified by `id` up to
/// `max_throughput` envelopes. The pool only moves ids around; the actual
/// `resume` call happens wherever the concrete actor table lives (the
/// `system` module), which implements [`Runnable`].
pub trait Runnable: Send + Sync {
    /// Resume the named actor; return `true` if it should be re-queued
    /// (§4.2 "an actor that returns `again` is re-queued").
    fn run_once(&self, id: ActorId, max_throughput: usize) -> bool;
}

struct Worker {
    queue: Mutex<VecDeque<ActorId>>,
    has_work: Condvar,
}

impl Worker {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            has_work: Condvar::new(),
        }
    }

    fn push(&self, id: ActorId) {
        self.queue.lock().push_back(id);
        self.has_work.notify_one();
    }

    fn pop(&self) -> Option<ActorId> {
        self.queue.lock().pop_front()
    }

    /// Steal from the back, leaving the owner's own `pop` (front) contended
    /// as little as possible.
    fn steal(&self) -> Option<ActorId> {
        self.queue.lock().pop_back()
    }
}

/// Policy named by `scheduler.policy` (§6): `sharing` uses one queue for
/// every worker, `stealing` gives each worker its own deque and lets idle
/// workers steal from a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPolicy {
    Sharing,
    Stealing,
}

struct Shared {
    workers: Vec<Worker>,
    shutdown: AtomicBool,
    max_throughput: usize,
    policy: SchedulerPolicy,
    next_worker: AtomicUsize,
}

/// A fixed pool of OS threads cooperatively resuming scheduled actors
/// (§4.8(1), §5: "parallel workers by default; each actor is single-threaded").
pub struct CooperativeScheduler {
    shared: Arc<Shared>,
    threads: Vec<std::thread::JoinHandle<()>>,
}

impl CooperativeScheduler {
    /// Spawn `worker_count` threads driving `runnable.run_once` for every
    /// id pulled off a worker's queue. Fails only if the OS refuses to
    /// create a thread; any workers already spawned are shut down and
    /// joined before the error is returned.
    pub fn start<R>(
        worker_count: usize,
        max_throughput: usize,
        policy: SchedulerPolicy,
        runnable: Arc<R>,
    ) -> std::io::Result<Self>
    where
        R: Runnable + 'static,
    {
        let worker_count = worker_count.max(1);
        let shared = Arc::new(Shared {
            workers: (0..worker_count).map(|_| Worker::new()).collect(),
            shutdown: AtomicBool::new(false),
            max_throughput,
            policy,
            next_worker: AtomicUsize::new(0),
        });

        let mut threads = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let worker_shared = Arc::clone(&shared);
            let worker_runnable = Arc::clone(&runnable);
            let spawned = std::thread::Builder::new()
                .name(format!("caldera-worker-{index}"))
                .spawn(move || worker_loop(index, worker_shared, worker_runnable));

            match spawned {
                Ok(thread) => threads.push(thread),
                Err(err) => {
                    Self { shared, threads }.shutdown();
                    return Err(err);
                }
            }
        }

        Ok(Self { shared, threads })
    }

    /// Schedule `id` to run, assigning it to a worker by round-robin (§4.8:
    /// newly-scheduled work enters through any worker's own queue; idle
    /// peers steal the rest under the `stealing` policy).
    pub fn schedule(&self, id: ActorId) {
        let index = self.shared.next_worker.fetch_add(1, Ordering::Relaxed) % self.shared.workers.len();
        self.shared.workers[index].push(id);
    }

    pub fn shutdown(self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        for worker in &self.shared.workers {
            worker.has_work.notify_all();
        }
        for thread in self.threads {
            let _ = thread.join();
        }
    }
}

fn worker_loop<R: Runnable>(index: usize, shared: Arc<Shared>, runnable: Arc<R>) {
    loop {
        if shared.shutdown.load(Ordering::SeqCst) {
            return;
        }

        let own = &shared.workers[index];
        let next = own.pop().or_else(|| {
            if shared.policy == SchedulerPolicy::Stealing {
                steal_from_peers(index, &shared)
            } else {
                None
            }
        });

        match next {
            Some(id) => {
                if runnable.run_once(id, shared.max_throughput) {
                    own.push(id);
                }
            }
            None => {
                let mut guard = own.queue.lock();
                if guard.is_empty() && !shared.shutdown.load(Ordering::SeqCst) {
                    own.has_work.wait_for(&mut guard, std::time::Duration::from_millis(50));
                }
            }
        }
    }
}

fn steal_from_peers(own_index: usize, shared: &Shared) -> Option<ActorId> {
    let count = shared.workers.len();
    if count <= 1 {
        return None;
    }
    let start = rand::thread_rng().gen_range(0..count);
    for offset in 0..count {
        let index = (start + offset) % count;
        if index == own_index {
            continue;
        }
        if let Some(id) = shared.workers[index].steal() {
            debug!(from = index, to = own_index, "stole actor from peer worker");
            return Some(id);
        }
    }
    None
}
