//! The real wall-clock, driven by a single dedicated background thread
//! (§4.9, §4.8: "scheduled ... envelopes flow through a single-producer
//! clock thread").

// Layer 1: Standard library imports
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};

// Layer 3: Internal module imports
use super::heap::{Action, Disposable, TimerHeap};
use super::Clock;

struct Shared {
    heap: TimerHeap,
    shutdown: Mutex<bool>,
    wake: Condvar,
}

/// The production clock. A single background thread sleeps until the
/// nearest deadline (or is woken early by a new, sooner `schedule` call),
/// then fires everything due.
pub struct SystemClock {
    shared: Arc<Shared>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl SystemClock {
    /// Spawns the dedicated clock thread. Fails only if the OS refuses to
    /// create it (thread-table exhaustion and the like).
    pub fn new() -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            heap: TimerHeap::new(),
            shutdown: Mutex::new(false),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("caldera-clock".into())
            .spawn(move || run_clock_thread(worker_shared))?;

        Ok(Self {
            shared,
            _thread: Some(handle),
        })
    }
}

impl Drop for SystemClock {
    fn drop(&mut self) {
        *self.shared.shutdown.lock() = true;
        self.shared.wake.notify_all();
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn schedule(&self, deadline: DateTime<Utc>, action: Action) -> Disposable {
        let disposable = self.shared.heap.schedule(deadline, action);
        self.shared.wake.notify_all();
        disposable
    }
}

fn run_clock_thread(shared: Arc<Shared>) {
    loop {
        let mut shutdown = shared.shutdown.lock();
        if *shutdown {
            return;
        }

        let sleep_for = match shared.heap.next_deadline() {
            Some(deadline) => {
                let now = Utc::now();
                if deadline <= now {
                    StdDuration::ZERO
                } else {
                    (deadline - now)
                        .to_std()
                        .unwrap_or(StdDuration::from_millis(1))
                }
            }
            None => StdDuration::from_secs(3600),
        };

        if sleep_for > StdDuration::ZERO {
            shared.wake.wait_for(&mut shutdown, sleep_for);
        }
        if *shutdown {
            return;
        }
        drop(shutdown);

        shared.heap.fire_due(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn fires_a_near_term_timer() {
        let clock = SystemClock::new().expect("failed to spawn clock thread");
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        clock.schedule(Utc::now() + chrono::Duration::milliseconds(5), Box::new(move || {
            fired_clone.store(true, Ordering::SeqCst);
        }));

        thread::sleep(Duration::from_millis(100));
        assert!(fired.load(Ordering::SeqCst));
    }
}
