//! The deterministic clock: wall time replaced by a test-controlled `now`
//! that never advances on its own (§4.8, §4.9).

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::heap::{Action, Disposable, TimerHeap};
use super::Clock;

/// A clock whose time only moves when a test calls [`DeterministicClock::advance_time`]
/// or [`DeterministicClock::trigger_timeout`] (§4.8: "The deterministic
/// clock never advances on its own").
pub struct DeterministicClock {
    now: Mutex<DateTime<Utc>>,
    heap: TimerHeap,
}

impl DeterministicClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            heap: TimerHeap::new(),
        }
    }

    /// Move time forward by `dt` and fire everything now due.
    pub fn advance_time(&self, dt: Duration) -> usize {
        let mut now = self.now.lock();
        *now += dt;
        let snapshot = *now;
        drop(now);
        self.heap.fire_due(snapshot)
    }

    /// Fire everything due at the current time without advancing it —
    /// useful after disposing a competing timer to force deterministic
    /// resolution order.
    pub fn trigger_timeout(&self) -> usize {
        self.heap.fire_due(*self.now.lock())
    }

    pub fn pending_timer_count(&self) -> usize {
        self.heap.len()
    }
}

impl Clock for DeterministicClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    fn schedule(&self, deadline: DateTime<Utc>, action: Action) -> Disposable {
        self.heap.schedule(deadline, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn time_never_moves_without_advance_time() {
        let clock = DeterministicClock::new(Utc::now());
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        clock.schedule(clock.now() + Duration::milliseconds(1), Box::new(move || {
            fired_clone.store(true, Ordering::SeqCst);
        }));

        assert!(!fired.load(Ordering::SeqCst));
        clock.advance_time(Duration::milliseconds(1));
        assert!(fired.load(Ordering::SeqCst));
    }
}
