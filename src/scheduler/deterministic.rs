//! The deterministic, single-thread scheduler variant used by tests
//! (§4.8(2), §8 S7).

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::Duration as ChronoDuration;

// Layer 3: Internal module imports
use crate::clock::DeterministicClock;
use crate::util::ActorId;

/// Resumes a named actor synchronously, draining exactly what's asked of
/// it. Implemented by whatever owns the actor table (the `system` module);
/// kept as a trait here so `scheduler::deterministic` has no dependency on
/// `system`.
pub trait Dispatch: Send + Sync {
    /// Resume `id` once, processing at most one envelope; returns `true` if
    /// an envelope was actually processed.
    fn dispatch_one(&self, id: ActorId) -> bool;

    /// Does `id`'s mailbox currently hold an envelope matching a probe
    /// predicate identified by `type_name`, and can that envelope be moved
    /// to the front of its lane? Used by [`DeterministicScheduler::prepone_and_expect`].
    fn prepone(&self, id: ActorId, type_name: &'static str) -> bool;
}

/// The deterministic fixture (§4.8(2)): every transition is driven
/// explicitly by the test, nothing happens on a background thread.
pub struct DeterministicScheduler<D: Dispatch> {
    dispatch: Arc<D>,
    clock: Arc<DeterministicClock>,
}

impl<D: Dispatch> DeterministicScheduler<D> {
    pub fn new(dispatch: Arc<D>, clock: Arc<DeterministicClock>) -> Self {
        Self { dispatch, clock }
    }

    /// `dispatch_message` (§4.8(2)): resume `id` for exactly one envelope.
    pub fn dispatch_message(&self, id: ActorId) -> bool {
        self.dispatch.dispatch_one(id)
    }

    /// `dispatch_messages` (§4.8(2)): drain `id` until it reports nothing
    /// left to process, returning the count handled.
    pub fn dispatch_messages(&self, id: ActorId) -> usize {
        let mut count = 0;
        while self.dispatch.dispatch_one(id) {
            count += 1;
        }
        count
    }

    /// `advance_time(dt)` (§4.8(2)).
    pub fn advance_time(&self, dt: std::time::Duration) -> usize {
        let dt = ChronoDuration::from_std(dt).unwrap_or_else(|_| ChronoDuration::zero());
        self.clock.advance_time(dt)
    }

    /// `trigger_timeout` (§4.8(2)): fire everything already due without
    /// moving time forward.
    pub fn trigger_timeout(&self) -> usize {
        self.clock.trigger_timeout()
    }

    /// `prepone_and_expect<T>(from).to(recv)` (§4.8(2), §8 S7): builder for
    /// asserting a specific envelope jumps the queue.
    pub fn prepone_and_expect(&self, type_name: &'static str) -> Prepone<'_, D> {
        Prepone {
            scheduler: self,
            type_name,
        }
    }
}

/// Builder returned by [`DeterministicScheduler::prepone_and_expect`].
pub struct Prepone<'a, D: Dispatch> {
    scheduler: &'a DeterministicScheduler<D>,
    type_name: &'static str,
}

impl<'a, D: Dispatch> Prepone<'a, D> {
    /// `.to(recv)`: reorder the matching envelope to the front of `recv`'s
    /// lane, then assert it was found.
    pub fn to(self, recv: ActorId) -> bool {
        self.scheduler.dispatch.prepone(recv, self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDispatch {
        remaining: AtomicUsize,
    }

    impl Dispatch for CountingDispatch {
        fn dispatch_one(&self, _id: ActorId) -> bool {
            let remaining = self.remaining.load(Ordering::SeqCst);
            if remaining == 0 {
                return false;
            }
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            true
        }

        fn prepone(&self, _id: ActorId, _type_name: &'static str) -> bool {
            true
        }
    }

    #[test]
    fn dispatch_messages_drains_until_empty() {
        let dispatch = Arc::new(CountingDispatch { remaining: AtomicUsize::new(3) });
        let clock = Arc::new(DeterministicClock::new(Utc::now()));
        let scheduler = DeterministicScheduler::new(dispatch, clock);

        assert_eq!(scheduler.dispatch_messages(ActorId::next()), 3);
        assert_eq!(scheduler.dispatch_messages(ActorId::next()), 0);
    }

    #[test]
    fn prepone_and_expect_reports_whether_the_envelope_was_found() {
        let dispatch = Arc::new(CountingDispatch { remaining: AtomicUsize::new(0) });
        let clock = Arc::new(DeterministicClock::new(Utc::now()));
        let scheduler = DeterministicScheduler::new(dispatch, clock);

        assert!(scheduler.prepone_and_expect("i32").to(ActorId::next()));
    }
}
