//! The mailbox queue implementation (§4.2).
//!
//! Two priority lanes (urgent, normal), each FIFO. `urgent` always drains
//! ahead of `normal` (§5). Guarded by a single `parking_lot::Mutex` plus a
//! `parking_lot::Condvar` so a [`crate::actor::blocking::BlockingActor`] can
//! block its dedicated thread on new arrivals without pulling in tokio.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};

// Layer 3: Internal module imports
use crate::control::ExitReason;
use crate::message::{EnqueueOutcome, Envelope, EnvelopeSink, Priority};

struct State {
    urgent: VecDeque<Envelope>,
    normal: VecDeque<Envelope>,
    /// `true` while the scheduler (or a blocking actor's own thread) is
    /// responsible for draining this mailbox. Cleared by [`Mailbox::mark_idle`].
    scheduled: bool,
    closed: Option<ExitReason>,
}

impl State {
    fn is_empty(&self) -> bool {
        self.urgent.is_empty() && self.normal.is_empty()
    }

    fn len(&self) -> usize {
        self.urgent.len() + self.normal.len()
    }
}

/// A single actor's inbound queue.
pub struct Mailbox {
    state: Mutex<State>,
    arrived: Condvar,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                urgent: VecDeque::new(),
                normal: VecDeque::new(),
                scheduled: false,
                closed: None,
            }),
            arrived: Condvar::new(),
        }
    }

    /// Pop the next envelope honoring lane priority (§4.2 `pop`).
    pub fn pop(&self) -> Option<Envelope> {
        let mut state = self.state.lock();
        state.urgent.pop_front().or_else(|| state.normal.pop_front())
    }

    /// Reinsert at the head of the envelope's own lane (§4.2 `put_back`,
    /// used when a handler returns the skip marker).
    pub fn put_back(&self, envelope: Envelope) {
        let mut state = self.state.lock();
        match envelope.priority() {
            Priority::Urgent => state.urgent.push_front(envelope),
            Priority::Normal => state.normal.push_front(envelope),
        }
    }

    /// Scan in delivery order (urgent lane first) for the first envelope
    /// matching `predicate`, removing it from wherever it sits without
    /// disturbing the relative order of the rest (§4.2 `peek_unread`, and the
    /// blocking actor's `receive` pattern scan, §4.5).
    pub fn find_remove<F>(&self, mut predicate: F) -> Option<Envelope>
    where
        F: FnMut(&Envelope) -> bool,
    {
        let mut state = self.state.lock();
        if let Some(pos) = state.urgent.iter().position(&mut predicate) {
            return state.urgent.remove(pos);
        }
        if let Some(pos) = state.normal.iter().position(&mut predicate) {
            return state.normal.remove(pos);
        }
        None
    }

    /// Non-destructive scan in delivery order, calling `visit` for each
    /// queued envelope until it returns `true` or the queue is exhausted.
    /// Used by the deterministic scheduler's `prepone_and_expect` (§4.8) to
    /// locate a match before deciding whether to reorder it.
    pub fn scan<F>(&self, mut visit: F) -> bool
    where
        F: FnMut(&Envelope) -> bool,
    {
        let state = self.state.lock();
        state.urgent.iter().any(&mut visit) || state.normal.iter().any(&mut visit)
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// Mark terminal (§4.2 `close`); further `enqueue` calls reject with the
    /// envelope handed back so the caller can synthesize an error response.
    /// Returns the envelopes still queued so the caller can drain them with
    /// the given reason (e.g. replying `mailbox_closed` to pending requests).
    pub fn close(&self, reason: ExitReason) -> Vec<Envelope> {
        let mut state = self.state.lock();
        if state.closed.is_none() {
            state.closed = Some(reason);
        }
        let mut drained: Vec<Envelope> = state.urgent.drain(..).collect();
        drained.extend(state.normal.drain(..));
        drained
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed.is_some()
    }

    /// Release scheduling ownership; the next `enqueue` will report
    /// [`EnqueueOutcome::ScheduledNow`] again.
    pub fn mark_idle(&self) {
        self.state.lock().scheduled = false;
    }

    /// Block the calling thread until a new envelope arrives or `timeout`
    /// elapses (§4.5 `dequeue` may block on the mailbox's condition
    /// variable). Returns `true` if woken by an arrival, `false` on timeout.
    pub fn wait_for_arrival(&self, timeout: Option<Duration>) -> bool {
        let mut state = self.state.lock();
        if !state.is_empty() {
            return true;
        }
        match timeout {
            Some(d) => !self.arrived.wait_for(&mut state, d).timed_out(),
            None => {
                self.arrived.wait(&mut state);
                true
            }
        }
    }
}

impl EnvelopeSink for Mailbox {
    fn enqueue(&self, envelope: Envelope) -> EnqueueOutcome {
        let mut state = self.state.lock();
        if state.closed.is_some() {
            return EnqueueOutcome::Rejected(envelope);
        }
        match envelope.priority() {
            Priority::Urgent => state.urgent.push_back(envelope),
            Priority::Normal => state.normal.push_back(envelope),
        }
        self.arrived.notify_all();
        if state.scheduled {
            EnqueueOutcome::AlreadyScheduled
        } else {
            state.scheduled = true;
            EnqueueOutcome::ScheduledNow
        }
    }

    fn is_closed(&self) -> bool {
        self.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Payload;

    fn env(priority: Priority, n: i32) -> Envelope {
        Envelope::async_message(None, priority, Payload::new(n))
    }

    #[test]
    fn urgent_drains_before_normal() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(env(Priority::Normal, 1));
        mailbox.enqueue(env(Priority::Urgent, 2));

        let first = mailbox.pop().unwrap();
        assert_eq!(first.payload().downcast_ref::<i32>(), Some(&2));
        let second = mailbox.pop().unwrap();
        assert_eq!(second.payload().downcast_ref::<i32>(), Some(&1));
    }

    #[test]
    fn fifo_within_a_lane() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(env(Priority::Normal, 1));
        mailbox.enqueue(env(Priority::Normal, 2));
        mailbox.enqueue(env(Priority::Normal, 3));

        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&1));
        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&2));
        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn put_back_reinserts_at_head() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(env(Priority::Normal, 1));
        mailbox.enqueue(env(Priority::Normal, 2));

        let skipped = mailbox.pop().unwrap();
        mailbox.put_back(skipped);

        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&1));
    }

    #[test]
    fn enqueue_reports_scheduling_transition_once() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.enqueue(env(Priority::Normal, 1)), EnqueueOutcome::ScheduledNow);
        assert_eq!(mailbox.enqueue(env(Priority::Normal, 2)), EnqueueOutcome::AlreadyScheduled);

        mailbox.mark_idle();
        assert_eq!(mailbox.enqueue(env(Priority::Normal, 3)), EnqueueOutcome::ScheduledNow);
    }

    #[test]
    fn closed_mailbox_rejects_enqueue() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(env(Priority::Normal, 1));
        let drained = mailbox.close(ExitReason::Normal);
        assert_eq!(drained.len(), 1);

        match mailbox.enqueue(env(Priority::Normal, 2)) {
            EnqueueOutcome::Rejected(_) => {}
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn find_remove_locates_without_disturbing_order() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(env(Priority::Normal, 1));
        mailbox.enqueue(env(Priority::Normal, 42));
        mailbox.enqueue(env(Priority::Normal, 3));

        let found = mailbox
            .find_remove(|e| e.payload().downcast_ref::<i32>() == Some(&42))
            .unwrap();
        assert_eq!(found.payload().downcast_ref::<i32>(), Some(&42));

        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&1));
        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&3));
    }
}
