//! The shared min-heap machinery behind both clock variants (§4.9).

// Layer 1: Standard library imports
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

// Layer 3: Internal module imports
// (none)

/// A scheduled action's boxed body, run at most once.
pub type Action = Box<dyn FnOnce() + Send>;

/// A disposable handle to a scheduled action (§3 "Timeout record": "Each
/// timeout is disposable and becomes a no-op when disposed before firing").
/// Disposing is idempotent and safe from any thread (§5).
#[derive(Clone)]
pub struct Disposable {
    disposed: Arc<AtomicBool>,
}

impl Disposable {
    fn new() -> (Self, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Self {
                disposed: Arc::clone(&flag),
            },
            flag,
        )
    }

    pub fn dispose(&self) {
        self.disposed.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(AtomicOrdering::SeqCst)
    }
}

struct Entry {
    deadline: DateTime<Utc>,
    seq: u64,
    disposed: Arc<AtomicBool>,
    action: Mutex<Option<Action>>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}
impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the earliest deadline first.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `(deadline, disposable_action)` min-heap (§4.9).
#[derive(Default)]
pub struct TimerHeap {
    heap: Mutex<BinaryHeap<Entry>>,
    next_seq: AtomicU64,
}

impl TimerHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `schedule(deadline, action) -> disposable` (§4.9).
    pub fn schedule(&self, deadline: DateTime<Utc>, action: Action) -> Disposable {
        let seq = self.next_seq.fetch_add(1, AtomicOrdering::SeqCst);
        let (disposable, flag) = Disposable::new();
        self.heap.lock().push(Entry {
            deadline,
            seq,
            disposed: flag,
            action: Mutex::new(Some(action)),
        });
        disposable
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.heap.lock().peek().map(|e| e.deadline)
    }

    /// Pop and invoke every action whose deadline has passed; disposed
    /// actions are skipped (§4.9 "Firing").
    pub fn fire_due(&self, now: DateTime<Utc>) -> usize {
        let mut fired = 0;
        loop {
            let due = {
                let mut heap = self.heap.lock();
                match heap.peek() {
                    Some(entry) if entry.deadline <= now => heap.pop(),
                    _ => None,
                }
            };
            match due {
                Some(entry) => {
                    if !entry.disposed.load(AtomicOrdering::SeqCst) {
                        if let Some(action) = entry.action.lock().take() {
                            action();
                            fired += 1;
                        }
                    }
                }
                None => break,
            }
        }
        fired
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;
    use std::time::Duration as StdDuration;

    #[test]
    fn fires_in_deadline_order() {
        let heap = TimerHeap::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let base = Utc::now();

        for (label, offset) in [(2, 20), (1, 10), (3, 30)] {
            let order = Arc::clone(&order);
            heap.schedule(
                base + chrono::Duration::from_std(StdDuration::from_millis(offset)).unwrap(),
                Box::new(move || order.lock().push(label)),
            );
        }

        heap.fire_due(base + chrono::Duration::from_std(StdDuration::from_millis(100)).unwrap());
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn disposed_action_never_fires() {
        let heap = TimerHeap::new();
        let fired = Arc::new(AtomicI32::new(0));
        let fired_clone = Arc::clone(&fired);
        let disposable = heap.schedule(Utc::now(), Box::new(move || {
            fired_clone.fetch_add(1, AtomicOrdering::SeqCst);
        }));
        disposable.dispose();
        heap.fire_due(Utc::now() + chrono::Duration::seconds(1));
        assert_eq!(fired.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn disposing_is_idempotent() {
        let heap = TimerHeap::new();
        let disposable = heap.schedule(Utc::now(), Box::new(|| {}));
        disposable.dispose();
        disposable.dispose();
    }
}
