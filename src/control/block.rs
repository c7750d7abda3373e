//! The control block: the one stable thing that knows how to reach an actor
//! (§4.1). Everything else — addresses, handles, the registry — holds a
//! reference to one of these rather than to the actor object directly.

// Layer 1: Standard library imports
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Weak;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;

// Layer 3: Internal module imports
use crate::message::EnvelopeSink;
use crate::util::ActorId;

/// Terminal reasons an actor can stop for (§6 "Exit reasons").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    Normal,
    UnhandledException,
    UserShutdown,
    Kill,
    Unreachable,
    OutOfWorkflow,
    BrokenPromise,
    RuntimeError,
    UnexpectedMessage,
    UnhandledRequestTimeout,
}

impl ExitReason {
    /// `link`'s propagation rule (§4.10): `normal` is silently absorbed by a
    /// linked peer; anything else propagates.
    pub fn propagates_on_link(self) -> bool {
        self != ExitReason::Normal
    }
}

/// Lets a down notification ride as an ordinary payload (§4.10 `monitored`).
impl crate::message::Message for ExitReason {}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::Normal => "normal",
            ExitReason::UnhandledException => "unhandled_exception",
            ExitReason::UserShutdown => "user_shutdown",
            ExitReason::Kill => "kill",
            ExitReason::Unreachable => "unreachable",
            ExitReason::OutOfWorkflow => "out_of_workflow",
            ExitReason::BrokenPromise => "broken_promise",
            ExitReason::RuntimeError => "runtime_error",
            ExitReason::UnexpectedMessage => "unexpected_message",
            ExitReason::UnhandledRequestTimeout => "unhandled_request_timeout",
        };
        f.write_str(s)
    }
}

/// The stable address of an actor (§3 "Address / control block").
///
/// Rust's own `Arc`/`Weak` already give us memory-safe reclamation, so this
/// block does not reimplement that; instead it tracks the *logical* strong
/// and weak counts the spec assigns meaning to — `strong == 0` means "the
/// actor object itself is gone", independent of how many `Arc<ControlBlock>`
/// are still floating around inside closures, registries, etc.
pub struct ControlBlock {
    id: ActorId,
    home_system: u64,
    sink: Weak<dyn EnvelopeSink>,
    strong: AtomicUsize,
    weak: AtomicUsize,
    exit_reason: RwLock<Option<ExitReason>>,
    /// Bumped by [`crate::actor::scheduled::ScheduledActor`] every time its
    /// idle timer is rearmed; stale timer firings compare against this
    /// (§3 invariant: "the active idle timeout's id equals ... the
    /// generation counter").
    idle_generation: AtomicU32,
}

impl ControlBlock {
    /// A freshly constructed block starts with zero logical strong/weak
    /// refs; the first [`crate::control::Handle`]/[`crate::control::Address`]
    /// built from it (via `from_block`) brings the relevant count to one.
    pub fn new(id: ActorId, home_system: u64, sink: Weak<dyn EnvelopeSink>) -> Self {
        Self {
            id,
            home_system,
            sink,
            strong: AtomicUsize::new(0),
            weak: AtomicUsize::new(0),
            exit_reason: RwLock::new(None),
            idle_generation: AtomicU32::new(0),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn home_system(&self) -> u64 {
        self.home_system
    }

    pub fn sink(&self) -> Weak<dyn EnvelopeSink> {
        self.sink.clone()
    }

    pub fn strong_count(&self) -> usize {
        self.strong.load(Ordering::SeqCst)
    }

    pub fn weak_count(&self) -> usize {
        self.weak.load(Ordering::SeqCst)
    }

    /// Is the actor object still alive (§3: `strong_refs == 0` destroys it)?
    pub fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }

    pub(crate) fn inc_strong(&self) -> usize {
        self.strong.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the count *after* the decrement; `0` means the actor object
    /// just became dead and the caller (the last dropped `Handle`) is
    /// responsible for publishing an exit reason if none is set yet.
    pub(crate) fn dec_strong(&self) -> usize {
        self.strong.fetch_sub(1, Ordering::SeqCst) - 1
    }

    pub(crate) fn inc_weak(&self) -> usize {
        self.weak.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn dec_weak(&self) -> usize {
        self.weak.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Set the terminal exit reason exactly once; returns `false` if one was
    /// already published.
    pub fn set_exit_reason(&self, reason: ExitReason) -> bool {
        let mut slot = self.exit_reason.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(reason);
        true
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        *self.exit_reason.read()
    }

    pub fn next_idle_generation(&self) -> u32 {
        self.idle_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_idle_generation(&self) -> u32 {
        self.idle_generation.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlBlock")
            .field("id", &self.id)
            .field("strong", &self.strong_count())
            .field("weak", &self.weak_count())
            .field("exit_reason", &self.exit_reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_reason_propagation_rule() {
        assert!(!ExitReason::Normal.propagates_on_link());
        assert!(ExitReason::RuntimeError.propagates_on_link());
    }

    #[test]
    fn exit_reason_is_set_exactly_once() {
        let block = ControlBlock::new(ActorId::next(), 1, Weak::<crate::mailbox::Mailbox>::new());
        assert!(block.set_exit_reason(ExitReason::Normal));
        assert!(!block.set_exit_reason(ExitReason::Kill));
        assert_eq!(block.exit_reason(), Some(ExitReason::Normal));
    }

    #[test]
    fn strong_count_reaching_zero_marks_dead() {
        let block = ControlBlock::new(ActorId::next(), 1, Weak::<crate::mailbox::Mailbox>::new());
        block.inc_strong();
        assert!(block.is_alive());
        assert_eq!(block.dec_strong(), 0);
        assert!(!block.is_alive());
    }
}
