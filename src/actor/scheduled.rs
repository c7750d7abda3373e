//! The event-driven actor: resume step, pending-response table, timeouts,
//! link/monitor sets (§4.4).

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tracing::{debug, error, warn};

// Layer 3: Internal module imports
use super::context::ActorContext;
use super::traits::{Actor, DefaultHandlerStrategy};
use crate::behavior::{Behavior, BehaviorStack, Cardinality, HandlerOutcome, TimeoutStrength};
use crate::clock::{Clock, Disposable};
use crate::control::{Address, ControlBlock, ExitReason};
use crate::error::ActorError;
use crate::mailbox::Mailbox;
use crate::message::{Envelope, EnvelopeSink, Payload, SenderHandle};
use crate::promise::RequestHandle;
use crate::util::CorrelationId;

/// Delivered synchronously by the system when a linked peer terminates with
/// a reason that propagates (§4.10). An actor that wants to observe a
/// peer's death rather than go down with it installs a handler for this
/// type in its current behavior; [`ScheduledActor::receive_link_exit`]
/// checks for one before falling back to forced propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkExit(pub ExitReason);

impl crate::message::Message for LinkExit {}

/// Outcome of a single `resume` step (§4.2's "Resumption contract").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Nothing left to do; the actor can sleep until the next enqueue.
    Done,
    /// The throughput budget ran out with more work queued; re-enqueue.
    Again,
    /// The actor terminated this step.
    Terminated(ExitReason),
}

struct PendingResponse {
    timeout: Option<Disposable>,
}

struct MonitorEntry {
    observer: SenderHandle,
    callback: Option<Arc<dyn Fn(ExitReason) + Send + Sync>>,
}

/// The event-driven actor (§2 "Scheduled actor").
pub struct ScheduledActor<A: Actor> {
    actor: A,
    control: Arc<ControlBlock>,
    mailbox: Arc<Mailbox>,
    stack: BehaviorStack,
    pending: HashMap<CorrelationId, PendingResponse>,
    links: HashMap<u64, Address>,
    monitors: Vec<MonitorEntry>,
    default_handler: DefaultHandlerStrategy,
    clock: Arc<dyn Clock>,
    context: ActorContext,
    skip_cache: VecDeque<Envelope>,
    idle_timer: Option<Disposable>,
    /// Strength of whichever spec armed `idle_timer`, consulted by the
    /// drained-mailbox termination check in [`Self::resume`] (§4.4: "a weak
    /// timer does not keep the actor alive once its strong count reaches
    /// zero"). Meaningless while `idle_timer` is `None`.
    idle_timer_strength: TimeoutStrength,
    /// Set by [`Self::rearm_idle_timer`] when it rejects an out-of-range
    /// duration (§4.4: "attempting to set `d = ∞` terminates the actor with
    /// an error"); consumed by the next [`Self::resume`] call, since arming
    /// happens both from `resume`'s own loop and from `ensure_started`,
    /// which has no way to report a termination of its own.
    pending_termination: Option<ExitReason>,
    lazy_init: bool,
    started: bool,
}

impl<A: Actor> ScheduledActor<A> {
    pub fn new(
        actor: A,
        control: Arc<ControlBlock>,
        mailbox: Arc<Mailbox>,
        self_address: Address,
        clock: Arc<dyn Clock>,
        default_handler: DefaultHandlerStrategy,
        lazy_init: bool,
    ) -> Self {
        let context = ActorContext::new(self_address, Arc::clone(&clock));
        Self {
            actor,
            control,
            mailbox,
            stack: BehaviorStack::new(),
            pending: HashMap::new(),
            links: HashMap::new(),
            monitors: Vec::new(),
            default_handler,
            clock,
            context,
            skip_cache: VecDeque::new(),
            idle_timer: None,
            idle_timer_strength: TimeoutStrength::Strong,
            pending_termination: None,
            lazy_init,
            started: false,
        }
    }

    pub fn id(&self) -> crate::util::ActorId {
        self.control.id()
    }

    /// Borrow this actor's mailbox, e.g. for the deterministic scheduler's
    /// `prepone_and_expect` (§4.8(2), §8 S7).
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Is an envelope of this payload type currently held in the skip cache
    /// (§4.4 point 2, §8 S4: a skipped envelope stays queued, unread, until
    /// a future `become` makes it deliverable again)? Test-only
    /// introspection, mirroring why [`Self::mailbox`] is public.
    pub fn has_skipped(&self, type_name: &'static str) -> bool {
        self.skip_cache.iter().any(|e| e.payload().type_name() == type_name)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Runs `pre_start` exactly once. For `lazy_init` spawns this is a no-op
    /// until the mailbox has at least one envelope (§4.8 spawn option).
    pub async fn ensure_started(&mut self) -> Result<(), A::Error> {
        if self.started {
            return Ok(());
        }
        if self.lazy_init && self.mailbox.is_empty() {
            return Ok(());
        }
        let behavior = self.actor.pre_start(&mut self.context).await?;
        self.stack.become_behavior(behavior, false);
        self.started = true;
        self.pending_termination = self.rearm_idle_timer();
        debug!(actor = %self.id(), "actor started");
        Ok(())
    }

    /// Record the terminal reason (a no-op if `resume` already set one for a
    /// self-initiated termination) and run the lifecycle hook. This is the
    /// one call every termination path goes through — including a peer
    /// forced to terminate by link propagation, which never runs its own
    /// `resume` loop at all (§4.10).
    pub async fn stop(&mut self, reason: ExitReason) {
        self.control.set_exit_reason(reason);
        self.actor.post_stop(&mut self.context, reason).await;
    }

    pub fn link(&mut self, peer: Address) {
        self.links.insert(peer.id().as_u64(), peer);
    }

    pub fn unlink(&mut self, peer_id: crate::util::ActorId) {
        self.links.remove(&peer_id.as_u64());
    }

    pub fn linked_peers(&self) -> impl Iterator<Item = &Address> {
        self.links.values()
    }

    /// A linked peer just terminated with `reason` (§4.10). If the current
    /// top behavior has overridden the exit handler (declared a handler
    /// matching [`LinkExit`]), enqueue it as a normal urgent envelope and
    /// return `None` — the actor survives and processes it on its own
    /// schedule. Otherwise return `Some(reason)`: the caller (the system)
    /// must force this actor to terminate with the same reason, continuing
    /// the propagation chain.
    pub fn receive_link_exit(&mut self, reason: ExitReason) -> Option<ExitReason> {
        if !self.started {
            return Some(reason);
        }
        let payload = Payload::new(LinkExit(reason));
        let overridden = self.stack.top().map(|b| b.matches(&payload)).unwrap_or(false);
        if !overridden {
            return Some(reason);
        }
        self.mailbox
            .enqueue(Envelope::async_message(None, crate::message::Priority::Urgent, payload));
        None
    }

    pub fn monitor(&mut self, observer: SenderHandle, callback: Option<Arc<dyn Fn(ExitReason) + Send + Sync>>) {
        self.monitors.push(MonitorEntry { observer, callback });
    }

    /// Notify every monitor exactly once (§4.10, §8 invariant 4).
    pub fn notify_monitors(&mut self, reason: ExitReason) {
        for monitor in self.monitors.drain(..) {
            if let Some(callback) = monitor.callback {
                callback(reason);
            } else {
                let envelope = Envelope::async_message(None, crate::message::Priority::Normal, Payload::new(reason));
                monitor.observer.try_enqueue(envelope);
            }
        }
    }

    /// `request(target, timeout, payload)` (§4.4). The caller supplies the
    /// behavior built from `handle.then(..)`/`.awaiting_skip_frame()`, which
    /// this installs into the stack and pending-response table.
    pub fn request<T: crate::message::Message>(
        &mut self,
        target: &SenderHandle,
        timeout: Duration,
        payload: T,
        response_behavior: Behavior,
    ) -> RequestHandle {
        let (handle, envelope) = self.context.send_request(target, timeout, payload);
        self.install_request(target, envelope, handle, response_behavior)
    }

    /// Same as [`Self::request`], but takes an already erased [`Payload`] —
    /// the path a handler's `HandlerOutcome::Request` goes through, since it
    /// only has a `Payload` in hand, not the original typed value.
    pub fn request_payload(
        &mut self,
        target: &SenderHandle,
        timeout: Duration,
        payload: Payload,
        response_behavior: Behavior,
    ) -> RequestHandle {
        let (handle, envelope) = self.context.send_request_payload(timeout, payload);
        self.install_request(target, envelope, handle, response_behavior)
    }

    fn install_request(&mut self, target: &SenderHandle, envelope: Envelope, handle: RequestHandle, response_behavior: Behavior) -> RequestHandle {
        let id = handle.correlation_id();
        target.try_enqueue(envelope);

        let mailbox_sink: Arc<dyn EnvelopeSink> = Arc::clone(&self.mailbox) as Arc<dyn EnvelopeSink>;
        let timeout_id = id;
        let deadline = handle.deadline();
        let disposable = self.clock.schedule(
            deadline,
            Box::new(move || {
                let envelope = Envelope::response(None, timeout_id, Payload::new(ActorError::request_timeout()));
                mailbox_sink.enqueue(envelope);
            }),
        );

        self.stack.install_response_handler(id, response_behavior);
        self.pending.insert(id, PendingResponse { timeout: Some(disposable) });
        handle
    }

    /// Cancel any pending idle timer and, if the current top behavior
    /// carries one, re-arm it (§4.4: "Any envelope delivery cancels the
    /// pending idle timer and re-arms it"). Returns `Some(reason)` if the
    /// behavior's requested duration cannot be honored (§4.4: "attempting to
    /// set `d = ∞` terminates the actor with an error") — the caller is
    /// responsible for treating that as a terminal outcome, since arming
    /// happens from contexts (`ensure_started`, mid-`resume`) that cannot
    /// terminate the actor directly themselves.
    fn rearm_idle_timer(&mut self) -> Option<ExitReason> {
        if let Some(old) = self.idle_timer.take() {
            old.dispose();
        }
        let Some(spec) = self.stack.top().and_then(|b| b.idle_timeout()) else {
            return None;
        };
        let Ok(interval) = chrono::Duration::from_std(spec.duration) else {
            error!(actor = %self.id(), error = %ActorError::idle_timeout_overflow(), "idle timeout duration out of range, treating as d = infinity");
            return Some(ExitReason::RuntimeError);
        };
        let generation = self.control.next_idle_generation();
        self.idle_timer_strength = spec.strength;
        self.idle_timer = Some(Self::arm_idle_timer(
            Arc::clone(&self.clock),
            Arc::clone(&self.control),
            generation,
            interval,
            spec.strength,
            spec.cardinality,
            Arc::clone(&spec.action),
        ));
        None
    }

    /// Schedules one idle-timer firing `interval` from now; when it fires,
    /// runs `action` (unless stale or, for a weak timer, the actor has
    /// already lost its last strong ref) and, for `Cardinality::Repeat`,
    /// schedules the next firing itself — there is no `&mut self` available
    /// inside a clock-fired closure to loop through [`Self::rearm_idle_timer`]
    /// again (§4.4: "`cardinality ∈ {once, repeat}`").
    fn arm_idle_timer(
        clock: Arc<dyn Clock>,
        control: Arc<ControlBlock>,
        generation: u32,
        interval: chrono::Duration,
        strength: TimeoutStrength,
        cardinality: Cardinality,
        action: Arc<dyn Fn() + Send + Sync>,
    ) -> Disposable {
        let deadline = clock.now() + interval;
        let clock_for_closure = Arc::clone(&clock);
        clock.schedule(
            deadline,
            Box::new(move || {
                if control.current_idle_generation() != generation {
                    // Stale firing (§3 invariant); discarded.
                    return;
                }
                if strength == TimeoutStrength::Weak && !control.is_alive() {
                    return;
                }
                action();
                if cardinality == Cardinality::Repeat {
                    Self::arm_idle_timer(clock_for_closure, control, generation, interval, strength, cardinality, action);
                }
            }),
        )
    }

    /// `resume(max_throughput)` (§4.2, §4.4). The returned `usize` is how
    /// many envelopes were actually popped and dispatched this call —
    /// distinct from the [`ResumeOutcome`] itself, which answers "is there
    /// more work queued", not "did this call do anything" (e.g. an actor
    /// terminating because its behavior stack ran dry processes zero
    /// envelopes on that final call).
    pub fn resume(&mut self, max_throughput: usize) -> (ResumeOutcome, usize) {
        if !self.started {
            return (ResumeOutcome::Done, 0);
        }

        if let Some(reason) = self.pending_termination.take() {
            self.control.set_exit_reason(reason);
            return (ResumeOutcome::Terminated(reason), 0);
        }

        let mut terminal: Option<ExitReason> = None;
        let mut processed = 0usize;

        while processed < max_throughput {
            let Some(envelope) = self.next_deliverable() else {
                break;
            };
            processed += 1;
            if let Some(reason) = self.dispatch(envelope) {
                terminal = Some(reason);
                break;
            }
            if let Some(reason) = self.rearm_idle_timer() {
                terminal = Some(reason);
                break;
            }
        }

        self.stack.cleanup();

        if let Some(reason) = terminal {
            if let Some(timer) = self.idle_timer.take() {
                timer.dispose();
            }
            self.control.set_exit_reason(reason);
            return (ResumeOutcome::Terminated(reason), processed);
        }

        // A weak idle timer must not keep the actor alive once its strong
        // count reaches zero (§4.4); a strong one always blocks this exit.
        let idle_timer_pending = self.idle_timer.is_some()
            && (self.idle_timer_strength == TimeoutStrength::Strong || self.control.is_alive());

        if self.stack.is_empty() && !idle_timer_pending && self.mailbox.is_empty() && self.skip_cache.is_empty() {
            if let Some(timer) = self.idle_timer.take() {
                timer.dispose();
            }
            self.control.set_exit_reason(ExitReason::Normal);
            return (ResumeOutcome::Terminated(ExitReason::Normal), processed);
        }

        self.mailbox.mark_idle();
        let outcome = if self.mailbox.is_empty() && self.skip_cache.is_empty() {
            ResumeOutcome::Done
        } else {
            ResumeOutcome::Again
        };
        (outcome, processed)
    }

    /// Pull the next envelope this actor can make progress on: the skip
    /// cache is rescanned first so a behavior change (or a newly installed
    /// response frame) gets first crack at previously skipped envelopes
    /// (§4.4 point 2).
    fn next_deliverable(&mut self) -> Option<Envelope> {
        if let Some(pos) = self.skip_cache.iter().position(|e| self.can_dispatch(e)) {
            return self.skip_cache.remove(pos);
        }
        self.mailbox.pop()
    }

    fn can_dispatch(&self, envelope: &Envelope) -> bool {
        if envelope.is_response() {
            // Response frames are keyed by the unflagged request id (§3:
            // "correlation id ... request > 0 with high bit flagging 'is
            // response'"); the envelope itself carries the flagged id.
            if let Some(behavior) = self.stack.sync_handler(envelope.correlation_id().as_request()) {
                return behavior.matches(envelope.payload());
            }
            return false;
        }
        self.stack.top().map(|b| b.matches(envelope.payload())).unwrap_or(false)
    }

    /// Dispatch one envelope; returns `Some(reason)` if the actor should
    /// terminate.
    ///
    /// The payload is cheaply cloned (copy-on-write, §3) before being
    /// handed to the matching handler so that a `Skip` outcome can rebuild
    /// the envelope unchanged for [`ScheduledActor::skip_cache`] even
    /// though the handler closure consumed the original.
    fn dispatch(&mut self, envelope: Envelope) -> Option<ExitReason> {
        let is_response = envelope.is_response();
        // Response frames (and the pending-response table) are keyed by the
        // unflagged request id; the envelope itself carries the flagged one.
        let response_id = envelope.correlation_id().as_request();
        let (sender, correlation_id, priority, payload) = envelope.into_parts();
        let payload_for_skip = payload.clone();
        let sender_for_skip = sender.clone();

        let outcome = if is_response {
            match self.stack.sync_handler(response_id) {
                Some(behavior) => behavior.dispatch(payload, sender.clone(), correlation_id),
                None => HandlerOutcome::Skip,
            }
        } else {
            match self.stack.top() {
                Some(behavior) => behavior.dispatch(payload, sender.clone(), correlation_id),
                None => HandlerOutcome::Skip,
            }
        };

        if matches!(outcome, HandlerOutcome::Skip) {
            self.skip_cache
                .push_back(Envelope::from_parts(sender_for_skip, correlation_id, priority, payload_for_skip));
            return None;
        }

        if is_response {
            if let Some(pending) = self.pending.remove(&response_id) {
                if let Some(timer) = pending.timeout {
                    timer.dispose();
                }
            }
            self.stack.erase(response_id);
        }

        self.apply_outcome(outcome, sender, correlation_id)
    }

    fn apply_outcome(&mut self, outcome: HandlerOutcome, sender: Option<SenderHandle>, correlation_id: CorrelationId) -> Option<ExitReason> {
        let is_request = !correlation_id.is_async() && !correlation_id.is_response();
        match outcome {
            HandlerOutcome::Reply(payload) => {
                if is_request {
                    if let Some(sender) = sender {
                        sender.try_enqueue(Envelope::response(None, correlation_id, payload));
                    }
                }
                None
            }
            HandlerOutcome::Error(error) => {
                if is_request {
                    if let Some(sender) = sender {
                        sender.try_enqueue(Envelope::response(None, correlation_id, Payload::new(error)));
                    }
                } else {
                    self.run_default_handler();
                }
                None
            }
            HandlerOutcome::Void => None,
            HandlerOutcome::Skip => unreachable!("Skip is handled in dispatch() before apply_outcome is called"),
            HandlerOutcome::Delegate { target, payload, .. } => {
                // Forward: the original sender/correlation id ride along so
                // the eventual reply still reaches the original requester
                // (§4.3 "forward the envelope ... preserving the original
                // sender and correlation id").
                target.try_enqueue(Envelope::from_parts(sender, correlation_id, crate::message::Priority::Normal, payload));
                None
            }
            HandlerOutcome::Request {
                target,
                timeout,
                payload,
                response_behavior,
            } => {
                self.request_payload(&target, timeout, payload, response_behavior);
                None
            }
            HandlerOutcome::Become { behavior, keep_old } => {
                self.stack.become_behavior(behavior, keep_old);
                None
            }
            HandlerOutcome::Unbecome => {
                self.stack.unbecome();
                None
            }
            HandlerOutcome::Terminate(reason) => Some(reason),
        }
    }

    fn run_default_handler(&mut self) {
        match self.default_handler {
            DefaultHandlerStrategy::PrintAndDrop => warn!(actor = %self.id(), "unhandled error in asynchronous message, dropping"),
            DefaultHandlerStrategy::Skip => {}
            DefaultHandlerStrategy::ReflectAndQuit | DefaultHandlerStrategy::Terminate => {
                self.control.set_exit_reason(ExitReason::UnhandledException);
            }
        }
    }
}
