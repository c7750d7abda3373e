//! Per-actor context handed to lifecycle hooks and captured by handler
//! closures (§4.4).

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Duration as ChronoDuration;

// Layer 3: Internal module imports
use crate::clock::Clock;
use crate::control::Address;
use crate::message::{Message, Payload, Priority, SenderHandle};
use crate::promise::{RequestHandle, ResponsePromise};
use crate::util::{ActorId, CorrelationId};

/// The capabilities an actor needs while building its behavior or reacting
/// to lifecycle events: who am I, what's the time, how do I start a
/// request.
#[derive(Clone)]
pub struct ActorContext {
    id: ActorId,
    home_system: u64,
    self_sender: SenderHandle,
    self_address: Address,
    clock: Arc<dyn Clock>,
}

impl ActorContext {
    pub fn new(self_address: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: self_address.id(),
            home_system: self_address.control_block().home_system(),
            self_sender: self_address.as_sender(),
            self_address,
            clock,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn home_system(&self) -> u64 {
        self.home_system
    }

    pub fn address(&self) -> Address {
        self.self_address.clone()
    }

    pub fn self_sender(&self) -> SenderHandle {
        self.self_sender.clone()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Build a fresh response promise for the request currently being
    /// handled (§4.7). `correlation_id` is the incoming envelope's id.
    pub fn make_response_promise(&self, sender: Option<SenderHandle>, correlation_id: CorrelationId) -> ResponsePromise {
        ResponsePromise::new(sender, correlation_id)
    }

    /// `request(target, timeout, payload)` (§4.4): allocate a correlation
    /// id, build the request envelope, and return the handle. Installing the
    /// response frame / timeout bookkeeping is the caller's job via
    /// [`crate::actor::scheduled::ScheduledActor::request`] (or, for a
    /// handler returning `HandlerOutcome::Request`,
    /// `ScheduledActor::apply_outcome`) — this method only builds, keeping
    /// `actor::context` free of a dependency on `actor::scheduled`.
    pub fn send_request<T: Message>(&self, target: &SenderHandle, timeout: Duration, payload: T) -> (RequestHandle, crate::message::Envelope) {
        let _ = target;
        self.send_request_payload(timeout, Payload::new(payload))
    }

    /// Like [`Self::send_request`], but takes an already type-erased
    /// [`Payload`] — the path `HandlerOutcome::Request` uses, since a
    /// handler only has a `Payload` in hand, not the original `T`.
    pub fn send_request_payload(&self, timeout: Duration, payload: Payload) -> (RequestHandle, crate::message::Envelope) {
        let correlation_id = CorrelationId::next_request();
        let deadline = self.now()
            + ChronoDuration::from_std(timeout).unwrap_or_else(|_| ChronoDuration::milliseconds(0));
        let envelope = crate::message::Envelope::request(Some(self.self_sender.clone()), correlation_id, Priority::Normal, payload);
        (RequestHandle::new(correlation_id, deadline), envelope)
    }

    pub fn send_async<T: Message>(&self, target: &SenderHandle, priority: Priority, payload: T) {
        let envelope = crate::message::Envelope::async_message(Some(self.self_sender.clone()), priority, Payload::new(payload));
        target.try_enqueue(envelope);
    }
}
