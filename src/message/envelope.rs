//! Envelopes: the unit of delivery between actors (§3 "Envelope").
//!
//! An envelope owns its payload uniquely (§3 invariant: "Every envelope in
//! any mailbox has a unique owner"); nothing here is `Copy`, and cloning an
//! envelope is never exposed on the public surface — only a [`Payload`]
//! (itself copy-on-write) can be cloned.

// Layer 1: Standard library imports
use std::fmt;
use std::sync::Weak;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
use super::payload::Payload;
use super::priority::Priority;
use crate::util::{ActorId, CorrelationId};

/// Object-safe delivery target for an [`Envelope`].
///
/// Both the mailbox module (concrete delivery) and the control-block module
/// (addresses that need to hand out a reply target without depending on the
/// mailbox's concrete type) depend on this trait; neither depends on the
/// other, which keeps the module graph acyclic.
pub trait EnvelopeSink: Send + Sync {
    /// Accept an envelope for delivery. See [`EnqueueOutcome`] for what the
    /// return value means to the caller.
    fn enqueue(&self, envelope: Envelope) -> EnqueueOutcome;

    /// Has this sink already been closed (§4.2 `close`)?
    fn is_closed(&self) -> bool;
}

/// Result of [`EnvelopeSink::enqueue`] (§4.2).
#[derive(Debug)]
pub enum EnqueueOutcome {
    /// The mailbox transitioned from empty-and-unscheduled to non-empty; the
    /// caller (typically the scheduler) must schedule the actor.
    ScheduledNow,
    /// The mailbox was already non-empty or the actor already scheduled;
    /// no extra scheduling action is needed.
    AlreadyScheduled,
    /// The mailbox was closed; the envelope was not delivered. Carries the
    /// envelope back so the sender can synthesize an error response.
    Rejected(Envelope),
}

impl EnqueueOutcome {
    /// True for `ScheduledNow`/`AlreadyScheduled`, false for `Rejected`.
    pub fn was_delivered(&self) -> bool {
        !matches!(self, EnqueueOutcome::Rejected(_))
    }
}

impl PartialEq for EnqueueOutcome {
    /// Compares discriminants only; `Rejected` envelopes are never equal by
    /// payload identity, only by "this was a rejection".
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (EnqueueOutcome::ScheduledNow, EnqueueOutcome::ScheduledNow)
                | (EnqueueOutcome::AlreadyScheduled, EnqueueOutcome::AlreadyScheduled)
                | (EnqueueOutcome::Rejected(_), EnqueueOutcome::Rejected(_))
        )
    }
}

impl Eq for EnqueueOutcome {}

/// A lightweight, cloneable reference to an actor that can receive a reply.
///
/// This is the piece of "who sent this" that rides inside an [`Envelope`]
/// without pulling the full control-block/reference-counting machinery into
/// the message layer. [`crate::control::Address`] wraps one of these and
/// adds ref-counted liveness tracking on top.
#[derive(Clone)]
pub struct SenderHandle {
    id: ActorId,
    sink: Weak<dyn EnvelopeSink>,
}

impl SenderHandle {
    /// Construct from a target's id and a weak handle to its delivery sink.
    pub fn new(id: ActorId, sink: Weak<dyn EnvelopeSink>) -> Self {
        Self { id, sink }
    }

    /// The id of the actor this handle refers to.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Attempt delivery; `None` if the target's mailbox has already been
    /// dropped (actor fully destroyed).
    pub fn try_enqueue(&self, envelope: Envelope) -> Option<EnqueueOutcome> {
        self.sink.upgrade().map(|sink| sink.enqueue(envelope))
    }
}

impl fmt::Debug for SenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenderHandle({})", self.id)
    }
}

impl PartialEq for SenderHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SenderHandle {}

/// The wrapper that actually travels through mailboxes (§3 "Envelope").
pub struct Envelope {
    sender: Option<SenderHandle>,
    correlation_id: CorrelationId,
    priority: Priority,
    payload: Payload,
    enqueued_at: DateTime<Utc>,
}

impl Envelope {
    /// Build a fire-and-forget envelope (`correlation_id` = `ASYNC`).
    pub fn async_message(sender: Option<SenderHandle>, priority: Priority, payload: Payload) -> Self {
        Self {
            sender,
            correlation_id: CorrelationId::ASYNC,
            priority,
            payload,
            enqueued_at: Utc::now(),
        }
    }

    /// Build a request envelope carrying a fresh correlation id.
    pub fn request(
        sender: Option<SenderHandle>,
        correlation_id: CorrelationId,
        priority: Priority,
        payload: Payload,
    ) -> Self {
        debug_assert!(!correlation_id.is_response());
        Self {
            sender,
            correlation_id,
            priority,
            payload,
            enqueued_at: Utc::now(),
        }
    }

    /// Build the response envelope for a given request's correlation id.
    pub fn response(
        sender: Option<SenderHandle>,
        request_correlation_id: CorrelationId,
        payload: Payload,
    ) -> Self {
        Self {
            sender,
            correlation_id: request_correlation_id.as_response(),
            priority: Priority::Normal,
            payload,
            enqueued_at: Utc::now(),
        }
    }

    pub fn sender(&self) -> Option<&SenderHandle> {
        self.sender.as_ref()
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Consume the envelope, yielding its parts for dispatch.
    pub fn into_parts(self) -> (Option<SenderHandle>, CorrelationId, Priority, Payload) {
        (self.sender, self.correlation_id, self.priority, self.payload)
    }

    /// Reconstruct an envelope from parts without reinterpreting the
    /// correlation id (unlike [`Envelope::request`]/[`Envelope::response`]).
    /// Used to rebuild an envelope unchanged after a handler returns the
    /// skip marker (§4.3 `put_back`).
    pub fn from_parts(sender: Option<SenderHandle>, correlation_id: CorrelationId, priority: Priority, payload: Payload) -> Self {
        Self {
            sender,
            correlation_id,
            priority,
            payload,
            enqueued_at: Utc::now(),
        }
    }

    /// Is this envelope a request awaiting a reply?
    pub fn is_request(&self) -> bool {
        !self.correlation_id.is_async() && !self.correlation_id.is_response()
    }

    /// Is this envelope itself a reply to an earlier request?
    pub fn is_response(&self) -> bool {
        self.correlation_id.is_response()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("sender", &self.sender)
            .field("correlation_id", &self.correlation_id)
            .field("priority", &self.priority)
            .field("payload_type", &self.payload.type_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn async_envelope_has_async_correlation_id() {
        let env = Envelope::async_message(None, Priority::Normal, Payload::new(1i32));
        assert!(!env.is_request());
        assert!(!env.is_response());
        assert!(env.correlation_id().is_async());
    }

    #[test]
    fn request_and_response_mirror_correlation_ids() {
        let req_id = CorrelationId::next_request();
        let req = Envelope::request(None, req_id, Priority::Normal, Payload::new(1i32));
        assert!(req.is_request());

        let resp = Envelope::response(None, req.correlation_id(), Payload::new(2i32));
        assert!(resp.is_response());
        assert_eq!(resp.correlation_id().as_request(), req_id);
    }
}
