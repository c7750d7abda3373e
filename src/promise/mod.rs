//! Response promises and request continuations (§4.7, §4.4's response
//! handle).

// Layer 1: Standard library imports
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use tokio::sync::watch;

// Layer 3: Internal module imports
use crate::behavior::{Behavior, Handler, HandlerOutcome};
use crate::error::ActorError;
use crate::message::{Envelope, Message, Payload, SenderHandle};
use crate::util::CorrelationId;

struct PromiseInner {
    sender: Option<SenderHandle>,
    correlation_id: CorrelationId,
    delivered: AtomicBool,
}

/// A deferred reply to a request (§4.7).
///
/// States: *pending* (the default — `delivered == false`), *fulfilled*
/// (`deliver` was called), *broken* (the last strong reference dropped
/// while still pending, synthesizing a `broken_promise` error to the
/// original sender).
pub struct ResponsePromise {
    inner: Arc<PromiseInner>,
}

impl ResponsePromise {
    pub fn new(sender: Option<SenderHandle>, correlation_id: CorrelationId) -> Self {
        Self {
            inner: Arc::new(PromiseInner {
                sender,
                correlation_id,
                delivered: AtomicBool::new(false),
            }),
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.inner.correlation_id
    }

    pub fn is_pending(&self) -> bool {
        !self.inner.delivered.load(Ordering::SeqCst)
    }

    /// `deliver(value)`: produces exactly one response envelope keyed by the
    /// captured correlation id (§4.7).
    pub fn deliver<T: Message>(self, value: T) {
        self.deliver_payload(Payload::new(value));
    }

    pub fn deliver_error(self, error: ActorError) {
        self.deliver_payload(Payload::new(error));
    }

    fn deliver_payload(self, payload: Payload) {
        self.inner.delivered.store(true, Ordering::SeqCst);
        if let Some(sender) = &self.inner.sender {
            let envelope = Envelope::response(None, self.inner.correlation_id, payload);
            sender.try_enqueue(envelope);
        }
    }

    /// `delegate(target, args...)`: transfer the obligation to `target`; a
    /// reply `target` later sends for this same correlation id reaches the
    /// original sender directly (§4.7).
    pub fn delegate(self, target: &SenderHandle, payload: Payload) {
        self.inner.delivered.store(true, Ordering::SeqCst);
        let envelope = Envelope::request(
            self.inner.sender.clone(),
            self.inner.correlation_id,
            crate::message::Priority::Normal,
            payload,
        );
        target.try_enqueue(envelope);
    }
}

impl Clone for ResponsePromise {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for ResponsePromise {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 && self.is_pending() {
            self.inner.delivered.store(true, Ordering::SeqCst);
            if let Some(sender) = &self.inner.sender {
                let envelope = Envelope::response(None, self.inner.correlation_id, Payload::new(ActorError::broken_promise()));
                sender.try_enqueue(envelope);
            }
        }
    }
}

impl fmt::Debug for ResponsePromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponsePromise")
            .field("correlation_id", &self.inner.correlation_id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// The handle returned by `request(...)` (§4.4).
///
/// Carries enough to build the response-frame [`Behavior`] for `.then`, the
/// transient skip-all-but-this-id top frame for `.await`, and a
/// `tokio::sync::watch`-backed observable for `.as_observable`/`.as_single`.
/// The owning [`crate::actor::scheduled::ScheduledActor`] is responsible for
/// installing whichever of these it produces into its own behavior stack
/// and pending-response table — this type stays free of that dependency so
/// `promise` sits below `actor` in the module graph.
pub struct RequestHandle {
    correlation_id: CorrelationId,
    deadline: DateTime<Utc>,
}

impl RequestHandle {
    pub fn new(correlation_id: CorrelationId, deadline: DateTime<Utc>) -> Self {
        Self {
            correlation_id,
            deadline,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// `.then(success, fail)`: the response-frame behavior to install via
    /// `BehaviorStack::install_response_handler(id, behavior)`. `fail` runs
    /// both for an error-valued reply and (driven by the caller noticing the
    /// deadline has passed) for a timeout.
    pub fn then<S, F>(&self, success: S, fail: F) -> Behavior
    where
        S: Fn(Payload) -> HandlerOutcome + Send + Sync + 'static,
        F: Fn(ActorError) -> HandlerOutcome + Send + Sync + 'static,
    {
        Self::response_behavior(success, fail)
    }

    /// Same behavior `.then` builds, usable before a [`RequestHandle`]
    /// exists — e.g. inside a running handler that returns
    /// `HandlerOutcome::Request` and needs the response frame up front
    /// (§4.4, §4.7).
    pub fn response_behavior<S, F>(success: S, fail: F) -> Behavior
    where
        S: Fn(Payload) -> HandlerOutcome + Send + Sync + 'static,
        F: Fn(ActorError) -> HandlerOutcome + Send + Sync + 'static,
    {
        Behavior::new().with_handler(Handler::catch_all(move |payload| {
            if let Some(err) = payload.downcast_ref::<ActorError>() {
                fail(err.clone())
            } else {
                success(payload)
            }
        }))
    }

    /// `.await(success, fail)`: like `.then`, plus a transient top-of-stack
    /// behavior that skips every envelope whose correlation id is not this
    /// one, preserving arrival order for everything else (§4.4, §9: "an
    /// explicit 'awaiting id' state on the stack frame").
    pub fn awaiting_skip_frame(&self) -> Behavior {
        Self::skip_frame()
    }

    /// Same frame `.awaiting_skip_frame` builds, usable without an instance.
    pub fn skip_frame() -> Behavior {
        Behavior::new().with_handler(Handler::catch_all(|_payload| HandlerOutcome::Skip))
    }

    /// `.as_observable()` / `.as_single()`: a reactive source emitting the
    /// reply (§4.4), backed by `tokio::sync::watch` since a full flow
    /// library is out of scope (§1). Mirrors `.then()`'s shape: the returned
    /// [`Behavior`] is the response frame the caller installs via
    /// `request(...)`/`install_request`, and the receiver observes whatever
    /// that frame sends once the reply (or timeout) arrives — exactly one
    /// emission per request, either a [`ReplyOutcome::Value`] or a
    /// [`ReplyOutcome::Error`].
    pub fn as_observable(&self) -> (Behavior, watch::Receiver<Option<ReplyOutcome>>) {
        let (tx, rx) = watch::channel(None);
        let tx_success = tx.clone();
        let behavior = Self::response_behavior(
            move |payload| {
                let _ = tx_success.send(Some(ReplyOutcome::Value(payload)));
                HandlerOutcome::Void
            },
            move |error| {
                let _ = tx.send(Some(ReplyOutcome::Error(error)));
                HandlerOutcome::Void
            },
        );
        (behavior, rx)
    }
}

/// The value delivered through `.as_observable()` / `.as_single()`.
#[derive(Debug, Clone)]
pub enum ReplyOutcome {
    Value(Payload),
    Error(ActorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivering_marks_fulfilled() {
        let promise = ResponsePromise::new(None, CorrelationId::next_request());
        assert!(promise.is_pending());
        promise.deliver(42i32);
    }

    #[test]
    fn dropping_a_pending_promise_does_not_panic() {
        let promise = ResponsePromise::new(None, CorrelationId::next_request());
        drop(promise);
    }

    #[test]
    fn clone_keeps_pending_until_last_drop() {
        let promise = ResponsePromise::new(None, CorrelationId::next_request());
        let clone = promise.clone();
        drop(promise);
        assert!(clone.is_pending());
    }
}
