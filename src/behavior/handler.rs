//! A single typed handler and the outcomes it can return (§3 "Behavior",
//! §4.3's dispatch-outcome table).

// Layer 1: Standard library imports
use std::any::TypeId;
use std::fmt;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::behavior::Behavior;
use crate::control::ExitReason;
use crate::error::ActorError;
use crate::message::{Message, Payload, SenderHandle};
use crate::util::CorrelationId;

/// What a handler invocation produced (§4.3's dispatch-outcome table).
pub enum HandlerOutcome {
    /// Reply with a new payload.
    Reply(Payload),
    /// Reply with an error value.
    Error(ActorError),
    /// No reply, handled.
    Void,
    /// Put the envelope back at the head of its lane, unchanged.
    Skip,
    /// Forward the envelope to `target`, preserving sender and correlation id.
    Delegate { target: SenderHandle, payload: Payload },
    /// Issue a nested `request(target, timeout, payload)` from within a
    /// running handler, installing `response_behavior` as the response
    /// frame for the reply (§4.4, §4.7). A handler has no direct access to
    /// the owning [`crate::actor::scheduled::ScheduledActor`] — `&mut self`
    /// there is only reachable from `resume`'s own call stack — so the
    /// request is carried out as an effect and performed by
    /// `ScheduledActor::apply_outcome` once the handler returns.
    Request {
        target: SenderHandle,
        timeout: Duration,
        payload: Payload,
        response_behavior: Behavior,
    },
    /// Replace the active behavior (§4.3 `become(behavior, keep_old)`). Same
    /// as [`HandlerOutcome::Request`]: a handler closure only sees the
    /// payload, never `&mut ScheduledActor`, so the new behavior travels
    /// back as a value and `ScheduledActor::apply_outcome` installs it.
    Become { behavior: Behavior, keep_old: bool },
    /// Pop the top asynchronous frame, restoring whatever was beneath it
    /// (§4.3 `unbecome()`).
    Unbecome,
    /// Stop the actor with `reason` (§9: "`quit` ... represented as a
    /// handler-return value unwound by the scheduler's resume loop").
    Terminate(ExitReason),
}

impl fmt::Debug for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerOutcome::Reply(p) => write!(f, "Reply({})", p.type_name()),
            HandlerOutcome::Error(e) => write!(f, "Error({e})"),
            HandlerOutcome::Void => write!(f, "Void"),
            HandlerOutcome::Skip => write!(f, "Skip"),
            HandlerOutcome::Delegate { target, .. } => write!(f, "Delegate({target:?})"),
            HandlerOutcome::Request { target, timeout, .. } => write!(f, "Request({target:?}, {timeout:?})"),
            HandlerOutcome::Become { keep_old, .. } => write!(f, "Become(keep_old={keep_old})"),
            HandlerOutcome::Unbecome => write!(f, "Unbecome"),
            HandlerOutcome::Terminate(reason) => write!(f, "Terminate({reason})"),
        }
    }
}

enum Matcher {
    Exact(TypeId),
    CatchAll,
}

/// `(input_signature -> output_signature, invoke)` (§3 "Behavior").
///
/// `invoke` is erased to `Fn(Payload, Option<SenderHandle>, CorrelationId) ->
/// HandlerOutcome`; the typed constructors in [`Handler::new`] and
/// [`Handler::new_with_request`] handle the downcast so callers write
/// ordinary `Fn(T) -> HandlerOutcome` or `Fn(T, Option<SenderHandle>,
/// CorrelationId) -> HandlerOutcome` closures.
pub struct Handler {
    matcher: Matcher,
    type_name: &'static str,
    invoke: Box<dyn Fn(Payload, Option<SenderHandle>, CorrelationId) -> HandlerOutcome + Send + Sync>,
}

impl Handler {
    /// A handler matching exactly payload type `T`.
    pub fn new<T, F>(handler: F) -> Self
    where
        T: Message,
        F: Fn(T) -> HandlerOutcome + Send + Sync + 'static,
    {
        Self {
            matcher: Matcher::Exact(TypeId::of::<T>()),
            type_name: std::any::type_name::<T>(),
            invoke: Box::new(move |payload, _sender, _correlation_id| match payload.into_inner::<T>() {
                Ok(value) => handler(value),
                Err(_mismatched) => HandlerOutcome::Skip,
            }),
        }
    }

    /// A handler matching exactly payload type `T`, additionally given the
    /// envelope's sender and correlation id — needed to build a
    /// [`crate::promise::ResponsePromise`] directly via
    /// `ResponsePromise::new(sender, correlation_id)` (§4.7: "A promise is
    /// created by a handler to delay its reply").
    pub fn new_with_request<T, F>(handler: F) -> Self
    where
        T: Message,
        F: Fn(T, Option<SenderHandle>, CorrelationId) -> HandlerOutcome + Send + Sync + 'static,
    {
        Self {
            matcher: Matcher::Exact(TypeId::of::<T>()),
            type_name: std::any::type_name::<T>(),
            invoke: Box::new(move |payload, sender, correlation_id| match payload.into_inner::<T>() {
                Ok(value) => handler(value, sender, correlation_id),
                Err(_mismatched) => HandlerOutcome::Skip,
            }),
        }
    }

    /// A handler that matches any payload (§4.3 "a catch-all handler
    /// matches any payload").
    pub fn catch_all<F>(handler: F) -> Self
    where
        F: Fn(Payload) -> HandlerOutcome + Send + Sync + 'static,
    {
        Self {
            matcher: Matcher::CatchAll,
            type_name: "<catch-all>",
            invoke: Box::new(move |payload, _sender, _correlation_id| handler(payload)),
        }
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        match self.matcher {
            Matcher::Exact(type_id) => payload.type_id() == type_id,
            Matcher::CatchAll => true,
        }
    }

    pub fn invoke(&self, payload: Payload, sender: Option<SenderHandle>, correlation_id: CorrelationId) -> HandlerOutcome {
        (self.invoke)(payload, sender, correlation_id)
    }

    pub fn signature(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_handler_matches_only_its_type() {
        let handler = Handler::new::<i32, _>(|n| HandlerOutcome::Reply(Payload::new(n * 2)));
        assert!(handler.matches(&Payload::new(1i32)));
        assert!(!handler.matches(&Payload::new("hi")));
    }

    #[test]
    fn catch_all_matches_everything() {
        let handler = Handler::catch_all(|_| HandlerOutcome::Void);
        assert!(handler.matches(&Payload::new(1i32)));
        assert!(handler.matches(&Payload::new("hi")));
    }

    #[test]
    fn invoke_runs_the_closure() {
        let handler = Handler::new::<i32, _>(|n| HandlerOutcome::Reply(Payload::new(n + 1)));
        match handler.invoke(Payload::new(41i32), None, CorrelationId::ASYNC) {
            HandlerOutcome::Reply(p) => assert_eq!(p.downcast_ref::<i32>(), Some(&42)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn new_with_request_exposes_sender_and_correlation_id() {
        let handler = Handler::new_with_request::<i32, _>(|n, sender, correlation_id| {
            HandlerOutcome::Reply(Payload::new((n, sender.is_some(), correlation_id.is_async())))
        });
        match handler.invoke(Payload::new(1i32), None, CorrelationId::ASYNC) {
            HandlerOutcome::Reply(p) => assert_eq!(p.downcast_ref::<(i32, bool, bool)>(), Some(&(1, false, true))),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
