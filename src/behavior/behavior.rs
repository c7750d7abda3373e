//! A behavior: an ordered list of handlers plus an optional idle timeout
//! (§3 "Behavior").

// Layer 1: Standard library imports
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::handler::{Handler, HandlerOutcome};
use crate::message::{Payload, SenderHandle};
use crate::util::CorrelationId;

/// Whether an idle timer keeps the actor alive by itself (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStrength {
    /// Keeps the actor alive even at zero strong refs.
    Strong,
    /// Does not keep the actor alive once its strong count reaches zero.
    Weak,
}

/// Whether an idle timer fires once or rearms itself (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Once,
    Repeat,
}

/// `(duration, closure)` idle timeout carried by a behavior (§3, §4.4).
#[derive(Clone)]
pub struct IdleTimeoutSpec {
    pub duration: Duration,
    pub strength: TimeoutStrength,
    pub cardinality: Cardinality,
    pub action: Arc<dyn Fn() + Send + Sync>,
}

impl fmt::Debug for IdleTimeoutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleTimeoutSpec")
            .field("duration", &self.duration)
            .field("strength", &self.strength)
            .field("cardinality", &self.cardinality)
            .finish()
    }
}

/// An ordered set of typed handlers plus an optional idle timeout (§3).
#[derive(Default)]
pub struct Behavior {
    handlers: Vec<Handler>,
    idle_timeout: Option<IdleTimeoutSpec>,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn with_idle_timeout(mut self, spec: IdleTimeoutSpec) -> Self {
        self.idle_timeout = Some(spec);
        self
    }

    pub fn idle_timeout(&self) -> Option<&IdleTimeoutSpec> {
        self.idle_timeout.as_ref()
    }

    /// First handler whose input signature unifies with the payload wins
    /// (§4.3 "Matching is ordered"). `sender`/`correlation_id` are the
    /// originating envelope's, passed through so a handler built with
    /// [`Handler::new_with_request`] can build a response promise (§4.7).
    pub fn dispatch(&self, payload: Payload, sender: Option<SenderHandle>, correlation_id: CorrelationId) -> HandlerOutcome {
        for handler in &self.handlers {
            if handler.matches(&payload) {
                return handler.invoke(payload, sender, correlation_id);
            }
        }
        HandlerOutcome::Skip
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        self.handlers.iter().any(|h| h.matches(payload))
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("handlers", &self.handlers.len())
            .field("has_idle_timeout", &self.idle_timeout.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::handler::Handler;

    #[test]
    fn dispatches_to_first_matching_handler() {
        let behavior = Behavior::new()
            .with_handler(Handler::new::<i32, _>(|_| HandlerOutcome::Reply(Payload::new("int"))))
            .with_handler(Handler::catch_all(|_| HandlerOutcome::Reply(Payload::new("any"))));

        match behavior.dispatch(Payload::new(1i32), None, CorrelationId::ASYNC) {
            HandlerOutcome::Reply(p) => assert_eq!(p.downcast_ref::<&str>(), Some(&"int")),
            other => panic!("{other:?}"),
        }
        match behavior.dispatch(Payload::new(1.5f64), None, CorrelationId::ASYNC) {
            HandlerOutcome::Reply(p) => assert_eq!(p.downcast_ref::<&str>(), Some(&"any")),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn unmatched_payload_skips() {
        let behavior = Behavior::new().with_handler(Handler::new::<i32, _>(|_| HandlerOutcome::Void));
        assert!(matches!(behavior.dispatch(Payload::new("nope"), None, CorrelationId::ASYNC), HandlerOutcome::Skip));
    }
}
