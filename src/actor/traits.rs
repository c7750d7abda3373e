//! The user-facing `Actor` trait (§2 "Scheduled actor", §9: actor
//! capabilities as independent structs rather than a mixin hierarchy).
//!
//! Unlike a single `handle_message` callback, an actor here hands the
//! runtime its *initial behavior* — an ordered set of typed handlers — and
//! the dynamic-dispatch machinery in [`crate::behavior`] takes it from
//! there. `pre_start`/`post_stop`/`on_error` still follow the lifecycle
//! shape of a conventional actor trait.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::context::ActorContext;
use crate::behavior::Behavior;
use crate::control::ExitReason;

/// What should happen after `on_error` is consulted (§7 default strategies
/// map onto this for asynchronous messages; request-handler errors always
/// become an error response regardless of this value).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorAction {
    #[default]
    Stop,
    Resume,
    Restart,
    Escalate,
}

/// §7 "Default strategies" for an asynchronous message whose handler raised
/// an error and therefore produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultHandlerStrategy {
    #[default]
    PrintAndDrop,
    Skip,
    ReflectAndQuit,
    Terminate,
}

/// An actor: private state plus the behavior it starts with.
#[async_trait]
pub trait Actor: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build the initial behavior. Runs once before the first envelope is
    /// dispatched (or, for `lazy_init` spawns, before the *first* envelope
    /// specifically — see §4.8).
    async fn pre_start(&mut self, ctx: &mut ActorContext) -> Result<Behavior, Self::Error>;

    /// Runs once the actor's exit reason has been set, after the mailbox is
    /// closed and drained (§7 "User-visible failure behavior").
    async fn post_stop(&mut self, ctx: &mut ActorContext, reason: ExitReason) {
        let _ = ctx;
        let _ = reason;
    }

    /// Consulted when a handler invocation itself raises `Self::Error`
    /// outside the request/reply path (panics are handled separately by the
    /// scheduler and always terminate with `runtime_error`, §4.4).
    async fn on_error(&mut self, ctx: &mut ActorContext, error: Self::Error) -> ErrorAction {
        let _ = ctx;
        let _ = error;
        ErrorAction::Stop
    }
}

impl fmt::Debug for ErrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(
            match self {
                ErrorAction::Stop => "stop",
                ErrorAction::Resume => "resume",
                ErrorAction::Restart => "restart",
                ErrorAction::Escalate => "escalate",
            },
            f,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_error_action_is_stop() {
        assert_eq!(ErrorAction::default(), ErrorAction::Stop);
    }

    #[test]
    fn default_handler_strategy_is_print_and_drop() {
        assert_eq!(DefaultHandlerStrategy::default(), DefaultHandlerStrategy::PrintAndDrop);
    }
}
