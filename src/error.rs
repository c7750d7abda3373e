//! First-class error values carrying a category, code, and optional context
//! (§7 "Errors are first-class values").
//!
//! A single concrete type is used everywhere an actor-visible error needs to
//! travel as a [`crate::message::Payload`] — as a handler's `Error`
//! outcome, as a response-promise rejection, or as a request timeout — so
//! that receivers only ever need to match on [`ErrorCategory`] and a code
//! string, exactly as §8's S2 scenario does (`err.category == request &&
//! err.code == request_timeout`).

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::message::traits::Message;

/// The five error categories the core itself produces (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Scheduler/registry failures.
    System,
    /// Timeouts, missing handlers.
    Request,
    /// Encode/decode failures at the type-registry boundary.
    Serialization,
    /// Handler panics and other unexpected failures during dispatch.
    Runtime,
    /// Flow/reactive-ingress mismatches.
    Stream,
}

/// An error value that can travel as message content (§7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorError {
    category: ErrorCategory,
    code: &'static str,
    context: Option<String>,
}

impl ActorError {
    pub fn new(category: ErrorCategory, code: &'static str) -> Self {
        Self {
            category,
            code,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// §4.4: "an unhandled response timeout delivers `request_timeout`".
    pub fn request_timeout() -> Self {
        Self::new(ErrorCategory::Request, "request_timeout")
    }

    /// §4.7: a dropped pending promise's last strong reference.
    pub fn broken_promise() -> Self {
        Self::new(ErrorCategory::System, "broken_promise")
    }

    /// §4.4: "an actor processing a request that throws or panics sends
    /// back a runtime-error response".
    pub fn runtime_error(context: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Runtime, "runtime_error").with_context(context)
    }

    pub fn unexpected_message() -> Self {
        Self::new(ErrorCategory::Request, "unexpected_message")
    }

    /// §4.4: "attempting to set `d = ∞` terminates the actor with an error";
    /// §7 lists this as a `runtime`-category misconfiguration.
    pub fn idle_timeout_overflow() -> Self {
        Self::new(ErrorCategory::Runtime, "idle_timeout_overflow")
    }

    pub fn no_such_handler() -> Self {
        Self::new(ErrorCategory::Request, "no_such_handler")
    }
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.category, self.code)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({ctx})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ActorError {}

impl Message for ActorError {}
