//! System-level error type (§7's `system` category, surfaced concretely).

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::ActorId;

/// Errors raised by [`crate::system::ActorSystem`] operations.
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    #[error("failed to spawn actor: {0}")]
    SpawnFailed(String),

    #[error("system shutdown in progress")]
    ShuttingDown,

    #[error("actor limit exceeded: current {current}, max {max}")]
    ActorLimitExceeded { current: usize, max: usize },

    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl SystemError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SystemError::ActorLimitExceeded { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SystemError::ShuttingDown)
    }

    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_limit_exceeded_is_transient_and_recoverable() {
        let err = SystemError::ActorLimitExceeded { current: 10, max: 5 };
        assert!(err.is_transient());
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn shutting_down_is_fatal() {
        let err = SystemError::ShuttingDown;
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn display_includes_actor_id() {
        let id = ActorId::next();
        let err = SystemError::ActorNotFound(id);
        assert!(err.to_string().contains("actor not found"));
    }
}
