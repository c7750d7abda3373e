//! Behaviors and the behavior stack (§3, §4.3).

pub mod behavior;
pub mod handler;
pub mod stack;

pub use behavior::{Behavior, Cardinality, IdleTimeoutSpec, TimeoutStrength};
pub use handler::{Handler, HandlerOutcome};
pub use stack::{BehaviorStack, Frame, FrameKind};
