//! Convenience re-exports for building on top of `caldera-rt`.
//!
//! ```rust
//! use caldera_rt::prelude::*;
//! ```

// Actor
pub use crate::actor::{
    send, request, Actor, ActorContext, BlockingActor, DefaultHandlerStrategy, ErrorAction, ResumeOutcome, Signature,
    TypedRequestHandle,
};

// Behavior
pub use crate::behavior::{Behavior, Cardinality, Handler, HandlerOutcome, IdleTimeoutSpec, TimeoutStrength};

// Control
pub use crate::control::{actor_cast, Address, ExitReason, Handle, Interface, Subset, TypedHandle};

// Messaging
pub use crate::message::{Envelope, EnvelopeSink, Message, Payload, Priority, SenderHandle};

// Promises
pub use crate::promise::{RequestHandle, ResponsePromise};

// Clock
pub use crate::clock::{Clock, DeterministicClock, SystemClock};

// Scheduler
pub use crate::scheduler::{CooperativeScheduler, DeterministicScheduler, Dispatch, Runnable, SchedulerPolicy};

// System
pub use crate::system::{ActorRegistry, ActorSystem, ConfiguredPolicy, SpawnOptions, SystemConfig, SystemError};

// Errors
pub use crate::error::{ActorError, ErrorCategory};

// Utilities
pub use crate::util::{ActorId, CorrelationId};
