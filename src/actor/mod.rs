//! The actor module: lifecycle trait, per-actor context, and the three
//! execution shapes the spec supports — cooperatively scheduled, blocking,
//! and typed (§4.4-§4.6).
//!
//! This mod.rs file only declares submodules and re-exports (teacher's
//! §4.3 convention).

pub mod blocking;
pub mod context;
pub mod scheduled;
pub mod traits;
pub mod typed;

pub use blocking::BlockingActor;
pub use context::ActorContext;
pub use scheduled::{LinkExit, ResumeOutcome, ScheduledActor};
pub use traits::{Actor, DefaultHandlerStrategy, ErrorAction};
pub use typed::{send, request, Signature, TypedRequestHandle};
