//! # caldera-rt — a message-passing actor runtime
//!
//! Mailboxes, dynamic behaviors, request/response correlation, and a
//! deterministic scheduler for tests.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use caldera_rt::prelude::*;
//! use async_trait::async_trait;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Ping;
//! impl Message for Ping {}
//!
//! struct Pinger;
//!
//! #[async_trait]
//! impl Actor for Pinger {
//!     type Error = std::convert::Infallible;
//!
//!     async fn pre_start(&mut self, _ctx: &mut ActorContext) -> Result<Behavior, Self::Error> {
//!         Ok(Behavior::new().with_handler(Handler::new::<Ping, _>(|_| HandlerOutcome::Void)))
//!     }
//! }
//!
//! let system = ActorSystem::new(SystemConfig::default())?;
//! let handle = system.spawn(Pinger, SpawnOptions::new())?;
//! handle.as_sender().try_enqueue(Envelope::async_message(None, Priority::Normal, Payload::new(Ping)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module organization
//!
//! - [`message`] — payloads, envelopes, priority lanes (bottom of the
//!   dependency graph; everything else builds on this)
//! - [`mailbox`] — the two-lane per-actor queue
//! - [`control`] — control block, address/handle/typed-handle, `actor_cast`
//! - [`behavior`] — handler registration and the behavior stack
//! - [`promise`] — response promises and request continuations
//! - [`clock`] — the timer heap and its two `Clock` implementors
//! - [`actor`] — the `Actor` trait and its three execution shapes
//!   (cooperatively scheduled, blocking, typed)
//! - [`scheduler`] — the cooperative work-stealing pool and the
//!   single-thread deterministic scheduler used by tests
//! - [`system`] — `ActorSystem`: registry, config, spawn
//! - [`error`] — the first-class `ActorError` value
//! - [`testkit`] — deterministic-fixture builders, used by this crate's own
//!   integration tests

pub mod actor;
pub mod behavior;
pub mod clock;
pub mod control;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod promise;
pub mod scheduler;
pub mod system;
pub mod testkit;
pub mod util;

pub mod prelude;

pub use actor::{Actor, ActorContext, DefaultHandlerStrategy, ErrorAction};
pub use behavior::{Behavior, HandlerOutcome};
pub use control::{Address, ExitReason, Handle, TypedHandle};
pub use error::{ActorError, ErrorCategory};
pub use message::{Envelope, Message, Payload, Priority};
pub use system::{ActorSystem, SpawnOptions, SystemConfig, SystemError};
