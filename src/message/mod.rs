//! Message system: payloads, envelopes, priority lanes, and the wire-id registry.
//!
//! This module sits at the bottom of the dependency graph — it depends only
//! on `util` — so that both the mailbox and control-block modules can depend
//! on it without creating a cycle between "a thing that can receive an
//! envelope" and "a thing that can be addressed".

pub mod envelope;
pub mod payload;
pub mod priority;
pub mod registry;
pub mod traits;

pub use envelope::{EnqueueOutcome, Envelope, EnvelopeSink, SenderHandle};
pub use payload::Payload;
pub use priority::Priority;
pub use registry::{SerializationError, TypeRegistry};
pub use traits::Message;
