//! Process-wide identifiers shared across the actor system.
//!
//! This mod.rs file contains only module declarations and re-exports (the
//! teacher crate's §4.3 convention); implementation lives in `ids.rs`.

pub mod ids;

pub use ids::{ActorId, CorrelationId};
