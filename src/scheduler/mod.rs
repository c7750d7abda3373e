//! Two scheduler variants sharing the same `resume` contract: a cooperative
//! work-stealing pool for production, a single-thread deterministic fixture
//! for tests (§4.8).
//!
//! This mod.rs file only declares submodules and re-exports (teacher's
//! §4.3 convention).

pub mod cooperative;
pub mod deterministic;

pub use cooperative::{CooperativeScheduler, Runnable, SchedulerPolicy};
pub use deterministic::{DeterministicScheduler, Dispatch, Prepone};
