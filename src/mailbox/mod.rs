//! Per-actor mailbox: a two-lane, multi-producer/single-consumer queue (§4.2).
//!
//! This mod.rs file only declares submodules and re-exports (teacher's §4.3
//! convention); the queue itself lives in `queue.rs`.

pub mod queue;

pub use queue::Mailbox;
