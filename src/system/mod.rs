//! The system layer: config, errors, the actor registry, spawn options, and
//! `ActorSystem` itself (§5, §6, §4.8).
//!
//! This mod.rs file only declares submodules and re-exports (teacher's
//! §4.3 convention).

pub mod config;
pub mod errors;
pub mod registry;
pub mod spawn;
pub mod system;

pub use config::{ConfiguredPolicy, SystemConfig, SystemConfigBuilder};
pub use errors::SystemError;
pub use registry::{ActorRegistry, SharedRegistry};
pub use spawn::SpawnOptions;
pub use system::ActorSystem;
