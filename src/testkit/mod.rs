//! Deterministic-fixture convenience builders used by the scenario tests in
//! `tests/` (§8's S1-S7). Left public rather than `#[cfg(test)]` since the
//! integration tests under `tests/` compile as a separate crate and can
//! only reach it that way.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::scheduler::DeterministicScheduler;
use crate::system::{ActorSystem, ConfiguredPolicy, SystemConfig, SystemError};
use crate::util::ActorId;

/// A fully deterministic system: no background threads, time only moves
/// when the test calls [`DeterministicHarness::advance`], and actors only
/// run when the test calls [`DeterministicHarness::dispatch`] (§4.8(2)).
pub struct DeterministicHarness {
    pub system: Arc<ActorSystem>,
    scheduler: DeterministicScheduler<ActorSystem>,
}

impl DeterministicHarness {
    pub fn new() -> Result<Self, SystemError> {
        let config = SystemConfig::builder()
            .with_scheduler_policy(ConfiguredPolicy::Deterministic)
            .with_max_threads(0)
            .build()
            .map_err(SystemError::ConfigError)?;
        let system = ActorSystem::new(config)?;
        let clock = match system.deterministic_clock().cloned() {
            Some(clock) => clock,
            None => unreachable!("a system built with ConfiguredPolicy::Deterministic always carries a DeterministicClock"),
        };
        let scheduler = DeterministicScheduler::new(Arc::clone(&system), clock);
        Ok(Self { system, scheduler })
    }

    /// Dispatch exactly one envelope to `id`; `true` if one was delivered.
    pub fn dispatch(&self, id: ActorId) -> bool {
        self.scheduler.dispatch_message(id)
    }

    /// Drain every currently-deliverable envelope for `id`.
    pub fn dispatch_all(&self, id: ActorId) -> usize {
        self.scheduler.dispatch_messages(id)
    }

    pub fn advance(&self, dt: std::time::Duration) -> usize {
        self.scheduler.advance_time(dt)
    }

    pub fn trigger_timeout(&self) -> usize {
        self.scheduler.trigger_timeout()
    }

    pub fn prepone_and_expect(&self, type_name: &'static str) -> crate::scheduler::Prepone<'_, ActorSystem> {
        self.scheduler.prepone_and_expect(type_name)
    }

    /// Is an envelope of this payload type sitting in `id`'s skip cache,
    /// unread because no behavior on the stack currently accepts it (§8 S4)?
    pub fn has_skipped(&self, id: ActorId, type_name: &'static str) -> bool {
        self.system.has_skipped(id, type_name)
    }
}
