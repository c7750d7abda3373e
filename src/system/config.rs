//! System-wide configuration, matching the `scheduler.*`/`registry.*`/
//! `idle-timeout.*` keys of §6.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::scheduler::SchedulerPolicy;

/// Default envelopes processed per `resume` call.
pub const DEFAULT_MAX_THROUGHPUT: usize = 100;

/// Default worker count for the cooperative policies.
pub const DEFAULT_MAX_THREADS: usize = 4;

/// Default idle timeout applied when a behavior doesn't set its own.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// `scheduler.policy` (§6): `deterministic` has no worker-pool configuration
/// of its own, so it's kept out of [`SchedulerPolicy`] (a cooperative-only
/// type) and represented here as a third config-level variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfiguredPolicy {
    Sharing,
    Stealing,
    Deterministic,
}

impl ConfiguredPolicy {
    /// `None` for `deterministic` — there is no worker pool to configure.
    pub fn as_cooperative(self) -> Option<SchedulerPolicy> {
        match self {
            ConfiguredPolicy::Sharing => Some(SchedulerPolicy::Sharing),
            ConfiguredPolicy::Stealing => Some(SchedulerPolicy::Stealing),
            ConfiguredPolicy::Deterministic => None,
        }
    }
}

/// System-wide configuration (§6's config table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// `scheduler.policy`
    pub scheduler_policy: ConfiguredPolicy,
    /// `scheduler.max-threads`
    pub scheduler_max_threads: usize,
    /// `scheduler.max-throughput`
    pub scheduler_max_throughput: usize,
    /// `registry.await-running-count-equal`: the running-actor count
    /// `await_all_actors_done` waits to observe (normally `0`).
    pub registry_await_running_count_equal: usize,
    /// `idle-timeout.default`
    pub idle_timeout_default: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            scheduler_policy: ConfiguredPolicy::Stealing,
            scheduler_max_threads: DEFAULT_MAX_THREADS,
            scheduler_max_throughput: DEFAULT_MAX_THROUGHPUT,
            registry_await_running_count_equal: 0,
            idle_timeout_default: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl SystemConfig {
    pub fn builder() -> SystemConfigBuilder {
        SystemConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scheduler_max_threads == 0 && self.scheduler_policy != ConfiguredPolicy::Deterministic {
            return Err("scheduler_max_threads must be > 0 for a cooperative policy".to_string());
        }
        if self.scheduler_max_throughput == 0 {
            return Err("scheduler_max_throughput must be > 0".to_string());
        }
        Ok(())
    }
}

/// Fluent builder for [`SystemConfig`].
#[derive(Debug, Default)]
pub struct SystemConfigBuilder {
    config: SystemConfig,
}

impl SystemConfigBuilder {
    pub fn with_scheduler_policy(mut self, policy: ConfiguredPolicy) -> Self {
        self.config.scheduler_policy = policy;
        self
    }

    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.config.scheduler_max_threads = threads;
        self
    }

    pub fn with_max_throughput(mut self, throughput: usize) -> Self {
        self.config.scheduler_max_throughput = throughput;
        self
    }

    pub fn with_await_running_count_equal(mut self, count: usize) -> Self {
        self.config.registry_await_running_count_equal = count;
        self
    }

    pub fn with_idle_timeout_default(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout_default = timeout;
        self
    }

    pub fn build(self) -> Result<SystemConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SystemConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_threads_is_invalid_for_a_cooperative_policy() {
        let config = SystemConfig::builder().with_max_threads(0).build();
        assert!(config.is_err());
    }

    #[test]
    fn zero_threads_is_fine_for_the_deterministic_policy() {
        let config = SystemConfig::builder()
            .with_scheduler_policy(ConfiguredPolicy::Deterministic)
            .with_max_threads(0)
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn builder_roundtrips_every_field() {
        let config = SystemConfig::builder()
            .with_scheduler_policy(ConfiguredPolicy::Sharing)
            .with_max_threads(8)
            .with_max_throughput(50)
            .with_await_running_count_equal(1)
            .with_idle_timeout_default(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.scheduler_policy, ConfiguredPolicy::Sharing);
        assert_eq!(config.scheduler_max_threads, 8);
        assert_eq!(config.scheduler_max_throughput, 50);
        assert_eq!(config.registry_await_running_count_equal, 1);
        assert_eq!(config.idle_timeout_default, Duration::from_secs(5));
    }
}
