//! Spawn options (§4.8): `monitored`, `linked`, `detached`, `hidden`,
//! `blocking_api`, `lazy_init`.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::control::Address;
use crate::message::SenderHandle;

/// Fluent set of spawn-time options (§4.8).
#[derive(Default, Clone)]
pub struct SpawnOptions {
    pub(crate) monitor: Option<SenderHandle>,
    pub(crate) link: Option<Address>,
    pub(crate) detached: bool,
    pub(crate) hidden: bool,
    pub(crate) blocking_api: bool,
    pub(crate) lazy_init: bool,
}

impl SpawnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `monitored`: the given observer receives exactly one down
    /// notification when the spawned actor terminates.
    pub fn monitored(mut self, observer: SenderHandle) -> Self {
        self.monitor = Some(observer);
        self
    }

    /// `linked`: symmetric link with the given peer, established before the
    /// first envelope is processed.
    pub fn linked(mut self, peer: Address) -> Self {
        self.link = Some(peer);
        self
    }

    /// `detached`: own OS thread, not scheduled cooperatively.
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// `hidden`: excluded from `await_all_actors_done`.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// `blocking_api`: spawn as a [`crate::actor::BlockingActor`] instead of
    /// a cooperatively scheduled one.
    pub fn blocking_api(mut self) -> Self {
        self.blocking_api = true;
        self
    }

    /// `lazy_init`: defer `pre_start` until the first envelope arrives.
    pub fn lazy_init(mut self) -> Self {
        self.lazy_init = true;
        self
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_blocking_api(&self) -> bool {
        self.blocking_api
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn monitor(&self) -> Option<&SenderHandle> {
        self.monitor.as_ref()
    }

    pub fn link(&self) -> Option<&Address> {
        self.link.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_all_off() {
        let options = SpawnOptions::new();
        assert!(!options.is_detached());
        assert!(!options.is_hidden());
        assert!(!options.is_blocking_api());
        assert!(!options.is_lazy_init());
        assert!(options.monitor().is_none());
        assert!(options.link().is_none());
    }

    #[test]
    fn builder_methods_compose() {
        let options = SpawnOptions::new().hidden().detached().lazy_init();
        assert!(options.is_hidden());
        assert!(options.is_detached());
        assert!(options.is_lazy_init());
        assert!(!options.is_blocking_api());
    }
}
