//! The global actor directory: lookup by id plus the running-count
//! bookkeeping behind `await_all_actors_done` (§5, §4.8).

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

// Layer 3: Internal module imports
use crate::control::Address;
use crate::util::ActorId;

struct Entry {
    address: Address,
    /// Excluded from `await_all_actors_done` (§4.8 spawn option `hidden`).
    hidden: bool,
}

/// A concurrently-readable/writable directory of every live actor, keyed by
/// id (§2 "System registry + init").
pub struct ActorRegistry {
    table: DashMap<ActorId, Entry>,
    running: AtomicUsize,
    shutdown_lock: Mutex<()>,
    shutdown_wake: Condvar,
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
            running: AtomicUsize::new(0),
            shutdown_lock: Mutex::new(()),
            shutdown_wake: Condvar::new(),
        }
    }

    /// Register a freshly spawned actor. `hidden` actors never count toward
    /// `await_all_actors_done` (§4.8).
    pub fn register(&self, address: Address, hidden: bool) {
        let id = address.id();
        self.table.insert(id, Entry { address, hidden });
        if !hidden {
            self.running.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Remove a terminated actor from the directory (§7: "releases its
    /// mailbox" / "decrements the system's running count").
    pub fn unregister(&self, id: ActorId) {
        if let Some((_, entry)) = self.table.remove(&id) {
            if !entry.hidden {
                let remaining = self.running.fetch_sub(1, Ordering::SeqCst) - 1;
                if remaining == 0 {
                    let _guard = self.shutdown_lock.lock();
                    self.shutdown_wake.notify_all();
                }
            }
        }
    }

    pub fn resolve(&self, id: ActorId) -> Option<Address> {
        self.table.get(&id).map(|entry| entry.address.clone())
    }

    pub fn running_count(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Block the calling thread until `running_count() == target`
    /// (`registry.await-running-count-equal`, §5/§6); normally called with
    /// `target == 0` for a full graceful shutdown.
    pub fn await_running_count_equal(&self, target: usize) {
        loop {
            if self.running_count() == target {
                return;
            }
            let mut guard = self.shutdown_lock.lock();
            if self.running_count() == target {
                return;
            }
            self.shutdown_wake.wait_for(&mut guard, std::time::Duration::from_millis(50));
        }
    }
}

/// Shared-ownership alias used by the rest of `system` (the registry
/// outlives any single spawn call).
pub type SharedRegistry = Arc<ActorRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlBlock, Handle};
    use std::sync::Weak;

    fn test_address() -> (Address, Arc<ControlBlock>) {
        let block = Arc::new(ControlBlock::new(ActorId::next(), 1, Weak::<crate::mailbox::Mailbox>::new()));
        let handle = Handle::from_block(Arc::clone(&block));
        let address = handle.downgrade();
        std::mem::forget(handle);
        (address, block)
    }

    #[test]
    fn register_then_resolve_round_trips() {
        let registry = ActorRegistry::new();
        let (address, _block) = test_address();
        let id = address.id();
        registry.register(address, false);

        assert!(registry.resolve(id).is_some());
        assert_eq!(registry.running_count(), 1);
    }

    #[test]
    fn hidden_actors_do_not_count_toward_running() {
        let registry = ActorRegistry::new();
        let (address, _block) = test_address();
        registry.register(address, true);
        assert_eq!(registry.running_count(), 0);
    }

    #[test]
    fn unregister_decrements_running_count() {
        let registry = ActorRegistry::new();
        let (address, _block) = test_address();
        let id = address.id();
        registry.register(address, false);
        registry.unregister(id);
        assert_eq!(registry.running_count(), 0);
        assert!(registry.resolve(id).is_none());
    }

    #[test]
    fn await_running_count_equal_returns_once_target_is_reached() {
        let registry = Arc::new(ActorRegistry::new());
        let (address, _block) = test_address();
        let id = address.id();
        registry.register(address, false);

        let registry_clone = Arc::clone(&registry);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            registry_clone.unregister(id);
        });

        registry.await_running_count_equal(0);
        handle.join().unwrap();
    }
}
