//! The actor system: owns the registry, the clock, the scheduler, and the
//! live actor table; `spawn` is the one place all four come together (§5,
//! §4.8).

// Layer 1: Standard library imports
use std::sync::{Arc, OnceLock};

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tracing::{info, warn};

// Layer 3: Internal module imports
use super::config::{ConfiguredPolicy, SystemConfig};
use super::errors::SystemError;
use super::registry::{ActorRegistry, SharedRegistry};
use super::spawn::SpawnOptions;
use crate::actor::{Actor, ScheduledActor};
use crate::clock::{Clock, DeterministicClock, SystemClock};
use crate::control::{Address, ControlBlock, ExitReason, Handle};
use crate::mailbox::Mailbox;
use crate::message::SenderHandle;
use crate::scheduler::{CooperativeScheduler, Dispatch, Runnable};
use crate::util::ActorId;

/// Type-erases over `ScheduledActor<A>` so the system's actor table doesn't
/// need a type parameter per spawned actor type (§4.4/§4.8: one scheduler,
/// many actor types).
///
/// `pre_start`/`post_stop` are `async fn`s on [`Actor`], but the cooperative
/// scheduler's workers are plain `std::thread`s, not tokio tasks — each
/// implementor bridges the two with a held `tokio::runtime::Runtime` and
/// `block_on`, exactly at this boundary and nowhere else.
trait AnyScheduledActor: Send + Sync {
    fn id(&self) -> ActorId;
    fn ensure_started(&self);
    fn resume(&self, max_throughput: usize) -> (crate::actor::ResumeOutcome, usize);
    fn stop(&self, reason: ExitReason);
    fn receive_link_exit(&self, reason: ExitReason) -> Option<ExitReason>;
    fn link(&self, peer: Address);
    fn linked_peer_ids(&self) -> Vec<ActorId>;
    fn monitor(&self, observer: SenderHandle);
    fn notify_monitors(&self, reason: ExitReason);
    fn prepone(&self, type_name: &'static str) -> bool;
    fn has_skipped(&self, type_name: &'static str) -> bool;
}

struct ManagedActor<A: Actor> {
    inner: parking_lot::Mutex<ScheduledActor<A>>,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl<A: Actor> AnyScheduledActor for ManagedActor<A> {
    fn id(&self) -> ActorId {
        self.inner.lock().id()
    }

    fn ensure_started(&self) {
        let mut guard = self.inner.lock();
        if let Err(error) = self.runtime.block_on(guard.ensure_started()) {
            warn!(actor = %guard.id(), %error, "pre_start failed");
        }
    }

    fn resume(&self, max_throughput: usize) -> (crate::actor::ResumeOutcome, usize) {
        self.inner.lock().resume(max_throughput)
    }

    fn stop(&self, reason: ExitReason) {
        let mut guard = self.inner.lock();
        self.runtime.block_on(guard.stop(reason));
    }

    fn receive_link_exit(&self, reason: ExitReason) -> Option<ExitReason> {
        self.inner.lock().receive_link_exit(reason)
    }

    fn link(&self, peer: Address) {
        self.inner.lock().link(peer);
    }

    fn linked_peer_ids(&self) -> Vec<ActorId> {
        self.inner.lock().linked_peers().map(|peer| peer.id()).collect()
    }

    fn monitor(&self, observer: SenderHandle) {
        self.inner.lock().monitor(observer, None);
    }

    fn notify_monitors(&self, reason: ExitReason) {
        self.inner.lock().notify_monitors(reason);
    }

    fn prepone(&self, type_name: &'static str) -> bool {
        let guard = self.inner.lock();
        let Some(found) = guard.mailbox().find_remove(|e| e.payload().type_name() == type_name) else {
            return false;
        };
        guard.mailbox().put_back(found);
        true
    }

    fn has_skipped(&self, type_name: &'static str) -> bool {
        self.inner.lock().has_skipped(type_name)
    }
}

/// The running system: registry + clock + scheduler + actor table (§2
/// "System registry + init").
pub struct ActorSystem {
    config: SystemConfig,
    registry: SharedRegistry,
    clock: Arc<dyn Clock>,
    deterministic_clock: Option<Arc<DeterministicClock>>,
    runtime: Arc<tokio::runtime::Runtime>,
    table: DashMap<ActorId, Arc<dyn AnyScheduledActor>>,
    scheduler: OnceLock<CooperativeScheduler>,
    home_id: u64,
}

impl ActorSystem {
    /// Build and, for a cooperative policy, start the scheduler. A
    /// deterministic-policy system starts with no worker pool; the caller
    /// drives it directly by wrapping it in a
    /// [`crate::scheduler::DeterministicScheduler`] (it implements
    /// [`Dispatch`]) or via [`ActorSystem::advance_time`] (§4.8(2), §8 S7).
    pub fn new(config: SystemConfig) -> Result<Arc<Self>, SystemError> {
        config.validate().map_err(SystemError::ConfigError)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .map_err(|err| SystemError::SpawnFailed(err.to_string()))?;

        let (clock, deterministic_clock): (Arc<dyn Clock>, Option<Arc<DeterministicClock>>) =
            if config.scheduler_policy == ConfiguredPolicy::Deterministic {
                let det = Arc::new(DeterministicClock::new(chrono::Utc::now()));
                (Arc::clone(&det) as Arc<dyn Clock>, Some(det))
            } else {
                let sys = Arc::new(SystemClock::new().map_err(|err| SystemError::SpawnFailed(err.to_string()))?);
                (sys as Arc<dyn Clock>, None)
            };

        let system = Arc::new(Self {
            config: config.clone(),
            registry: Arc::new(ActorRegistry::new()),
            clock,
            deterministic_clock,
            runtime: Arc::new(runtime),
            table: DashMap::new(),
            scheduler: OnceLock::new(),
            home_id: crate::util::ActorId::next().as_u64(),
        });

        if let Some(policy) = config.scheduler_policy.as_cooperative() {
            let scheduler = CooperativeScheduler::start(
                config.scheduler_max_threads,
                config.scheduler_max_throughput,
                policy,
                Arc::clone(&system),
            )
            .map_err(|err| SystemError::SpawnFailed(err.to_string()))?;
            // Empty at this point — `new` is the only writer and runs once.
            let _ = system.scheduler.set(scheduler);
        }

        info!(policy = ?config.scheduler_policy, "actor system started");
        Ok(system)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// `Some` only for a system built with `scheduler.policy = deterministic`.
    pub fn deterministic_clock(&self) -> Option<&Arc<DeterministicClock>> {
        self.deterministic_clock.as_ref()
    }

    /// Spawn `actor` under `options`. The returned [`Handle`] can be
    /// downgraded to an [`Address`] or, by the caller, wrapped in a
    /// [`crate::control::TypedHandle`] if the actor exposes a typed
    /// interface (§4.6).
    pub fn spawn<A: Actor>(self: &Arc<Self>, actor: A, options: SpawnOptions) -> Result<Handle, SystemError> {
        let mailbox = Arc::new(Mailbox::new());
        let mailbox_sink: Arc<dyn crate::message::EnvelopeSink> =
            Arc::clone(&mailbox) as Arc<dyn crate::message::EnvelopeSink>;
        let sink_weak: std::sync::Weak<dyn crate::message::EnvelopeSink> = Arc::downgrade(&mailbox_sink);
        let control = Arc::new(ControlBlock::new(ActorId::next(), self.home_id, sink_weak));
        let handle = Handle::from_block(Arc::clone(&control));
        let address = handle.downgrade();

        let scheduled = ScheduledActor::new(
            actor,
            Arc::clone(&control),
            Arc::clone(&mailbox),
            address.clone(),
            Arc::clone(&self.clock),
            crate::actor::DefaultHandlerStrategy::default(),
            options.is_lazy_init(),
        );

        let managed: Arc<dyn AnyScheduledActor> = Arc::new(ManagedActor {
            inner: parking_lot::Mutex::new(scheduled),
            runtime: Arc::clone(&self.runtime),
        });

        let id = address.id();
        self.table.insert(id, Arc::clone(&managed));
        self.registry.register(address.clone(), options.is_hidden());

        if let Some(observer) = options.monitor() {
            // `monitored` (§4.8): the observer gets exactly one down
            // notification, delivered by `terminate` below.
            managed.monitor(observer.clone());
        }

        if let Some(peer) = options.link() {
            // `linked` (§4.8): a symmetric link, established on both sides
            // before the first envelope is processed.
            managed.link(peer.clone());
            if let Some(peer_entry) = self.table.get(&peer.id()) {
                peer_entry.link(address.clone());
            }
        }

        if options.is_detached() {
            // `detached` (§4.8): its own OS thread, outside the cooperative
            // pool entirely.
            let worker = Arc::clone(&managed);
            let max_throughput = self.config.scheduler_max_throughput;
            std::thread::Builder::new()
                .name(format!("caldera-actor-{id}"))
                .spawn(move || run_detached(worker, max_throughput))
                .map_err(|err| SystemError::SpawnFailed(err.to_string()))?;
        } else if let Some(scheduler) = self.scheduler.get() {
            managed.ensure_started();
            scheduler.schedule(id);
        }
        // Deterministic-policy systems leave the id parked in `table` only;
        // the test harness drives it via `dispatch_message`.

        Ok(handle)
    }

    /// Resolve a live actor's [`Address`] by id.
    pub fn resolve(&self, id: ActorId) -> Option<Address> {
        self.registry.resolve(id)
    }

    /// Is an envelope of this payload type currently sitting in `id`'s skip
    /// cache (§4.4 point 2, §8 S4)? `false` if `id` is unknown.
    pub fn has_skipped(&self, id: ActorId, type_name: &'static str) -> bool {
        self.table.get(&id).map(|entry| entry.has_skipped(type_name)).unwrap_or(false)
    }

    /// `await_all_actors_done` (§5): block until the configured target
    /// running-actor count is observed.
    pub fn await_all_actors_done(&self) {
        self.registry.await_running_count_equal(self.config.registry_await_running_count_equal);
    }

    /// Advance the deterministic clock (no-op, returns `0`, on a
    /// cooperative-policy system).
    pub fn advance_time(&self, dt: std::time::Duration) -> usize {
        match &self.deterministic_clock {
            Some(clock) => clock.advance_time(chrono::Duration::from_std(dt).unwrap_or_else(|_| chrono::Duration::zero())),
            None => 0,
        }
    }

    fn terminate(&self, id: ActorId, reason: ExitReason) {
        let Some((_, actor)) = self.table.remove(&id) else {
            return;
        };
        let linked_peers = actor.linked_peer_ids();
        actor.stop(reason);
        actor.notify_monitors(reason);
        self.registry.unregister(id);

        if reason.propagates_on_link() {
            self.propagate_links(linked_peers, reason);
        }
    }

    /// §4.10: deliver the exit to every linked peer of the terminated actor.
    /// A peer that has overridden its exit handler gets a `LinkExit`
    /// envelope and survives; one that hasn't is itself forced to
    /// terminate with the same reason, continuing the chain outward.
    fn propagate_links(&self, peers: Vec<ActorId>, reason: ExitReason) {
        for peer_id in peers {
            let Some(peer) = self.table.get(&peer_id).map(|entry| Arc::clone(entry.value())) else {
                continue;
            };
            if let Some(forced) = peer.receive_link_exit(reason) {
                self.terminate(peer_id, forced);
            }
        }
    }
}

impl Runnable for ActorSystem {
    fn run_once(&self, id: ActorId, max_throughput: usize) -> bool {
        let Some(actor) = self.table.get(&id).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        actor.ensure_started();
        match actor.resume(max_throughput).0 {
            crate::actor::ResumeOutcome::Done => false,
            crate::actor::ResumeOutcome::Again => true,
            crate::actor::ResumeOutcome::Terminated(reason) => {
                self.terminate(id, reason);
                false
            }
        }
    }
}

impl Dispatch for ActorSystem {
    /// Resume `id` for at most one envelope; `true` iff that envelope was
    /// actually popped and dispatched (§4.8(2)'s `dispatch_message`) — not
    /// whether more work remains, which is [`Runnable::run_once`]'s concern.
    fn dispatch_one(&self, id: ActorId) -> bool {
        let Some(actor) = self.table.get(&id).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        actor.ensure_started();
        let (outcome, processed) = actor.resume(1);
        if let crate::actor::ResumeOutcome::Terminated(reason) = outcome {
            self.terminate(id, reason);
        }
        processed > 0
    }

    fn prepone(&self, id: ActorId, type_name: &'static str) -> bool {
        let Some(actor) = self.table.get(&id).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        AnyScheduledActor::prepone(actor.as_ref(), type_name)
    }
}

fn run_detached(actor: Arc<dyn AnyScheduledActor>, max_throughput: usize) {
    actor.ensure_started();
    loop {
        match actor.resume(max_throughput).0 {
            crate::actor::ResumeOutcome::Done => break,
            crate::actor::ResumeOutcome::Again => continue,
            crate::actor::ResumeOutcome::Terminated(_) => break,
        }
    }
}
