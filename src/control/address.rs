//! Address / handle / typed-handle, and `actor_cast` between them (§4.1).

// Layer 1: Standard library imports
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::block::ControlBlock;
use crate::message::{EnqueueOutcome, Envelope, SenderHandle};
use crate::util::ActorId;

/// A weak handle: keeps the control block alive, not the actor object.
pub struct Address {
    block: Arc<ControlBlock>,
}

impl Clone for Address {
    fn clone(&self) -> Self {
        Address::from_block(Arc::clone(&self.block))
    }
}

impl Address {
    pub(crate) fn from_block(block: Arc<ControlBlock>) -> Self {
        block.inc_weak();
        Self { block }
    }

    pub fn id(&self) -> ActorId {
        self.block.id()
    }

    pub fn is_alive(&self) -> bool {
        self.block.is_alive()
    }

    pub fn control_block(&self) -> &Arc<ControlBlock> {
        &self.block
    }

    /// A [`SenderHandle`] suitable for stamping onto outgoing envelopes so a
    /// reply can find its way back here.
    pub fn as_sender(&self) -> SenderHandle {
        SenderHandle::new(self.id(), self.block.sink())
    }

    /// Best-effort fire-and-forget delivery; `None` if the mailbox is gone.
    pub fn try_send(&self, envelope: Envelope) -> Option<EnqueueOutcome> {
        self.block.sink().upgrade().map(|sink| {
            use crate::message::EnvelopeSink;
            sink.enqueue(envelope)
        })
    }
}

impl Drop for Address {
    fn drop(&mut self) {
        self.block.dec_weak();
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.id())
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Address {}

/// A strong handle: keeps the actor object alive.
pub struct Handle {
    block: Arc<ControlBlock>,
}

impl Handle {
    pub(crate) fn from_block(block: Arc<ControlBlock>) -> Self {
        block.inc_strong();
        Self { block }
    }

    pub fn id(&self) -> ActorId {
        self.block.id()
    }

    pub fn is_alive(&self) -> bool {
        self.block.is_alive()
    }

    pub fn control_block(&self) -> &Arc<ControlBlock> {
        &self.block
    }

    pub fn as_sender(&self) -> SenderHandle {
        SenderHandle::new(self.id(), self.block.sink())
    }

    pub fn try_send(&self, envelope: Envelope) -> Option<EnqueueOutcome> {
        self.block.sink().upgrade().map(|sink| {
            use crate::message::EnvelopeSink;
            sink.enqueue(envelope)
        })
    }

    /// Degrade to a weak [`Address`] (always succeeds, §4.1: "a typed handle
    /// is degradable to an untyped strong handle but not vice versa" — the
    /// strong-to-weak direction here is likewise always allowed).
    pub fn downgrade(&self) -> Address {
        Address::from_block(Arc::clone(&self.block))
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        Handle::from_block(Arc::clone(&self.block))
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.block.dec_strong();
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id())
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Handle {}

/// Marker trait implemented by zero-sized "interface list" types that name
/// the signatures a [`TypedHandle`] is allowed to carry (§4.6, §9: "express
/// interface lists as a compile-time list of signatures").
pub trait Interface: 'static {
    /// Human-readable signature names, used only for diagnostics — real
    /// matching happens at the type level via [`Subset`].
    const SIGNATURES: &'static [&'static str];
}

/// `Dst` is allowed wherever `Self` is accepted: `Self`'s interface list is a
/// superset of `Dst`'s (§4.1: "construction ... allowed exactly when the
/// source's interface list is a superset of the destination's").
pub trait Subset<Dst: Interface>: Interface {}

/// A strong handle additionally carrying a compile-time interface list.
pub struct TypedHandle<I: Interface> {
    handle: Handle,
    _interface: PhantomData<I>,
}

impl<I: Interface> TypedHandle<I> {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            _interface: PhantomData,
        }
    }

    pub fn id(&self) -> ActorId {
        self.handle.id()
    }

    pub fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    pub fn as_sender(&self) -> SenderHandle {
        self.handle.as_sender()
    }

    pub fn try_send(&self, envelope: Envelope) -> Option<EnqueueOutcome> {
        self.handle.try_send(envelope)
    }

    /// Narrow to a handle typed over a subset interface (§4.1).
    pub fn narrow<J: Interface>(self) -> TypedHandle<J>
    where
        I: Subset<J>,
    {
        TypedHandle {
            handle: self.handle,
            _interface: PhantomData,
        }
    }

    /// A typed handle is always degradable to an untyped strong handle.
    pub fn into_untyped(self) -> Handle {
        self.handle
    }
}

impl<I: Interface> Clone for TypedHandle<I> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _interface: PhantomData,
        }
    }
}

impl<I: Interface> fmt::Debug for TypedHandle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedHandle({})", self.id())
    }
}

/// `actor_cast` between the four reference forms (§4.1): converting toward a
/// weaker guarantee always succeeds; strengthening fails (returns `None`)
/// when the actor has already died.
pub mod actor_cast {
    use super::*;

    pub fn to_address(handle: &Handle) -> Address {
        handle.downgrade()
    }

    /// Strengthen an address into a strong handle; fails if the actor behind
    /// it is already dead (§4.1: "failing to null when ... strengthening an
    /// address whose target has died").
    pub fn try_strengthen(address: &Address) -> Option<Handle> {
        if !address.is_alive() {
            return None;
        }
        Some(Handle::from_block(Arc::clone(address.control_block())))
    }

    pub fn untype<I: Interface>(typed: TypedHandle<I>) -> Handle {
        typed.into_untyped()
    }

    pub fn narrow<I: Interface + Subset<J>, J: Interface>(typed: TypedHandle<I>) -> TypedHandle<J> {
        typed.narrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Weak;

    fn new_block() -> Arc<ControlBlock> {
        Arc::new(ControlBlock::new(
            ActorId::next(),
            1,
            Weak::<crate::mailbox::Mailbox>::new(),
        ))
    }

    #[test]
    fn downgrade_then_strengthen_round_trips_while_alive() {
        let block = new_block();
        let handle = Handle::from_block(Arc::clone(&block));
        let address = handle.downgrade();
        assert!(actor_cast::try_strengthen(&address).is_some());
    }

    #[test]
    fn strengthening_a_dead_actor_fails() {
        let block = new_block();
        let handle = Handle::from_block(Arc::clone(&block));
        let address = handle.downgrade();
        drop(handle);
        assert!(!address.is_alive());
        assert!(actor_cast::try_strengthen(&address).is_none());
    }

    #[test]
    fn cloning_handle_keeps_actor_alive_until_all_drop() {
        let block = new_block();
        let h1 = Handle::from_block(Arc::clone(&block));
        let h2 = h1.clone();
        drop(h1);
        assert!(block.is_alive());
        drop(h2);
        assert!(!block.is_alive());
    }
}
