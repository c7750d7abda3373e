//! Type-erased payload: the runtime representation of a [`Message`] value.
//!
//! A [`Payload`] is what actually rides inside an [`crate::message::Envelope`].
//! It erases the concrete `Message` type behind an `Arc<dyn ErasedMessage>` so
//! a single mailbox can hold envelopes of many different message types, while
//! still supporting downcasting back to the original type, structural
//! equality, and copy-on-write sharing (§3: "copy-on-write sharing of the
//! underlying storage").

// Layer 1: Standard library imports
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::traits::Message;

/// Object-safe counterpart of [`Message`], blanket-implemented for every
/// `T: Message`. Kept private — callers only ever see [`Payload`].
trait ErasedMessage: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_erased(&self, other: &dyn ErasedMessage) -> bool;
    fn clone_erased(&self) -> Arc<dyn ErasedMessage>;
}

/// Downcasts a type-erased `Arc` to a concrete `Arc<T>` without unwrapping
/// it first, so the caller can still check uniqueness via `Arc::try_unwrap`
/// afterwards. Standard trait-object `Arc` downcast pattern: the data
/// pointer is reused as-is, only the vtable half of the fat pointer is
/// dropped, which is sound because the concrete type was just confirmed via
/// `as_any().is::<T>()`.
fn downcast_arc<T: Message>(arc: Arc<dyn ErasedMessage>) -> Result<Arc<T>, Arc<dyn ErasedMessage>> {
    if (*arc).as_any().is::<T>() {
        let ptr = Arc::into_raw(arc) as *const T;
        Ok(unsafe { Arc::from_raw(ptr) })
    } else {
        Err(arc)
    }
}

impl<T: Message> ErasedMessage for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn ErasedMessage) -> bool {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self == other,
            None => false,
        }
    }

    fn clone_erased(&self) -> Arc<dyn ErasedMessage> {
        Arc::new(self.clone())
    }
}

/// A type-erased, immutable, type-tagged payload (§3 "Message / tuple").
///
/// `Payload` is cheap to clone (an `Arc` bump); two clones share the same
/// underlying storage until one side needs owned access via
/// [`Payload::into_inner`], at which point the shared storage is cloned only
/// if another reference is still alive (copy-on-write).
#[derive(Clone)]
pub struct Payload {
    type_id: TypeId,
    type_name: &'static str,
    arity: usize,
    slot_type_ids: Arc<Vec<TypeId>>,
    value: Arc<dyn ErasedMessage>,
}

impl Payload {
    /// Wrap a concrete message value into a type-erased payload.
    pub fn new<T: Message>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            arity: T::ARITY,
            slot_type_ids: Arc::new(T::slot_type_ids()),
            value: Arc::new(value),
        }
    }

    /// Runtime type id of the payload's concrete message type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Human-readable name of the payload's concrete message type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of logical slots (§3 "arity query").
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Per-slot type ids, in order (§3 "per-slot type id").
    pub fn slot_type_ids(&self) -> &[TypeId] {
        &self.slot_type_ids
    }

    /// Does this payload hold a value of concrete type `T`?
    pub fn is<T: Message>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrow the payload as `T`, or `None` if the concrete type differs.
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }

    /// Extract the payload as an owned `T` (§3 "extraction by static type
    /// tuple"). Clones the underlying storage if it is still shared
    /// (copy-on-write); moves it out otherwise.
    pub fn into_inner<T: Message>(self) -> Result<T, Payload> {
        if !self.is::<T>() {
            return Err(self);
        }
        let typed: Arc<T> = match downcast_arc::<T>(self.value) {
            Ok(typed) => typed,
            Err(_) => unreachable!("type id check above guarantees downcast success"),
        };
        match Arc::try_unwrap(typed) {
            Ok(owned) => Ok(owned),
            Err(shared) => Ok((*shared).clone()),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("type_name", &self.type_name)
            .field("arity", &self.arity)
            .field("value", &self.value)
            .finish()
    }
}

impl PartialEq for Payload {
    /// Structural equality (§3: "Payload equality is structural").
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.value.eq_erased(other.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_downcast() {
        let p = Payload::new((1i32, 2i32));
        assert!(p.is::<(i32, i32)>());
        assert_eq!(p.downcast_ref::<(i32, i32)>(), Some(&(1, 2)));
        assert_eq!(p.arity(), 2);
    }

    #[test]
    fn wrong_type_downcast_fails() {
        let p = Payload::new(42i32);
        assert!(p.downcast_ref::<(i32, i32)>().is_none());
    }

    #[test]
    fn equality_is_structural() {
        let a = Payload::new((1i32, 2i32));
        let b = Payload::new((1i32, 2i32));
        let c = Payload::new((1i32, 3i32));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn into_inner_clones_when_shared_and_moves_when_unique() {
        let p = Payload::new(String::from("hello"));
        let shared = p.clone();
        // `p` and `shared` both alive: into_inner on `p` must clone.
        let extracted = p.into_inner::<String>().unwrap();
        assert_eq!(extracted, "hello");
        // Now only `shared` is alive: into_inner moves out.
        let extracted2 = shared.into_inner::<String>().unwrap();
        assert_eq!(extracted2, "hello");
    }

    #[test]
    fn into_inner_wrong_type_returns_payload_back() {
        let p = Payload::new(42i32);
        let err = p.into_inner::<String>();
        assert!(err.is_err());
    }
}
