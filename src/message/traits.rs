//! The `Message` trait: compile-time arity/type-signature metadata for payloads.
//!
//! Every message type participating in the actor system implements `Message`
//! directly (mirroring the teacher crate's `impl Message for MyType { const
//! MESSAGE_TYPE = "..." }` pattern) rather than relying on a blanket impl,
//! because tuple arities (§3 "arity query, per-slot type id") need concrete,
//! per-shape impls that a single blanket impl over `T` cannot provide without
//! specialization.

// Layer 1: Standard library imports
use std::any::TypeId;
use std::fmt::Debug;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
// (none)

/// A value that can travel inside an [`crate::message::Payload`].
///
/// `ARITY` and [`Message::slot_type_ids`] answer the spec's "arity query" and
/// "per-slot type id" requirements (§3). Plain (non-tuple) message types keep
/// the default arity of 1 and a single-element slot list; tuple types
/// `()`..`(A, B, C, D)` are given explicit impls below with the correct
/// arity.
pub trait Message: std::any::Any + Send + Sync + Debug + Clone + PartialEq + 'static {
    /// Number of logical slots in this payload. Default: a single slot (the
    /// whole value).
    const ARITY: usize = 1;

    /// `TypeId` of each slot, in order. Default: a single-element vector
    /// holding this type's own id.
    fn slot_type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<Self>()]
    }
}

macro_rules! impl_message_for_tuple {
    ( $arity:expr; $( $name:ident ),* ) => {
        impl<$( $name ),*> Message for ( $( $name, )* )
        where
            $( $name: Send + Sync + Debug + Clone + PartialEq + 'static, )*
        {
            const ARITY: usize = $arity;

            fn slot_type_ids() -> Vec<TypeId> {
                vec![ $( TypeId::of::<$name>() ),* ]
            }
        }
    };
}

impl Message for () {
    const ARITY: usize = 0;

    fn slot_type_ids() -> Vec<TypeId> {
        Vec::new()
    }
}

macro_rules! impl_message_for_scalar {
    ( $( $ty:ty ),* $(,)? ) => {
        $( impl Message for $ty {} )*
    };
}

/// Ground-case impls so the built-in scalar types can travel as payloads
/// directly, the same way a user's own struct does via `impl Message for
/// MyType {}` — without these, `Payload::new(1i32)` has nowhere to get its
/// `Message` bound from, since `i32` is a foreign type this crate doesn't
/// otherwise touch.
impl_message_for_scalar!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl_message_for_tuple!(1; A);
impl_message_for_tuple!(2; A, B);
impl_message_for_tuple!(3; A, B, C);
impl_message_for_tuple!(4; A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_has_zero_arity() {
        assert_eq!(<() as Message>::ARITY, 0);
        assert!(<() as Message>::slot_type_ids().is_empty());
    }

    #[test]
    fn pair_has_arity_two_with_ordered_slot_ids() {
        assert_eq!(<(i32, i32) as Message>::ARITY, 2);
        let ids = <(i32, i32) as Message>::slot_type_ids();
        assert_eq!(ids, vec![TypeId::of::<i32>(), TypeId::of::<i32>()]);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Ping;

    impl Message for Ping {}

    #[test]
    fn scalar_message_defaults_to_arity_one() {
        assert_eq!(<Ping as Message>::ARITY, 1);
        assert_eq!(<Ping as Message>::slot_type_ids(), vec![TypeId::of::<Ping>()]);
    }
}
