//! Typed actor interfaces: a compile-time list of `(input) -> (output)`
//! signatures constraining what can be sent to a [`TypedHandle`] (§4.6).

// Layer 1: Standard library imports
use std::marker::PhantomData;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::context::ActorContext;
use crate::behavior::{Behavior, HandlerOutcome};
use crate::control::{Interface, TypedHandle};
use crate::error::ActorError;
use crate::message::{Envelope, Message, Payload, Priority};
use crate::promise::RequestHandle;
use crate::util::CorrelationId;

/// `I` accepts `In` as input, replying with `Signature::Output` (§4.6).
///
/// Implemented per interface marker type, one `impl` per accepted
/// `(input) -> (output)` pair — the compile-time signature list the spec
/// calls for.
pub trait Signature<In: Message>: Interface {
    type Output: Message;
}

/// `send(typed_handle, args…)` (§4.6): fails to compile unless `I`
/// implements `Signature<In>`.
pub fn send<I, In>(handle: &TypedHandle<I>, payload: In)
where
    I: Interface + Signature<In>,
    In: Message,
{
    let envelope = Envelope::async_message(None, Priority::Normal, Payload::new(payload));
    handle.try_send(envelope);
}

/// `request(typed_handle, t, args…)` (§4.6): returns a handle parameterized
/// on the matching output tuple.
pub fn request<I, In>(
    handle: &TypedHandle<I>,
    ctx: &ActorContext,
    timeout: Duration,
    payload: In,
) -> TypedRequestHandle<<I as Signature<In>>::Output>
where
    I: Interface + Signature<In>,
    In: Message,
{
    let (inner, envelope) = ctx.send_request(&handle.as_sender(), timeout, payload);
    handle.try_send(envelope);
    TypedRequestHandle {
        inner,
        _marker: PhantomData,
    }
}

/// A [`RequestHandle`] whose `.then` continuation is statically constrained
/// to accept exactly the matching output type (§4.6).
pub struct TypedRequestHandle<Out> {
    inner: RequestHandle,
    _marker: PhantomData<Out>,
}

impl<Out: Message> TypedRequestHandle<Out> {
    pub fn correlation_id(&self) -> CorrelationId {
        self.inner.correlation_id()
    }

    pub fn then<S, F>(&self, success: S, fail: F) -> Behavior
    where
        S: Fn(Out) -> HandlerOutcome + Send + Sync + 'static,
        F: Fn(ActorError) -> HandlerOutcome + Send + Sync + 'static,
    {
        self.inner.then(
            move |payload| match payload.into_inner::<Out>() {
                Ok(value) => success(value),
                Err(_mismatched) => HandlerOutcome::Skip,
            },
            fail,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlBlock, Handle};
    use crate::mailbox::Mailbox;
    use crate::util::ActorId;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Add(i32, i32);
    impl Message for Add {}

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sum(i32);
    impl Message for Sum {}

    struct Calculator;
    impl Interface for Calculator {
        const SIGNATURES: &'static [&'static str] = &["Add -> Sum"];
    }
    impl Signature<Add> for Calculator {
        type Output = Sum;
    }

    #[test]
    fn send_compiles_for_a_declared_signature() {
        let mailbox = Arc::new(Mailbox::new());
        let sink: std::sync::Weak<Mailbox> = Arc::downgrade(&mailbox);
        let block = Arc::new(ControlBlock::new(ActorId::next(), 1, sink));
        let handle: TypedHandle<Calculator> = TypedHandle::new(Handle::from_block(block));

        send(&handle, Add(1, 2));
        assert_eq!(mailbox.len(), 1);
    }
}
