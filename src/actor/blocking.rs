//! Blocking actors: a synchronous `receive` interface on a dedicated thread
//! (§4.5).

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::behavior::Behavior;
use crate::control::Address;
use crate::mailbox::Mailbox;
use crate::message::Envelope;

/// A blocking actor's handle to its own mailbox, usable from a dedicated
/// thread without any scheduler involvement (§5: "Blocking actors run on
/// dedicated threads and use their mailbox's condition variable").
pub struct BlockingActor {
    address: Address,
    mailbox: Arc<Mailbox>,
}

impl BlockingActor {
    pub fn new(address: Address, mailbox: Arc<Mailbox>) -> Self {
        Self { address, mailbox }
    }

    pub fn address(&self) -> Address {
        self.address.clone()
    }

    /// `receive(behavior)`: scan the mailbox starting at the first unread
    /// envelope, blocking until a match arrives; non-matching envelopes are
    /// left in place (§4.5). Returns `None` only once the mailbox has been
    /// closed with nothing left to scan.
    pub fn receive(&self, behavior: &Behavior) -> Option<Envelope> {
        loop {
            if let Some(found) = self.mailbox.find_remove(|e| behavior.matches(e.payload())) {
                return Some(found);
            }
            if self.mailbox.is_closed() {
                return None;
            }
            self.mailbox.wait_for_arrival(None);
        }
    }

    /// Like [`Self::receive`], but gives up once `timeout` has elapsed
    /// without a match (§4.5: "`dequeue` ... honors timeouts passed inside
    /// the behavior").
    pub fn receive_timeout(&self, behavior: &Behavior, timeout: Duration) -> Option<Envelope> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if let Some(found) = self.mailbox.find_remove(|e| behavior.matches(e.payload())) {
                return Some(found);
            }
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            if self.mailbox.is_closed() {
                return None;
            }
            self.mailbox.wait_for_arrival(Some(remaining));
        }
    }

    /// `receive_while(pred)`: keep receiving with `behavior` as long as
    /// `pred` holds, returning the count handled (§4.5).
    pub fn receive_while<P>(&self, behavior: &Behavior, mut pred: P) -> usize
    where
        P: FnMut() -> bool,
    {
        let mut count = 0;
        while pred() {
            match self.receive(behavior) {
                Some(_) => count += 1,
                None => break,
            }
        }
        count
    }

    /// `receive_for(begin, end)`: receive once per step of the half-open
    /// range `[begin, end)`, returning the count handled (§4.5).
    pub fn receive_for(&self, behavior: &Behavior, begin: usize, end: usize) -> usize {
        let mut count = 0;
        for _ in begin..end {
            match self.receive(behavior) {
                Some(_) => count += 1,
                None => break,
            }
        }
        count
    }

    /// `do_receive(behavior).until(pred)` (§4.5).
    pub fn do_receive<'a>(&'a self, behavior: &'a Behavior) -> DoReceive<'a> {
        DoReceive { actor: self, behavior }
    }
}

/// Builder returned by [`BlockingActor::do_receive`].
pub struct DoReceive<'a> {
    actor: &'a BlockingActor,
    behavior: &'a Behavior,
}

impl<'a> DoReceive<'a> {
    pub fn until<P>(self, mut pred: P) -> usize
    where
        P: FnMut() -> bool,
    {
        let mut count = 0;
        loop {
            match self.actor.receive(self.behavior) {
                Some(_) => count += 1,
                None => break,
            }
            if pred() {
                break;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Handler, HandlerOutcome};
    use crate::control::{ControlBlock, Handle};
    use crate::message::{EnvelopeSink, Payload, Priority};
    use crate::util::ActorId;
    use std::sync::Arc;

    fn fixture() -> (BlockingActor, Arc<Mailbox>) {
        let mailbox = Arc::new(Mailbox::new());
        let sink: std::sync::Weak<Mailbox> = Arc::downgrade(&mailbox);
        let block = Arc::new(ControlBlock::new(ActorId::next(), 1, sink));
        let handle = Handle::from_block(block);
        let address = handle.downgrade();
        std::mem::forget(handle);
        (BlockingActor::new(address, Arc::clone(&mailbox)), mailbox)
    }

    #[test]
    fn receive_matches_and_removes_without_disturbing_order() {
        let (actor, mailbox) = fixture();
        mailbox.enqueue(Envelope::async_message(None, Priority::Normal, Payload::new(1i32)));
        mailbox.enqueue(Envelope::async_message(None, Priority::Normal, Payload::new("hi")));
        mailbox.enqueue(Envelope::async_message(None, Priority::Normal, Payload::new(2i32)));

        let behavior = Behavior::new().with_handler(Handler::new::<&str, _>(|_| HandlerOutcome::Void));
        let found = actor.receive(&behavior).expect("should find the string envelope");
        assert_eq!(found.payload().downcast_ref::<&str>(), Some(&"hi"));

        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&1));
        assert_eq!(mailbox.pop().unwrap().payload().downcast_ref::<i32>(), Some(&2));
    }

    #[test]
    fn receive_timeout_gives_up_on_an_empty_mailbox() {
        let (actor, _mailbox) = fixture();
        let behavior = Behavior::new().with_handler(Handler::new::<i32, _>(|_| HandlerOutcome::Void));
        assert!(actor.receive_timeout(&behavior, Duration::from_millis(20)).is_none());
    }

    #[test]
    fn receive_for_counts_up_to_the_requested_steps() {
        let (actor, mailbox) = fixture();
        for n in 0..3 {
            mailbox.enqueue(Envelope::async_message(None, Priority::Normal, Payload::new(n)));
        }
        let behavior = Behavior::new().with_handler(Handler::new::<i32, _>(|_| HandlerOutcome::Void));
        assert_eq!(actor.receive_for(&behavior, 0, 5), 3);
    }
}
