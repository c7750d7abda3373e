//! Process-global identifiers: actor ids and message correlation ids.
//!
//! Both are plain 64-bit counters rather than UUIDs — the spec fixes the
//! control block's id and the envelope's correlation id at 64 bits (§3), and
//! a monotonically increasing counter is cheaper to generate than a random
//! UUID on every `request()` call.

// Layer 1: Standard library imports
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CORRELATION_ID: AtomicU64 = AtomicU64::new(1);

/// The bit that marks a correlation id as carrying a response rather than a request.
const RESPONSE_FLAG: u64 = 1 << 63;

/// Globally unique actor identifier.
///
/// Generated from a process-wide atomic counter (§3: "a globally unique
/// 64-bit id"). Ids are never reused within a process, so a stale `ActorId`
/// read from a dead control block can never alias a live actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Allocate the next id in process order.
    pub fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, mainly for the wire envelope (§6).
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// A 63-bit correlation id with a 1-bit "is response" flag (§3, GLOSSARY).
///
/// `0` is reserved for asynchronous envelopes that carry no correlation at
/// all (`CorrelationId::ASYNC`). Request ids are allocated sequentially;
/// `.as_response()` flips the high bit to produce the id a reply envelope
/// carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// The sentinel value used by fire-and-forget envelopes.
    pub const ASYNC: CorrelationId = CorrelationId(0);

    /// Allocate a fresh request id (never `ASYNC`, never already response-flagged).
    pub fn next_request() -> Self {
        loop {
            let raw = NEXT_CORRELATION_ID.fetch_add(1, Ordering::Relaxed) & !RESPONSE_FLAG;
            if raw != 0 {
                return Self(raw);
            }
            // Counter wrapped back to zero (practically unreachable); retry.
        }
    }

    /// Is this the async sentinel?
    pub fn is_async(self) -> bool {
        self.0 == 0
    }

    /// Is this id flagged as carrying a response?
    pub fn is_response(self) -> bool {
        self.0 & RESPONSE_FLAG != 0
    }

    /// Produce the response-flagged counterpart of a request id.
    ///
    /// Calling this on `ASYNC` or on an already-response id is a caller bug;
    /// it is idempotent rather than panicking so a misuse degrades to a
    /// no-op instead of taking an actor down.
    pub fn as_response(self) -> Self {
        if self.is_async() {
            self
        } else {
            Self(self.0 | RESPONSE_FLAG)
        }
    }

    /// Strip the response flag, e.g. to look up the originating request's timeout entry.
    pub fn as_request(self) -> Self {
        Self(self.0 & !RESPONSE_FLAG)
    }

    /// Raw numeric value, for the wire envelope (§6).
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_async() {
            write!(f, "async")
        } else if self.is_response() {
            write!(f, "resp#{}", self.0 & !RESPONSE_FLAG)
        } else {
            write!(f, "req#{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_ids_are_unique_and_increasing() {
        let a = ActorId::next();
        let b = ActorId::next();
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn async_correlation_id_is_zero() {
        assert!(CorrelationId::ASYNC.is_async());
        assert!(!CorrelationId::ASYNC.is_response());
    }

    #[test]
    fn request_ids_round_trip_to_response() {
        let req = CorrelationId::next_request();
        assert!(!req.is_async());
        assert!(!req.is_response());

        let resp = req.as_response();
        assert!(resp.is_response());
        assert_eq!(resp.as_request(), req);
    }

    #[test]
    fn async_as_response_is_a_noop() {
        assert_eq!(CorrelationId::ASYNC.as_response(), CorrelationId::ASYNC);
    }
}
