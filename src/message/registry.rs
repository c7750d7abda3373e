//! Process-global type-id registry for serializable message types (§6).
//!
//! The registry maps a small numeric wire id to a serialize/deserialize pair
//! for a concrete [`Message`] type so that the out-of-scope networking
//! collaborator can encode `type_id, value` pairs on the wire (§6's wire
//! envelope) and reconstruct a [`Payload`] on the receiving side without the
//! core knowing anything about transports.

// Layer 1: Standard library imports
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::OnceLock;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};

// Layer 3: Internal module imports
use super::payload::Payload;
use super::traits::Message;

/// Errors raised by [`TypeRegistry`] lookups and (de)serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// No type registered under this wire id.
    #[error("no message type registered for wire id {0}")]
    UnknownWireId(u32),
    /// The concrete type has not been registered at all.
    #[error("message type {0} was never registered with TypeRegistry")]
    UnregisteredType(&'static str),
    /// A wire id was registered twice for different types.
    #[error("wire id {0} already registered for a different type")]
    WireIdConflict(u32),
    /// The payload's bytes didn't decode to the expected type.
    #[error("failed to decode payload: {0}")]
    Decode(String),
}

type EncodeFn = Box<dyn Fn(&Payload) -> Result<Vec<u8>, SerializationError> + Send + Sync>;
type DecodeFn = Box<dyn Fn(&[u8]) -> Result<Payload, SerializationError> + Send + Sync>;

struct Entry {
    wire_id: u32,
    encode: EncodeFn,
    decode: DecodeFn,
}

/// Process-global registry of serializable message types, keyed both by
/// `TypeId` (for encoding an in-hand `Payload`) and by wire id (for decoding
/// bytes received off the wire).
#[derive(Default)]
pub struct TypeRegistry {
    by_type: RwLock<HashMap<TypeId, Entry>>,
    by_wire_id: RwLock<HashMap<u32, TypeId>>,
}

impl TypeRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry instance.
    pub fn global() -> &'static TypeRegistry {
        static INSTANCE: OnceLock<TypeRegistry> = OnceLock::new();
        INSTANCE.get_or_init(TypeRegistry::new)
    }

    /// Register a serializable message type under a stable wire id
    /// (§6: "Each serializable type owns a process-global 16- or 32-bit id").
    pub fn register<T>(&self, wire_id: u32) -> Result<(), SerializationError>
    where
        T: Message + Serialize + DeserializeOwned,
    {
        let type_id = TypeId::of::<T>();
        {
            let by_wire = self.by_wire_id.read();
            if let Some(existing) = by_wire.get(&wire_id) {
                if *existing != type_id {
                    return Err(SerializationError::WireIdConflict(wire_id));
                }
                return Ok(());
            }
        }

        let encode: EncodeFn = Box::new(|payload: &Payload| {
            let value = payload
                .downcast_ref::<T>()
                .ok_or_else(|| SerializationError::Decode("payload type mismatch".into()))?;
            serde_json::to_vec(value).map_err(|e| SerializationError::Decode(e.to_string()))
        });
        let decode: DecodeFn = Box::new(|bytes: &[u8]| {
            let value: T =
                serde_json::from_slice(bytes).map_err(|e| SerializationError::Decode(e.to_string()))?;
            Ok(Payload::new(value))
        });

        self.by_type.write().insert(
            type_id,
            Entry {
                wire_id,
                encode,
                decode,
            },
        );
        self.by_wire_id.write().insert(wire_id, type_id);
        Ok(())
    }

    /// Encode a payload to `(wire_id, bytes)` for transport (§6's wire envelope).
    pub fn encode(&self, payload: &Payload) -> Result<(u32, Vec<u8>), SerializationError> {
        let by_type = self.by_type.read();
        let entry = by_type
            .get(&payload.type_id())
            .ok_or(SerializationError::UnregisteredType(payload.type_name()))?;
        Ok((entry.wire_id, (entry.encode)(payload)?))
    }

    /// Reconstruct a payload from a wire id and its encoded bytes.
    pub fn decode(&self, wire_id: u32, bytes: &[u8]) -> Result<Payload, SerializationError> {
        let by_wire = self.by_wire_id.read();
        let type_id = by_wire
            .get(&wire_id)
            .ok_or(SerializationError::UnknownWireId(wire_id))?;
        let by_type = self.by_type.read();
        let entry = by_type
            .get(type_id)
            .ok_or(SerializationError::UnknownWireId(wire_id))?;
        (entry.decode)(bytes)
    }
}
