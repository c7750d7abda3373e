//! Control block, addresses, and handles (§4.1).

pub mod address;
pub mod block;

pub use address::{actor_cast, Address, Handle, Interface, Subset, TypedHandle};
pub use block::{ControlBlock, ExitReason};
