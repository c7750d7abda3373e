//! Envelope priority lanes (§3, §4.2: exactly two lanes — normal and urgent).

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// Which mailbox lane an envelope is queued on.
///
/// The spec deliberately fixes this at two lanes (§4.2), not an open-ended
/// priority scale: `Urgent` always drains before `Normal`, and within a lane
/// delivery order is FIFO per sender (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    /// Default lane for ordinary traffic.
    Normal = 0,
    /// Drains ahead of the normal lane regardless of arrival order.
    Urgent = 1,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_priority_is_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
