//! Monotonic message identifiers for published commands.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

// Sequence ids on the wire start at 1; 0 is reserved by the broker.
static ATOMIC_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Identifier attached to every published command so a report stream can
/// be correlated with the command that caused it. Purely informational:
/// the printer never acknowledges commands synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(u32);

impl SequenceId {
    /// Allocate the next sequence id.
    pub fn new() -> Self {
        Self(ATOMIC_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
