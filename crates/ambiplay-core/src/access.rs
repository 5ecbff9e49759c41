//! User-granted capability that gates session directory queries.

use std::sync::atomic::{AtomicBool, Ordering};

/// Runtime-revocable access flag.
///
/// Read on every directory query; callers must not cache the answer.
#[derive(Debug)]
pub struct AccessGate {
    granted: AtomicBool,
}

impl AccessGate {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::Acquire)
    }

    /// Update the grant, returning the previous value.
    pub fn set(&self, granted: bool) -> bool {
        self.granted.swap(granted, Ordering::AcqRel)
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(true)
    }
}
