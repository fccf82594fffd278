//! Generation fencing.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues render generations and answers whether one is still authoritative.
///
/// Every call to [`advance`](Self::advance) supersedes all earlier
/// generations. Work started for a superseded generation may finish, but
/// its results must not reach the visible document.
#[derive(Debug, Default)]
pub struct GenerationFence {
    latest: AtomicU64,
}

impl GenerationFence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next generation. The first one is 1.
    pub fn advance(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Latest issued generation (0 before the first render).
    #[must_use]
    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}
