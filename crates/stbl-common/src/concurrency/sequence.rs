use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counter used to detect superseded asynchronous work.
///
/// Each unit of work takes a number with [`Sequencer::advance`] and, once it completes,
/// checks [`Sequencer::is_current`] before publishing its result. Any later call
/// to `advance` makes every previously issued number stale.
#[derive(Clone, Debug, Default)]
pub struct Sequencer(Arc<AtomicU64>);

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new sequence number, superseding all previous ones.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.current() == sequence
    }
}
