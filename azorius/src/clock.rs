use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current block number.
///
/// Every time-dependent component reads the block height through this trait
/// so tests can drive the timeline explicitly.
pub trait Clock: Debug + Send + Sync {
    fn block_number(&self) -> u64;
}

/// A block counter that can be advanced via immutable reference
///
/// All operations use sequentially consistent ordering. The counter only
/// moves forward.
#[derive(Debug, Default)]
pub struct BlockClock {
    inner: AtomicU64,
}

impl BlockClock {
    pub fn new(block: u64) -> Self {
        Self {
            inner: AtomicU64::new(block),
        }
    }

    /// Advance by `blocks`, returning the new height
    pub fn mine(&self, blocks: u64) -> u64 {
        self.inner.fetch_add(blocks, Ordering::SeqCst) + blocks
    }

    /// Move to `block` if it is ahead of the current height, returning the
    /// resulting height
    pub fn advance_to(&self, block: u64) -> u64 {
        let previous = self.inner.fetch_max(block, Ordering::SeqCst);
        previous.max(block)
    }
}

impl Clock for BlockClock {
    fn block_number(&self) -> u64 {
        self.inner.load(Ordering::SeqCst)
    }
}
