//! # Clock Adapter
//!
//! The engine only ever asks one question of time: "what unit is it now?"
//! The answer is an opaque counter (a block height in practice) that never
//! goes backwards. Expiry is decided lazily by comparing it to `end_time`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::TimeUnit;

/// Source of the current time unit.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeUnit;
}

/// A clock driven by its owner: tests advance it by hand, the node's block
/// ticker advances it once per block.
///
/// Cloning shares the underlying counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    height: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: TimeUnit) -> Self {
        Self {
            height: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Moves the clock forward by `units` and returns the new height.
    pub fn advance(&self, units: TimeUnit) -> TimeUnit {
        self.height.fetch_add(units, Ordering::SeqCst) + units
    }

    /// Jumps to `height`. Ignored if it would move the clock backwards.
    pub fn set(&self, height: TimeUnit) {
        self.height.fetch_max(height, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeUnit {
        self.height.load(Ordering::SeqCst)
    }
}
