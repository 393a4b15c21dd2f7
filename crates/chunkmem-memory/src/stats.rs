//! Allocator usage counters.

use serde::Serialize;

/// Statistics for arena usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArenaStats {
    /// Number of blocks handed out.
    pub allocations: u64,
    /// Bytes asked for by callers.
    pub bytes_requested: u64,
    /// Bytes consumed after rounding to the allocation granularity.
    pub bytes_reserved: u64,
    /// Chunks appended because no existing chunk could fit a request.
    pub chunk_growths: u64,
    /// Times the forward scan found an existing later chunk.
    pub chunk_reuses: u64,
    /// Number of bulk resets.
    pub resets: u64,
}

impl ArenaStats {
    pub(crate) fn record_alloc(&mut self, requested: usize, reserved: usize) {
        self.allocations += 1;
        self.bytes_requested += requested as u64;
        self.bytes_reserved += reserved as u64;
    }

    pub(crate) fn record_growth(&mut self) {
        self.chunk_growths += 1;
    }

    pub(crate) fn record_reuse(&mut self) {
        self.chunk_reuses += 1;
    }

    pub(crate) fn record_reset(&mut self) {
        self.resets += 1;
    }

    /// Bytes lost to rounding.
    #[must_use]
    pub fn padding_bytes(&self) -> u64 {
        self.bytes_reserved - self.bytes_requested
    }
}

/// Statistics for pool usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Number of blocks handed out.
    pub allocations: u64,
    /// Number of blocks returned.
    pub frees: u64,
    /// Allocations served from a never-touched slot.
    pub virgin_hits: u64,
    /// Allocations served from a chunk free list.
    pub recycled_hits: u64,
    /// Chunks appended on exhaustion of a growable pool.
    pub growths: u64,
    /// Allocations refused by a non-growable pool.
    pub exhaustions: u64,
}

impl PoolStats {
    pub(crate) fn record_virgin_hit(&mut self) {
        self.allocations += 1;
        self.virgin_hits += 1;
    }

    pub(crate) fn record_recycled_hit(&mut self) {
        self.allocations += 1;
        self.recycled_hits += 1;
    }

    pub(crate) fn record_free(&mut self) {
        self.frees += 1;
    }

    pub(crate) fn record_growth(&mut self) {
        self.growths += 1;
    }

    pub(crate) fn record_exhaustion(&mut self) {
        self.exhaustions += 1;
    }

    /// Fraction of allocations served by recycled slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn recycle_ratio(&self) -> f64 {
        if self.allocations == 0 {
            return 0.0;
        }
        self.recycled_hits as f64 / self.allocations as f64
    }
}
