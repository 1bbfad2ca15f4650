//! Cache machine counters and their snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::memory::Tier;

/// Point-in-time view of a cache machine's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMachineStats {
    /// Batches ever added.
    pub batches_added: u64,
    /// Sum of each added batch's reported size, before any tier conversion.
    pub bytes_added: u64,
    /// Sum of each added batch's row count.
    pub rows_added: u64,
    /// Batches placed in each tier, indexed by [`Tier::index`].
    pub placements: [u64; 3],
    /// Batches currently queued.
    pub queued: usize,
    pub finished: bool,
}

impl CacheMachineStats {
    /// Batches that landed in `tier`.
    pub fn placed_in(&self, tier: Tier) -> u64 {
        self.placements[tier.index()]
    }

    /// Fraction of batches placed below the device tier (0.0 to 1.0).
    pub fn spill_rate(&self) -> f64 {
        if self.batches_added == 0 {
            0.0
        } else {
            let spilled = self.placed_in(Tier::Host) + self.placed_in(Tier::Disk);
            spilled as f64 / self.batches_added as f64
        }
    }
}

/// Monotonic counters shared by all cache machine kinds.
#[derive(Debug, Default)]
pub(crate) struct MachineCounters {
    batches: AtomicU64,
    bytes: AtomicU64,
    rows: AtomicU64,
    placements: [AtomicU64; 3],
}

impl MachineCounters {
    pub(crate) fn record(&self, tier: Tier, bytes: u64, rows: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.rows.fetch_add(rows as u64, Ordering::Relaxed);
        self.placements[tier.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self, queued: usize, finished: bool) -> CacheMachineStats {
        CacheMachineStats {
            batches_added: self.batches.load(Ordering::Relaxed),
            bytes_added: self.bytes(),
            rows_added: self.rows(),
            placements: [
                self.placements[0].load(Ordering::Relaxed),
                self.placements[1].load(Ordering::Relaxed),
                self.placements[2].load(Ordering::Relaxed),
            ],
            queued,
            finished,
        }
    }
}
