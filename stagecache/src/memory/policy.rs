//! Replaceable tier-selection strategies.

use super::Tier;

/// Snapshot of one tier's accounting at placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierHeadroom {
    pub tier: Tier,
    pub used: u64,
    pub limit: u64,
}

impl TierHeadroom {
    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Whether `requested` more bytes keep usage within `fraction` of the limit.
    pub fn fits(&self, requested: u64, fraction: f64) -> bool {
        let budget = (self.limit as f64 * fraction) as u64;
        self.used.saturating_add(requested) <= budget
    }
}

/// Chooses the tier a new batch is placed in.
///
/// `candidates` are ordered fastest first and only include tiers the batch
/// may move to. Returning `None` means no tier can take the batch.
pub trait PlacementPolicy: Send + Sync {
    fn select_tier(&self, requested: u64, candidates: &[TierHeadroom]) -> Option<Tier>;
}

/// Place a batch in the first tier that can hold it.
///
/// Each tier may be capped at a fraction of its limit so some headroom stays
/// free for allocations outside the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstFitPolicy {
    thresholds: [f64; 3],
}

impl Default for FirstFitPolicy {
    fn default() -> Self {
        Self {
            thresholds: [1.0; 3],
        }
    }
}

impl FirstFitPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap `tier` at `fraction` of its limit. Clamped to `0.0..=1.0`.
    pub fn with_threshold(mut self, tier: Tier, fraction: f64) -> Self {
        self.thresholds[tier.index()] = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn threshold(&self, tier: Tier) -> f64 {
        self.thresholds[tier.index()]
    }
}

impl PlacementPolicy for FirstFitPolicy {
    fn select_tier(&self, requested: u64, candidates: &[TierHeadroom]) -> Option<Tier> {
        candidates
            .iter()
            .find(|headroom| headroom.fits(requested, self.threshold(headroom.tier)))
            .map(|headroom| headroom.tier)
    }
}
