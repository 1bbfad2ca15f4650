//! Configuration structs and defaults.

use std::path::PathBuf;

use crate::memory::{default_spill_dir, Tier};

/// Default device tier limit (4 GB).
pub const DEFAULT_DEVICE_LIMIT: u64 = 4 * 1024 * 1024 * 1024;

/// Default host tier limit (16 GB).
pub const DEFAULT_HOST_LIMIT: u64 = 16 * 1024 * 1024 * 1024;

/// Default disk tier limit (64 GB).
pub const DEFAULT_DISK_LIMIT: u64 = 64 * 1024 * 1024 * 1024;

/// Accounting settings for one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierSettings {
    /// Byte limit, or `None` when the tier is not tracked.
    pub limit: Option<u64>,
    /// Fraction of `limit` the cache may fill.
    pub threshold: f64,
}

impl TierSettings {
    pub fn limited(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            threshold: 1.0,
        }
    }

    pub fn untracked() -> Self {
        Self {
            limit: None,
            threshold: 1.0,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Tier limits and spill location for cache machines.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub device: TierSettings,
    pub host: TierSettings,
    pub disk: TierSettings,
    pub spill_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            device: TierSettings::limited(DEFAULT_DEVICE_LIMIT),
            host: TierSettings::limited(DEFAULT_HOST_LIMIT),
            disk: TierSettings::limited(DEFAULT_DISK_LIMIT),
            spill_dir: default_spill_dir(),
        }
    }
}

impl CacheConfig {
    pub fn tier(&self, tier: Tier) -> &TierSettings {
        match tier {
            Tier::Device => &self.device,
            Tier::Host => &self.host,
            Tier::Disk => &self.disk,
        }
    }

    pub(crate) fn tier_mut(&mut self, tier: Tier) -> &mut TierSettings {
        match tier {
            Tier::Device => &mut self.device,
            Tier::Host => &mut self.host,
            Tier::Disk => &mut self.disk,
        }
    }

    pub fn with_tier(mut self, tier: Tier, settings: TierSettings) -> Self {
        *self.tier_mut(tier) = settings;
        self
    }

    pub fn with_device_limit(self, limit: u64) -> Self {
        self.with_tier(Tier::Device, TierSettings::limited(limit))
    }

    pub fn with_host_limit(self, limit: u64) -> Self {
        self.with_tier(Tier::Host, TierSettings::limited(limit))
    }

    pub fn with_disk_limit(self, limit: u64) -> Self {
        self.with_tier(Tier::Disk, TierSettings::limited(limit))
    }

    pub fn with_spill_dir(mut self, dir: PathBuf) -> Self {
        self.spill_dir = dir;
        self
    }
}
