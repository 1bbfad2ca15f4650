//! The injected tier capability shared by cache machines.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{
    FirstFitPolicy, MemoryCharge, MemoryResource, PlacementPolicy, Tier, TierHeadroom,
    TrackedMemoryResource,
};
use crate::config::CacheConfig;
use crate::error::CacheError;

/// Default spill directory: `<platform cache dir>/stagecache/spill`.
pub fn default_spill_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stagecache")
        .join("spill")
}

struct TierResource {
    tier: Tier,
    resource: Arc<dyn MemoryResource>,
    /// Set when queued batches are charged against this tier.
    charged: Option<Arc<TrackedMemoryResource>>,
}

/// Ordered tier accounting, placement policy, and spill location.
///
/// A tier without a configured resource is not tracked: batches are never
/// moved into it by placement, and a batch already there stays there.
///
/// Tiers added with [`MemoryTiersBuilder::charged_tier`] (every tier built by
/// [`from_config`](Self::from_config)) are charged by cache machines for the
/// batches they hold. Tiers added with [`MemoryTiersBuilder::tier`] are
/// accounted by their external owner and only read.
pub struct MemoryTiers {
    resources: Vec<TierResource>,
    policy: Arc<dyn PlacementPolicy>,
    spill_dir: PathBuf,
}

impl fmt::Debug for MemoryTiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTiers")
            .field("tiers", &self.describe())
            .field("spill_dir", &self.spill_dir)
            .finish()
    }
}

impl MemoryTiers {
    /// No accounting at all: every batch stays where it is produced.
    pub fn unbounded() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MemoryTiersBuilder {
        MemoryTiersBuilder::default()
    }

    /// Build a charged resource for every tier with a configured limit.
    pub fn from_config(config: &CacheConfig) -> Self {
        let mut policy = FirstFitPolicy::new();
        let mut builder = Self::builder().spill_dir(config.spill_dir.clone());

        for tier in Tier::ALL {
            let settings = config.tier(tier);
            policy = policy.with_threshold(tier, settings.threshold);
            if let Some(limit) = settings.limit {
                builder = builder.charged_tier(
                    tier,
                    Arc::new(TrackedMemoryResource::new(tier.to_string(), limit)),
                );
            }
        }

        builder.policy(Arc::new(policy)).build()
    }

    pub fn spill_dir(&self) -> &Path {
        &self.spill_dir
    }

    /// The accounting handle for `tier`, if it is tracked.
    pub fn resource(&self, tier: Tier) -> Option<&Arc<dyn MemoryResource>> {
        self.resources
            .iter()
            .find(|entry| entry.tier == tier)
            .map(|entry| &entry.resource)
    }

    /// The charged accounting for `tier`, if cache machines charge it.
    pub fn charged(&self, tier: Tier) -> Option<&Arc<TrackedMemoryResource>> {
        self.resources
            .iter()
            .find(|entry| entry.tier == tier)
            .and_then(|entry| entry.charged.as_ref())
    }

    /// Hold `bytes` against `tier` until the charge is dropped.
    ///
    /// Returns `None` for tiers that are not charged.
    pub fn charge(&self, tier: Tier, bytes: u64) -> Option<MemoryCharge> {
        self.charged(tier).map(|resource| resource.charge(bytes))
    }

    /// Current headroom of every tracked tier, fastest first.
    pub fn headroom(&self) -> Vec<TierHeadroom> {
        self.resources
            .iter()
            .map(|entry| TierHeadroom {
                tier: entry.tier,
                used: entry.resource.memory_used(),
                limit: entry.resource.memory_limit(),
            })
            .collect()
    }

    /// Choose a tier for `requested` bytes currently held in `floor`.
    ///
    /// Only `floor` and slower tiers are candidates. When none of them is
    /// tracked the batch stays in `floor`.
    pub fn place(&self, requested: u64, floor: Tier) -> Result<Tier, CacheError> {
        let candidates: Vec<TierHeadroom> = self
            .headroom()
            .into_iter()
            .filter(|headroom| headroom.tier >= floor)
            .collect();
        if candidates.is_empty() {
            return Ok(floor);
        }

        self.policy
            .select_tier(requested, &candidates)
            .ok_or_else(|| {
                let tiers = describe_headroom(&candidates);
                tracing::warn!(requested, tiers = %tiers, "No tier has headroom for batch");
                CacheError::OutOfSpace { requested, tiers }
            })
    }

    fn describe(&self) -> String {
        describe_headroom(&self.headroom())
    }
}

fn describe_headroom(headroom: &[TierHeadroom]) -> String {
    headroom
        .iter()
        .map(|h| format!("{} {}/{}", h.tier, h.used, h.limit))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder for [`MemoryTiers`].
pub struct MemoryTiersBuilder {
    resources: Vec<TierResource>,
    policy: Arc<dyn PlacementPolicy>,
    spill_dir: Option<PathBuf>,
}

impl Default for MemoryTiersBuilder {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            policy: Arc::new(FirstFitPolicy::default()),
            spill_dir: None,
        }
    }
}

impl MemoryTiersBuilder {
    /// Track `tier` with externally maintained `resource`, replacing any
    /// earlier handle for it.
    pub fn tier(self, tier: Tier, resource: Arc<dyn MemoryResource>) -> Self {
        self.insert(TierResource {
            tier,
            resource,
            charged: None,
        })
    }

    /// Track `tier` with `resource` and have cache machines charge it for
    /// the batches they queue.
    pub fn charged_tier(self, tier: Tier, resource: Arc<TrackedMemoryResource>) -> Self {
        self.insert(TierResource {
            tier,
            resource: resource.clone(),
            charged: Some(resource),
        })
    }

    fn insert(mut self, entry: TierResource) -> Self {
        self.resources.retain(|existing| existing.tier != entry.tier);
        self.resources.push(entry);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn PlacementPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(dir.into());
        self
    }

    pub fn build(mut self) -> MemoryTiers {
        self.resources.sort_by_key(|entry| entry.tier);
        MemoryTiers {
            resources: self.resources,
            policy: self.policy,
            spill_dir: self.spill_dir.unwrap_or_else(default_spill_dir),
        }
    }
}
