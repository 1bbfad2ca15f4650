//! Memory tiers and the accounting handles consulted for each.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Storage class for a batch, ordered fastest to slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Accelerator memory; batches are compute-ready.
    Device,
    /// Host memory; batches are serialized.
    Host,
    /// Local disk; batches are spill files.
    Disk,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Device, Tier::Host, Tier::Disk];

    /// Position in fastest-first order.
    pub fn index(self) -> usize {
        match self {
            Self::Device => 0,
            Self::Host => 1,
            Self::Disk => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Host => write!(f, "host"),
            Self::Disk => write!(f, "disk"),
        }
    }
}

/// Read-only view of one tier's memory accounting.
///
/// Implementations are shared by every cache machine and may be updated
/// concurrently by their owners; readers get a best-effort snapshot.
pub trait MemoryResource: Send + Sync {
    fn name(&self) -> &str;

    /// Bytes currently in use.
    fn memory_used(&self) -> u64;

    /// Upper bound on bytes in use.
    fn memory_limit(&self) -> u64;

    /// Remaining headroom in bytes.
    fn available(&self) -> u64 {
        self.memory_limit().saturating_sub(self.memory_used())
    }
}

/// Atomic counter-based accounting for one tier.
///
/// Owners call [`allocate`](Self::allocate) and
/// [`deallocate`](Self::deallocate) as memory changes hands, or hold a
/// [`MemoryCharge`] that releases its bytes when dropped.
#[derive(Debug)]
pub struct TrackedMemoryResource {
    name: String,
    limit: AtomicU64,
    used: AtomicU64,
    peak_used: AtomicU64,
}

impl TrackedMemoryResource {
    pub fn new(name: impl Into<String>, limit: u64) -> Self {
        Self {
            name: name.into(),
            limit: AtomicU64::new(limit),
            used: AtomicU64::new(0),
            peak_used: AtomicU64::new(0),
        }
    }

    /// Record `bytes` as in use.
    pub fn allocate(&self, bytes: u64) {
        let current = self.used.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak_used.fetch_max(current, Ordering::Relaxed);
    }

    /// Record `bytes` as released. Never drops below zero.
    pub fn deallocate(&self, bytes: u64) {
        let _ = self
            .used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                Some(used.saturating_sub(bytes))
            });
    }

    pub fn set_limit(&self, limit: u64) {
        self.limit.store(limit, Ordering::Relaxed);
    }

    /// Highest usage observed since creation.
    pub fn peak_used(&self) -> u64 {
        self.peak_used.load(Ordering::Relaxed)
    }

    /// Record `bytes` as in use until the returned charge is dropped.
    pub fn charge(self: &Arc<Self>, bytes: u64) -> MemoryCharge {
        self.allocate(bytes);
        MemoryCharge {
            resource: Arc::clone(self),
            bytes,
        }
    }
}

/// Bytes held against a [`TrackedMemoryResource`]; released on drop.
#[derive(Debug)]
#[must_use = "dropping a charge releases it immediately"]
pub struct MemoryCharge {
    resource: Arc<TrackedMemoryResource>,
    bytes: u64,
}

impl MemoryCharge {
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for MemoryCharge {
    fn drop(&mut self) {
        self.resource.deallocate(self.bytes);
    }
}

impl MemoryResource for TrackedMemoryResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn memory_used(&self) -> u64 {
        self.used.load(Ordering::Relaxed)
    }

    fn memory_limit(&self) -> u64 {
        self.limit.load(Ordering::Relaxed)
    }
}
