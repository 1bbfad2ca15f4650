//! Memory-tier accounting and batch placement.
//!
//! Cache machines are handed a shared [`MemoryTiers`] capability listing,
//! fastest first, the resources backing each tier and the
//! [`PlacementPolicy`] that picks a tier for a new batch. Charged tiers hold a
//! [`MemoryCharge`] for every queued batch; other tiers are only read.
//!
//! # Example
//!
//! ```
//! use stagecache::memory::{MemoryTiers, Tier, TrackedMemoryResource};
//! use std::sync::Arc;
//!
//! let device = Arc::new(TrackedMemoryResource::new("device", 1024));
//! let host = Arc::new(TrackedMemoryResource::new("host", 1 << 20));
//! let tiers = MemoryTiers::builder()
//!     .tier(Tier::Device, device.clone())
//!     .tier(Tier::Host, host)
//!     .build();
//!
//! assert_eq!(tiers.place(512, Tier::Device).unwrap(), Tier::Device);
//! device.allocate(1000);
//! assert_eq!(tiers.place(512, Tier::Device).unwrap(), Tier::Host);
//! ```

mod policy;
mod resource;
mod tiers;

pub use policy::{FirstFitPolicy, PlacementPolicy, TierHeadroom};
pub use resource::{MemoryCharge, MemoryResource, Tier, TrackedMemoryResource};
pub use tiers::{default_spill_dir, MemoryTiers, MemoryTiersBuilder};
