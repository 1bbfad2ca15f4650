//! Cache machine whose pull never stalls the caller.

use std::sync::Arc;

use super::{BatchCache, CacheMachine};
use crate::context::Context;
use crate::error::CacheError;
use crate::frame::Table;
use crate::memory::MemoryTiers;

/// Best-effort buffer for stages that must proceed with partial data.
///
/// [`pull_from_cache`](BatchCache::pull_from_cache) returns the head batch if
/// one is queued and `Ok(None)` otherwise, finished or not.
#[derive(Debug)]
pub struct NonWaitingCacheMachine {
    machine: CacheMachine,
}

impl NonWaitingCacheMachine {
    pub fn new(tiers: Arc<MemoryTiers>) -> Self {
        Self {
            machine: CacheMachine::new(tiers),
        }
    }
}

impl BatchCache for NonWaitingCacheMachine {
    fn machine(&self) -> &CacheMachine {
        &self.machine
    }

    fn pull_from_cache(&self, ctx: Option<&Context>) -> Result<Option<Table>, CacheError> {
        self.machine.try_pull(ctx)
    }
}
