//! Cache machine that hands the whole stream over as one table.

use std::sync::Arc;

use super::{BatchCache, CacheMachine};
use crate::cache_data::CacheData;
use crate::context::{trace_batch, Context};
use crate::error::CacheError;
use crate::frame::{concat_tables, Table};
use crate::memory::MemoryTiers;

/// Buffer for stages that need a producer's entire output at once, such as a
/// global sort or the build side of a broadcast join.
///
/// [`pull_from_cache`](BatchCache::pull_from_cache) waits for `finish`, then
/// decaches every queued batch and concatenates them in queue order.
///
/// The queue is drained before any batch is decached. If one fails, the
/// error is returned and the whole drained stream is discarded, so later
/// pulls return `Ok(None)`: a failed pull cannot be retried.
#[derive(Debug)]
pub struct ConcatenatingCacheMachine {
    machine: CacheMachine,
}

impl ConcatenatingCacheMachine {
    pub fn new(tiers: Arc<MemoryTiers>) -> Self {
        Self {
            machine: CacheMachine::new(tiers),
        }
    }
}

impl BatchCache for ConcatenatingCacheMachine {
    fn machine(&self) -> &CacheMachine {
        &self.machine
    }

    fn pull_from_cache(&self, ctx: Option<&Context>) -> Result<Option<Table>, CacheError> {
        let batches = self.machine.drain_when_finished();
        let drained = batches.len();
        let tables = batches
            .into_iter()
            .map(CacheData::decache)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::warn!(drained, error = %e, "Discarding stream after decache failure");
                e
            })?;

        let combined = concat_tables(tables)?;
        if let Some(table) = &combined {
            trace_batch(
                ctx,
                "Pull from ConcatenatingCacheMachine",
                "",
                table.num_rows(),
                "device",
            );
        }
        Ok(combined)
    }
}
