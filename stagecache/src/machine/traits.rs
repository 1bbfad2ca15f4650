//! Trait shared by cache machines that materialize batches on pull.

use super::{CacheMachine, CacheMachineStats};
use crate::cache_data::CacheData;
use crate::context::Context;
use crate::error::CacheError;
use crate::frame::{HostTable, Table};

/// A buffer between two execution stages.
///
/// Execution-graph edges hold `Arc<dyn BatchCache>` so each edge gets its
/// variant's pull behavior. Implementors only provide [`machine`], and
/// override [`pull_from_cache`] where the variant pulls differently.
///
/// [`machine`]: BatchCache::machine
/// [`pull_from_cache`]: BatchCache::pull_from_cache
///
/// # Example
///
/// ```
/// use stagecache::machine::{BatchCache, CacheMachine, ConcatenatingCacheMachine};
/// use stagecache::memory::MemoryTiers;
/// use std::sync::Arc;
///
/// let tiers = Arc::new(MemoryTiers::unbounded());
/// let edges: Vec<Arc<dyn BatchCache>> = vec![
///     Arc::new(CacheMachine::new(Arc::clone(&tiers))),
///     Arc::new(ConcatenatingCacheMachine::new(tiers)),
/// ];
///
/// for edge in &edges {
///     edge.finish();
///     assert!(edge.pull_from_cache(None).unwrap().is_none());
/// }
/// ```
pub trait BatchCache: Send + Sync {
    /// The underlying general cache machine.
    fn machine(&self) -> &CacheMachine;

    /// Take the next batch as a compute-ready table.
    ///
    /// `Ok(None)` marks the end of the stream.
    fn pull_from_cache(&self, ctx: Option<&Context>) -> Result<Option<Table>, CacheError> {
        self.machine().pull_from_cache(ctx)
    }

    fn add_to_cache(
        &self,
        table: Table,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<(), CacheError> {
        self.machine().add_to_cache(table, message_id, ctx)
    }

    fn add_cache_data(
        &self,
        data: CacheData,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<(), CacheError> {
        self.machine().add_cache_data(data, message_id, ctx)
    }

    fn add_host_frame_to_cache(
        &self,
        host_table: HostTable,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<(), CacheError> {
        self.machine()
            .add_host_frame_to_cache(host_table, message_id, ctx)
    }

    fn put(&self, index: usize, table: Table) -> Result<(), CacheError> {
        self.machine().put(index, table)
    }

    fn pull_cache_data(&self, ctx: Option<&Context>) -> Option<CacheData> {
        self.machine().pull_cache_data(ctx)
    }

    fn get_or_wait(&self, index: usize) -> Result<Option<Table>, CacheError> {
        self.machine().get_or_wait(index)
    }

    fn clear(&self) -> usize {
        self.machine().clear()
    }

    fn finish(&self) {
        self.machine().finish()
    }

    fn is_finished(&self) -> bool {
        self.machine().is_finished()
    }

    fn ready_to_execute(&self) -> bool {
        self.machine().ready_to_execute()
    }

    fn wait_for_next(&self) -> bool {
        self.machine().wait_for_next()
    }

    fn has_next_now(&self) -> bool {
        self.machine().has_next_now()
    }

    fn set_number_of_batches(&self, n_batches: usize) {
        self.machine().set_number_of_batches(n_batches)
    }

    fn number_of_batches(&self) -> usize {
        self.machine().number_of_batches()
    }

    fn num_bytes_added(&self) -> u64 {
        self.machine().num_bytes_added()
    }

    fn num_rows_added(&self) -> u64 {
        self.machine().num_rows_added()
    }

    fn stats(&self) -> CacheMachineStats {
        self.machine().stats()
    }
}

impl BatchCache for CacheMachine {
    fn machine(&self) -> &CacheMachine {
        self
    }
}
