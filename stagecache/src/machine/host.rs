//! Cache machine that only ever holds host-resident batches.

use super::stats::{CacheMachineStats, MachineCounters};
use crate::cache_data::HostCacheData;
use crate::context::{trace_batch, Context};
use crate::error::CacheError;
use crate::frame::{HostTable, Table};
use crate::memory::Tier;
use crate::queue::{Message, WaitingQueue};

/// Host-side buffer for stages that aggregate results before a single
/// device-side merge, e.g. partial results collected from other nodes.
///
/// Batches are never materialized on the device: pulls hand back the host
/// form as it was added.
#[derive(Debug, Default)]
pub struct HostCacheMachine {
    waiting_cache: WaitingQueue<HostCacheData>,
    counters: MachineCounters,
}

impl HostCacheMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already serialized table.
    pub fn add_to_cache(&self, host_table: HostTable, message_id: &str, ctx: Option<&Context>) {
        self.enqueue(
            HostCacheData::from_host_table(host_table),
            message_id,
            ctx,
            "Add to HostCacheMachine",
        );
    }

    /// Serialize a compute-ready table into host memory and add it.
    pub fn add_table(
        &self,
        table: Table,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<(), CacheError> {
        let bytes = table.size_in_bytes();
        let data = HostCacheData::from_table(table)?;
        self.record_and_put(data, bytes, message_id, ctx, "Add table to HostCacheMachine");
        Ok(())
    }

    fn enqueue(&self, data: HostCacheData, message_id: &str, ctx: Option<&Context>, info: &str) {
        let bytes = data.size_in_bytes();
        self.record_and_put(data, bytes, message_id, ctx, info);
    }

    fn record_and_put(
        &self,
        data: HostCacheData,
        bytes: u64,
        message_id: &str,
        ctx: Option<&Context>,
        info: &str,
    ) {
        self.counters.record(Tier::Host, bytes, data.num_rows());
        trace_batch(ctx, info, message_id, data.num_rows(), "host");
        self.waiting_cache
            .put(Message::new(data, Tier::Host.index(), message_id));
    }

    /// Block for the next batch; `None` once finished and drained.
    pub fn pull_from_cache(&self, ctx: Option<&Context>) -> Option<HostTable> {
        let message = self.waiting_cache.pop_or_wait();
        self.release(message, ctx, "Pull from HostCacheMachine")
    }

    /// Block for the batch added with `message_id`; `None` if the machine
    /// finishes without it.
    pub fn pull_by_message_id(&self, message_id: &str, ctx: Option<&Context>) -> Option<HostTable> {
        self.release(
            self.waiting_cache.get_or_wait(message_id),
            ctx,
            "Pull by id from HostCacheMachine",
        )
    }

    fn release(
        &self,
        message: Option<Message<HostCacheData>>,
        ctx: Option<&Context>,
        info: &str,
    ) -> Option<HostTable> {
        let message = message?;
        let message_id = message.message_id().to_string();
        let data = message.release_data();
        trace_batch(ctx, info, &message_id, data.num_rows(), "host");
        Some(data.release_host_table())
    }

    pub fn clear(&self) -> usize {
        self.waiting_cache.clear()
    }

    pub fn finish(&self) {
        self.waiting_cache.finish();
    }

    pub fn is_finished(&self) -> bool {
        self.waiting_cache.is_finished()
    }

    pub fn ready_to_execute(&self) -> bool {
        self.waiting_cache.ready_to_execute()
    }

    pub fn wait_for_next(&self) -> bool {
        self.waiting_cache.wait_for_next()
    }

    pub fn has_next_now(&self) -> bool {
        self.waiting_cache.has_next_now()
    }

    pub fn set_number_of_batches(&self, n_batches: usize) {
        self.waiting_cache.set_number_of_batches(n_batches);
    }

    pub fn number_of_batches(&self) -> usize {
        self.waiting_cache.number_of_batches()
    }

    pub fn num_bytes_added(&self) -> u64 {
        self.counters.bytes()
    }

    pub fn num_rows_added(&self) -> u64 {
        self.counters.rows()
    }

    pub fn stats(&self) -> CacheMachineStats {
        let queued = self.waiting_cache.len();
        let finished = self.waiting_cache.is_finished();
        self.counters.snapshot(queued, finished)
    }
}
