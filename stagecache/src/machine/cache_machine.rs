//! The general cache machine: tier placement on insert, decache on pull.

use std::sync::Arc;

use super::stats::{CacheMachineStats, MachineCounters};
use crate::cache_data::CacheData;
use crate::context::{trace_batch, Context};
use crate::error::CacheError;
use crate::frame::{HostTable, Table};
use crate::memory::{MemoryCharge, MemoryTiers};
use crate::queue::{Message, WaitingQueue};

/// A queued batch and the tier usage held for it while it waits.
#[derive(Debug)]
struct QueuedBatch {
    data: CacheData,
    _charge: Option<MemoryCharge>,
}

impl QueuedBatch {
    /// Take the batch out, releasing its tier charge.
    fn into_data(self) -> CacheData {
        self.data
    }
}

/// Buffer between two execution stages.
///
/// Every added batch is placed once, at insertion, in the fastest tier with
/// headroom at or below the tier it arrives in. Already placed batches are
/// never rebalanced. On charged tiers a batch holds its size against the tier
/// from insertion until it leaves the queue (pulled, drained or cleared).
/// Pull operations block until data arrives or the machine is finished;
/// `Ok(None)` marks the end of the stream.
#[derive(Debug)]
pub struct CacheMachine {
    waiting_cache: WaitingQueue<QueuedBatch>,
    tiers: Arc<MemoryTiers>,
    counters: MachineCounters,
}

impl CacheMachine {
    pub fn new(tiers: Arc<MemoryTiers>) -> Self {
        Self {
            waiting_cache: WaitingQueue::new(),
            tiers,
            counters: MachineCounters::default(),
        }
    }

    pub fn memory_tiers(&self) -> &Arc<MemoryTiers> {
        &self.tiers
    }

    /// Add a compute-ready table, spilling it if the device tier is full.
    ///
    /// On error the table is dropped and nothing is queued.
    pub fn add_to_cache(
        &self,
        table: Table,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<(), CacheError> {
        self.place_and_enqueue(
            CacheData::device(table),
            message_id,
            ctx,
            "Add to CacheMachine",
        )
    }

    /// Add an already tiered batch. It may move to a slower tier, never a
    /// faster one.
    pub fn add_cache_data(
        &self,
        data: CacheData,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<(), CacheError> {
        self.place_and_enqueue(data, message_id, ctx, "Add CacheData to CacheMachine")
    }

    /// Add a table already serialized into host memory.
    pub fn add_host_frame_to_cache(
        &self,
        host_table: HostTable,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<(), CacheError> {
        self.place_and_enqueue(
            CacheData::host(host_table),
            message_id,
            ctx,
            "Add host frame to CacheMachine",
        )
    }

    /// Add `table` under the message id `index.to_string()`.
    pub fn put(&self, index: usize, table: Table) -> Result<(), CacheError> {
        self.add_to_cache(table, &index.to_string(), None)
    }

    fn place_and_enqueue(
        &self,
        data: CacheData,
        message_id: &str,
        ctx: Option<&Context>,
        info: &str,
    ) -> Result<(), CacheError> {
        let bytes = data.size_in_bytes();
        let rows = data.num_rows();
        let arrived_in = data.tier();

        let target = self.tiers.place(bytes, arrived_in)?;
        let data = data.demote_to(target, self.tiers.spill_dir())?;
        let tier = data.tier();

        if tier != arrived_in {
            tracing::debug!(
                message_id,
                bytes,
                from = %arrived_in,
                to = %tier,
                "Batch spilled to slower tier"
            );
        }

        let charge = self.tiers.charge(tier, data.size_in_bytes());
        self.counters.record(tier, bytes, rows);
        trace_batch(ctx, info, message_id, rows, &data.data_type().to_string());

        let queued = QueuedBatch {
            data,
            _charge: charge,
        };
        self.waiting_cache
            .put(Message::new(queued, tier.index(), message_id));
        Ok(())
    }

    /// Block for the next batch and materialize it.
    ///
    /// Returns `Ok(None)` once the machine is finished and drained.
    pub fn pull_from_cache(&self, ctx: Option<&Context>) -> Result<Option<Table>, CacheError> {
        let message = self.waiting_cache.pop_or_wait();
        self.decache_message(message, ctx, "Pull from CacheMachine")
    }

    /// Block for the next batch without materializing it.
    pub fn pull_cache_data(&self, ctx: Option<&Context>) -> Option<CacheData> {
        let message = self.waiting_cache.pop_or_wait()?;
        let message_id = message.message_id().to_string();
        let data = message.release_data().into_data();
        trace_batch(
            ctx,
            "Pull CacheData from CacheMachine",
            &message_id,
            data.num_rows(),
            &data.data_type().to_string(),
        );
        Some(data)
    }

    /// Block for the batch added with `message_id` and materialize it.
    ///
    /// Returns `Ok(None)` if the machine finishes without such a batch.
    pub fn pull_by_message_id(
        &self,
        message_id: &str,
        ctx: Option<&Context>,
    ) -> Result<Option<Table>, CacheError> {
        self.decache_message(
            self.waiting_cache.get_or_wait(message_id),
            ctx,
            "Pull by id from CacheMachine",
        )
    }

    /// Block for the batch added with [`put`](Self::put) under `index`.
    pub fn get_or_wait(&self, index: usize) -> Result<Option<Table>, CacheError> {
        self.pull_by_message_id(&index.to_string(), None)
    }

    /// Pop the head batch if one is queued right now, and materialize it.
    pub(crate) fn try_pull(&self, ctx: Option<&Context>) -> Result<Option<Table>, CacheError> {
        let message = self.waiting_cache.try_pop();
        self.decache_message(message, ctx, "Pull from CacheMachine")
    }

    /// Block until finished, then take every queued batch in order.
    pub(crate) fn drain_when_finished(&self) -> Vec<CacheData> {
        self.waiting_cache
            .get_all_or_wait()
            .into_iter()
            .map(|message| message.release_data().into_data())
            .collect()
    }

    fn decache_message(
        &self,
        message: Option<Message<QueuedBatch>>,
        ctx: Option<&Context>,
        info: &str,
    ) -> Result<Option<Table>, CacheError> {
        let Some(message) = message else {
            return Ok(None);
        };
        let message_id = message.message_id().to_string();
        let data = message.release_data().into_data();
        trace_batch(
            ctx,
            info,
            &message_id,
            data.num_rows(),
            &data.data_type().to_string(),
        );
        data.decache().map(Some)
    }

    /// Drop every queued batch without materializing it.
    ///
    /// Spill files of dropped batches are removed and their tier charges
    /// released. Returns how many batches were discarded.
    pub fn clear(&self) -> usize {
        let discarded = self.waiting_cache.clear();
        if discarded > 0 {
            tracing::debug!(discarded, "Cleared CacheMachine");
        }
        discarded
    }

    /// Signal that no more batches will be added. Releases all waiters.
    pub fn finish(&self) {
        self.waiting_cache.finish();
    }

    pub fn is_finished(&self) -> bool {
        self.waiting_cache.is_finished()
    }

    /// Block until a batch is queued or the machine is finished, then report
    /// whether more work is still possible.
    pub fn ready_to_execute(&self) -> bool {
        self.waiting_cache.ready_to_execute()
    }

    /// Block until a batch is queued or the machine is finished, then report
    /// whether a batch is queued.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_data::test_support::numbered_table;
    use crate::cache_data::CacheDataType;
    use crate::frame::serialize_to_host;
    use crate::config::{CacheConfig, TierSettings};
    use crate::memory::{MemoryResource, Tier, TrackedMemoryResource};
    use arrow::array::Int64Array;
    use tempfile::TempDir;

    fn unbounded() -> CacheMachine {
        CacheMachine::new(Arc::new(MemoryTiers::unbounded()))
    }

    fn first_id(table: &Table) -> i64 {
        table
            .batch()
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .value(0)
    }

    fn tiers_with(device: u64, host: u64, dir: &TempDir) -> Arc<MemoryTiers> {
        Arc::new(
            MemoryTiers::builder()
                .tier(Tier::Device, Arc::new(TrackedMemoryResource::new("device", device)))
                .tier(Tier::Host, Arc::new(TrackedMemoryResource::new("host", host)))
                .tier(Tier::Disk, Arc::new(TrackedMemoryResource::new("disk", u64::MAX)))
                .spill_dir(dir.path())
                .build(),
        )
    }

    #[test]
    fn test_fifo_pull() {
        let machine = unbounded();
        machine.add_to_cache(numbered_table(0, 3), "", None).unwrap();
        machine.add_to_cache(numbered_table(10, 3), "", None).unwrap();
        machine.finish();

        assert_eq!(first_id(&machine.pull_from_cache(None).unwrap().unwrap()), 0);
        assert_eq!(first_id(&machine.pull_from_cache(None).unwrap().unwrap()), 10);
        assert!(machine.pull_from_cache(None).unwrap().is_none());
    }

    #[test]
    fn test_put_and_get_by_index() {
        let machine = unbounded();
        machine.put(0, numbered_table(0, 1)).unwrap();
        machine.put(1, numbered_table(100, 1)).unwrap();
        machine.put(2, numbered_table(200, 1)).unwrap();

        assert_eq!(first_id(&machine.get_or_wait(2).unwrap().unwrap()), 200);
        assert_eq!(first_id(&machine.get_or_wait(0).unwrap().unwrap()), 0);

        machine.finish();
        assert!(machine.get_or_wait(7).unwrap().is_none());
        assert_eq!(first_id(&machine.pull_from_cache(None).unwrap().unwrap()), 100);
    }

    #[test]
    fn test_placement_spills_when_device_full() {
        let dir = TempDir::new().unwrap();
        let machine = CacheMachine::new(tiers_with(0, u64::MAX, &dir));

        machine.add_to_cache(numbered_table(0, 10), "a", None).unwrap();
        let data = machine.pull_cache_data(None).unwrap();
        assert_eq!(data.data_type(), CacheDataType::Host);
        assert_eq!(machine.stats().placed_in(Tier::Host), 1);
    }

    #[test]
    fn test_cache_index_is_tier_index() {
        let dir = TempDir::new().unwrap();
        let machine = CacheMachine::new(tiers_with(0, 0, &dir));

        machine.add_to_cache(numbered_table(0, 5), "spilled", None).unwrap();
        let message = machine.waiting_cache.try_pop().unwrap();
        assert_eq!(message.cache_index(), Tier::Disk.index());
        assert_eq!(message.data().data.data_type(), CacheDataType::LocalFile);
    }

    #[test]
    fn test_out_of_space_queues_nothing() {
        let dir = TempDir::new().unwrap();
        let tiers = Arc::new(
            MemoryTiers::builder()
                .tier(Tier::Device, Arc::new(TrackedMemoryResource::new("device", 0)))
                .tier(Tier::Host, Arc::new(TrackedMemoryResource::new("host", 0)))
                .tier(Tier::Disk, Arc::new(TrackedMemoryResource::new("disk", 0)))
                .spill_dir(dir.path())
                .build(),
        );
        let machine = CacheMachine::new(tiers);

        let err = machine.add_to_cache(numbered_table(0, 5), "", None).unwrap_err();
        assert!(err.is_out_of_space());
        assert!(!machine.has_next_now());
        assert_eq!(machine.num_rows_added(), 0);
    }

    #[test]
    fn test_host_frame_is_never_promoted() {
        let machine = unbounded();
        let host = serialize_to_host(&numbered_table(0, 4)).unwrap();

        machine.add_host_frame_to_cache(host, "h", None).unwrap();
        let data = machine.pull_cache_data(None).unwrap();
        assert_eq!(data.data_type(), CacheDataType::Host);
        assert_eq!(data.decache().unwrap().num_rows(), 4);
    }

    #[test]
    fn test_add_cache_data_keeps_tier() {
        let dir = TempDir::new().unwrap();
        let machine = unbounded();
        let data = CacheData::local_file(numbered_table(0, 6), dir.path()).unwrap();

        machine.add_cache_data(data, "", None).unwrap();
        assert_eq!(machine.stats().placed_in(Tier::Disk), 1);
        assert_eq!(machine.pull_from_cache(None).unwrap().unwrap().num_rows(), 6);
    }

    #[test]
    fn test_clear_discards_and_removes_spill_files() {
        let dir = TempDir::new().unwrap();
        let machine = CacheMachine::new(tiers_with(0, 0, &dir));
        machine.add_to_cache(numbered_table(0, 5), "", None).unwrap();
        machine.add_to_cache(numbered_table(5, 5), "", None).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);

        assert_eq!(machine.clear(), 2);
        assert!(!machine.has_next_now());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        // Counters are monotonic.
        assert_eq!(machine.num_rows_added(), 10);
    }

    #[test]
    fn test_readiness_checks() {
        let machine = unbounded();
        assert!(!machine.has_next_now());

        machine.add_to_cache(numbered_table(0, 1), "", None).unwrap();
        assert!(machine.has_next_now());
        assert!(machine.wait_for_next());
        assert!(machine.ready_to_execute());

        machine.finish();
        assert!(machine.is_finished());
        assert!(!machine.ready_to_execute());
    }

    #[test]
    fn test_number_of_batches() {
        let machine = unbounded();
        assert_eq!(machine.number_of_batches(), 1);
        machine.set_number_of_batches(8);
        assert_eq!(machine.number_of_batches(), 8);
    }

    #[test]
    fn test_stats_snapshot() {
        let machine = unbounded();
        let table = numbered_table(0, 100);
        let bytes = table.size_in_bytes();
        machine.add_to_cache(table, "", None).unwrap();

        let stats = machine.stats();
        assert_eq!(stats.batches_added, 1);
        assert_eq!(stats.bytes_added, bytes);
        assert_eq!(stats.rows_added, 100);
        assert_eq!(stats.placed_in(Tier::Device), 1);
        assert_eq!(stats.queued, 1);
        assert!(!stats.finished);
    }

    fn charged_tiers(device: u64, dir: &TempDir) -> (Arc<MemoryTiers>, Arc<TrackedMemoryResource>) {
        let device = Arc::new(TrackedMemoryResource::new("device", device));
        let tiers = MemoryTiers::builder()
            .charged_tier(Tier::Device, device.clone())
            .charged_tier(Tier::Disk, Arc::new(TrackedMemoryResource::new("disk", u64::MAX)))
            .spill_dir(dir.path())
            .build();
        (Arc::new(tiers), device)
    }

    #[test]
    fn test_configured_limit_spills_queued_batches() {
        let dir = TempDir::new().unwrap();
        // Identical batches, so every one reports the same size.
        let batch_size = numbered_table(0, 50).size_in_bytes();
        let config = CacheConfig::default()
            .with_tier(Tier::Device, TierSettings::limited(2 * batch_size))
            .with_tier(Tier::Host, TierSettings::limited(2 * batch_size))
            .with_spill_dir(dir.path().to_path_buf());
        let machine = CacheMachine::new(Arc::new(MemoryTiers::from_config(&config)));

        for _ in 0..3 {
            machine.add_to_cache(numbered_table(0, 50), "", None).unwrap();
        }

        let stats = machine.stats();
        assert_eq!(stats.placed_in(Tier::Device), 2);
        assert_eq!(stats.placed_in(Tier::Device) + stats.placed_in(Tier::Host), 3);
        let device = machine.memory_tiers().charged(Tier::Device).unwrap();
        assert_eq!(device.memory_used(), 2 * batch_size);
    }

    #[test]
    fn test_pull_releases_tier_charge() {
        let dir = TempDir::new().unwrap();
        let batch_size = numbered_table(0, 10).size_in_bytes();
        let (tiers, device) = charged_tiers(batch_size, &dir);
        let machine = CacheMachine::new(tiers);

        machine.add_to_cache(numbered_table(0, 10), "a", None).unwrap();
        machine.add_to_cache(numbered_table(0, 10), "b", None).unwrap();
        assert_eq!(device.memory_used(), batch_size);
        assert_eq!(machine.stats().placed_in(Tier::Disk), 1);

        machine.pull_from_cache(None).unwrap().unwrap();
        assert_eq!(device.memory_used(), 0);

        machine.add_to_cache(numbered_table(0, 10), "c", None).unwrap();
        assert_eq!(machine.stats().placed_in(Tier::Device), 2);
    }

    #[test]
    fn test_clear_and_pull_cache_data_release_charges() {
        let dir = TempDir::new().unwrap();
        let (tiers, device) = charged_tiers(u64::MAX / 2, &dir);
        let machine = CacheMachine::new(tiers);

        machine.add_to_cache(numbered_table(0, 10), "kept", None).unwrap();
        machine.add_to_cache(numbered_table(0, 10), "", None).unwrap();
        machine.add_to_cache(numbered_table(0, 10), "", None).unwrap();
        assert!(device.memory_used() > 0);

        let data = machine.pull_cache_data(None).unwrap();
        assert_eq!(data.num_rows(), 10);
        assert_eq!(machine.clear(), 2);
        assert_eq!(device.memory_used(), 0);
        assert_eq!(device.peak_used(), 3 * numbered_table(0, 10).size_in_bytes());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pull_cache_data_logs_message_id() {
        let machine = unbounded();
        machine.add_to_cache(numbered_table(0, 3), "join-left", None).unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let data = tracing::subscriber::with_default(subscriber, || {
            machine.pull_cache_data(Some(&Context::new(1, 2, 3)))
        });

        assert_eq!(data.unwrap().num_rows(), 3);
        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("Pull CacheData from CacheMachine"));
        assert!(output.contains("join-left"));
    }
}
