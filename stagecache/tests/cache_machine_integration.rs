//! Integration tests for cache machines driven by producer and consumer
//! stages on separate threads.
//!
//! Run with: `cargo test --test cache_machine_integration`

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;

use stagecache::context::Context;
use stagecache::frame::Table;
use stagecache::machine::{
    BatchCache, CacheMachine, ConcatenatingCacheMachine, NonWaitingCacheMachine,
};
use stagecache::memory::{MemoryTiers, Tier};

// ============================================================================
// Test Helpers
// ============================================================================

/// Table of `rows` rows whose `id` column counts up from `start`.
fn numbered_table(start: i64, rows: usize) -> Table {
    let ids: Vec<i64> = (start..start + rows as i64).collect();
    let labels: Vec<String> = ids.iter().map(|id| format!("row-{}", id)).collect();
    RecordBatch::try_from_iter(vec![
        ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("label", Arc::new(StringArray::from(labels)) as ArrayRef),
    ])
    .unwrap()
    .into()
}

fn ids(table: &Table) -> Vec<i64> {
    table
        .batch()
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .values()
        .to_vec()
}

fn unbounded_tiers() -> Arc<MemoryTiers> {
    Arc::new(MemoryTiers::unbounded())
}

// ============================================================================
// Concatenation
// ============================================================================

#[test]
fn test_concatenating_machine_returns_whole_stream() {
    let machine = ConcatenatingCacheMachine::new(unbounded_tiers());
    machine.add_to_cache(numbered_table(0, 10), "", None).unwrap();
    machine.add_to_cache(numbered_table(10, 20), "", None).unwrap();
    machine.add_to_cache(numbered_table(30, 5), "", None).unwrap();
    machine.finish();

    let table = machine.pull_from_cache(None).unwrap().unwrap();
    assert_eq!(table.num_rows(), 35);
    assert_eq!(ids(&table), (0..35).collect::<Vec<i64>>());
}

#[test]
fn test_concatenating_machine_waits_for_finish() {
    let machine = Arc::new(ConcatenatingCacheMachine::new(unbounded_tiers()));
    let (tx, rx) = mpsc::channel();

    let consumer = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || {
            let table = machine.pull_from_cache(None).unwrap();
            tx.send(table.map(|t| t.num_rows())).unwrap();
        })
    };

    machine.add_to_cache(numbered_table(0, 4), "", None).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    machine.add_to_cache(numbered_table(4, 4), "", None).unwrap();
    machine.finish();
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(8));
    consumer.join().unwrap();
}

// ============================================================================
// Counters
// ============================================================================

#[test]
fn test_counters_sum_reported_sizes() {
    let machine = CacheMachine::new(unbounded_tiers());
    let first = numbered_table(0, 100);
    let second = numbered_table(100, 50);
    let expected_bytes = first.size_in_bytes() + second.size_in_bytes();

    machine.add_to_cache(first, "", None).unwrap();
    machine.add_to_cache(second, "", None).unwrap();

    assert_eq!(machine.num_rows_added(), 150);
    assert_eq!(machine.num_bytes_added(), expected_bytes);

    // Pulling never decrements the counters.
    machine.finish();
    while machine.pull_from_cache(None).unwrap().is_some() {}
    assert_eq!(machine.num_rows_added(), 150);
}

// ============================================================================
// Finish and readiness
// ============================================================================

#[test]
fn test_finish_releases_blocked_consumer() {
    let machine = Arc::new(CacheMachine::new(unbounded_tiers()));
    let (tx, rx) = mpsc::channel();

    let consumer = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || {
            let pulled = machine.pull_from_cache(None).unwrap();
            tx.send(pulled.is_none()).unwrap();
        })
    };

    thread::sleep(Duration::from_millis(50));
    machine.finish();

    assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    consumer.join().unwrap();
}

#[test]
fn test_finish_releases_id_waiter() {
    let machine = Arc::new(CacheMachine::new(unbounded_tiers()));
    machine.put(1, numbered_table(0, 1)).unwrap();

    let waiter = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || machine.get_or_wait(99).unwrap().is_none())
    };

    thread::sleep(Duration::from_millis(50));
    machine.finish();
    assert!(waiter.join().unwrap());
    assert!(machine.has_next_now());
}

#[test]
fn test_ready_to_execute_tracks_liveness() {
    let machine = Arc::new(CacheMachine::new(unbounded_tiers()));
    let scheduler = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || machine.ready_to_execute())
    };

    thread::sleep(Duration::from_millis(20));
    machine.add_to_cache(numbered_table(0, 1), "", None).unwrap();
    assert!(scheduler.join().unwrap());

    machine.finish();
    assert!(!machine.ready_to_execute());
}

// ============================================================================
// Producer / consumer
// ============================================================================

#[test]
fn test_producer_consumer_preserves_order() {
    let machine = Arc::new(CacheMachine::new(unbounded_tiers()));
    let ctx = Context::new(7, 2, 0);

    let producer = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || {
            for batch in 0..50 {
                machine
                    .add_to_cache(numbered_table(batch * 4, 4), "", Some(&ctx))
                    .unwrap();
            }
            machine.finish();
        })
    };

    let mut received = Vec::new();
    while let Some(table) = machine.pull_from_cache(Some(&ctx)).unwrap() {
        received.extend(ids(&table));
    }
    producer.join().unwrap();

    assert_eq!(received, (0..200).collect::<Vec<i64>>());
}

#[test]
fn test_out_of_order_retrieval_by_index() {
    let machine = Arc::new(CacheMachine::new(unbounded_tiers()));

    let producer = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || {
            for index in (0..5).rev() {
                machine.put(index, numbered_table(index as i64 * 10, 1)).unwrap();
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    for index in 0..5 {
        let table = machine.get_or_wait(index).unwrap().unwrap();
        assert_eq!(ids(&table), vec![index as i64 * 10]);
    }
    producer.join().unwrap();
}

#[test]
fn test_edges_as_trait_objects() {
    let tiers = unbounded_tiers();
    let edges: Vec<Arc<dyn BatchCache>> = vec![
        Arc::new(CacheMachine::new(Arc::clone(&tiers))),
        Arc::new(NonWaitingCacheMachine::new(Arc::clone(&tiers))),
        Arc::new(ConcatenatingCacheMachine::new(tiers)),
    ];

    for edge in &edges {
        edge.add_to_cache(numbered_table(0, 3), "", None).unwrap();
        edge.add_to_cache(numbered_table(3, 3), "", None).unwrap();
        edge.finish();
    }

    let first_pulls: Vec<usize> = edges
        .iter()
        .map(|edge| edge.pull_from_cache(None).unwrap().unwrap().num_rows())
        .collect();
    assert_eq!(first_pulls, vec![3, 3, 6]);

    for edge in &edges {
        assert_eq!(edge.stats().placed_in(Tier::Device), 2);
    }
}

#[test]
fn test_non_waiting_pull_does_not_block_unfinished() {
    let machine = NonWaitingCacheMachine::new(unbounded_tiers());
    assert!(machine.pull_from_cache(None).unwrap().is_none());

    machine.add_to_cache(numbered_table(0, 2), "", None).unwrap();
    assert_eq!(machine.pull_from_cache(None).unwrap().unwrap().num_rows(), 2);
}
