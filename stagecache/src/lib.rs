//! stagecache - tiered batch buffering between query execution stages
//!
//! Each edge of a streaming query execution graph gets a cache machine that
//! decouples producer and consumer rates. Batches are placed in the fastest
//! memory tier with headroom (device, then host, then local disk) when they
//! are added, and materialized back into compute-ready tables when pulled.
//!
//! # Example
//!
//! ```
//! use stagecache::machine::CacheMachine;
//! use stagecache::memory::MemoryTiers;
//! use arrow::array::{ArrayRef, Int32Array};
//! use arrow::record_batch::RecordBatch;
//! use std::sync::Arc;
//!
//! let machine = CacheMachine::new(Arc::new(MemoryTiers::unbounded()));
//! let batch = RecordBatch::try_from_iter(vec![
//!     ("x", Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef),
//! ])?;
//!
//! machine.add_to_cache(batch.into(), "", None)?;
//! machine.finish();
//!
//! let table = machine.pull_from_cache(None)?.expect("one batch queued");
//! assert_eq!(table.num_rows(), 3);
//! assert!(machine.pull_from_cache(None)?.is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache_data;
pub mod config;
pub mod context;
pub mod debug;
pub mod error;
pub mod frame;
pub mod logging;
pub mod machine;
pub mod memory;
pub mod queue;

pub use error::CacheError;

/// Version of the stagecache library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
