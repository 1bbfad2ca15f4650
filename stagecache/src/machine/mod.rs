//! Cache machines: the per-edge buffers between execution stages.
//!
//! - [`CacheMachine`]: places each batch in a memory tier on insert and
//!   decaches on pull
//! - [`NonWaitingCacheMachine`]: pull never blocks
//! - [`ConcatenatingCacheMachine`]: pull returns the whole finished stream as
//!   one table
//! - [`HostCacheMachine`]: holds host-resident batches only and pulls them in
//!   host form
//!
//! The first three implement [`BatchCache`].

mod cache_machine;
mod concatenating;
mod host;
mod non_waiting;
mod stats;
mod traits;

pub use cache_machine::CacheMachine;
pub use concatenating::ConcatenatingCacheMachine;
pub use host::HostCacheMachine;
pub use non_waiting::NonWaitingCacheMachine;
pub use stats::CacheMachineStats;
pub use traits::BatchCache;
