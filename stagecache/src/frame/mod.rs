//! Tabular values moved between execution stages.
//!
//! [`Table`] is the compute-ready form a stage consumes. [`HostTable`] is the
//! serialized host form (an Arrow IPC stream) used when a batch leaves the
//! fast tier. Conversions between the two are the device/host transfers.

mod ipc;
mod table;

pub use ipc::{concat_tables, deserialize_from_host, serialize_to_host};
pub(crate) use ipc::{read_ipc_stream, write_ipc_stream};
pub use table::{HostTable, Table};
