//! Tier-tagged handles to one batch of tabular data.
//!
//! A [`CacheData`] is one of three variants, each owning the batch in a
//! different tier:
//!
//! - [`DeviceCacheData`]: the compute-ready [`Table`] itself
//! - [`HostCacheData`]: an IPC-serialized [`HostTable`] in host memory
//! - [`LocalFileCacheData`]: a private spill file on local disk
//!
//! Every variant reports its schema, row count, and byte size without
//! materializing the batch. [`CacheData::decache`] consumes the handle, so a
//! batch can be materialized at most once:
//!
//! ```compile_fail
//! # use stagecache::cache_data::CacheData;
//! # fn twice(data: CacheData) {
//! let first = data.decache();
//! let second = data.decache(); // use of moved value
//! # }
//! ```

mod device;
mod host;
mod local_file;

use std::fmt;
use std::path::Path;

use arrow::datatypes::DataType;

pub use device::DeviceCacheData;
pub use host::HostCacheData;
pub use local_file::LocalFileCacheData;

use crate::error::CacheError;
use crate::frame::{HostTable, Table};
use crate::memory::Tier;

/// Which tier a [`CacheData`] currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheDataType {
    Device,
    Host,
    LocalFile,
}

impl CacheDataType {
    /// The memory tier accounting for this kind of data.
    pub fn tier(self) -> Tier {
        match self {
            Self::Device => Tier::Device,
            Self::Host => Tier::Host,
            Self::LocalFile => Tier::Disk,
        }
    }
}

impl fmt::Display for CacheDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Host => write!(f, "host"),
            Self::LocalFile => write!(f, "local_file"),
        }
    }
}

/// Names, schema, and row count captured when a batch is tiered.
///
/// Fixed at construction; never updated when the payload changes hands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BatchMeta {
    pub names: Vec<String>,
    pub schema: Vec<DataType>,
    pub num_rows: usize,
}

impl BatchMeta {
    pub(crate) fn of_table(table: &Table) -> Self {
        Self {
            names: table.names(),
            schema: table.schema(),
            num_rows: table.num_rows(),
        }
    }

    pub(crate) fn of_host_table(host_table: &HostTable) -> Self {
        Self {
            names: host_table.names().to_vec(),
            schema: host_table.schema().to_vec(),
            num_rows: host_table.num_rows(),
        }
    }
}

/// One batch, held in exactly one tier.
#[derive(Debug)]
pub enum CacheData {
    Device(DeviceCacheData),
    Host(HostCacheData),
    LocalFile(LocalFileCacheData),
}

impl CacheData {
    /// Keep a table in the fast tier.
    pub fn device(table: Table) -> Self {
        Self::Device(DeviceCacheData::new(table))
    }

    /// Move a table to host memory, serializing it.
    pub fn host_from_table(table: Table) -> Result<Self, CacheError> {
        Ok(Self::Host(HostCacheData::from_table(table)?))
    }

    /// Wrap an already serialized host table without copying it.
    pub fn host(host_table: HostTable) -> Self {
        Self::Host(HostCacheData::from_host_table(host_table))
    }

    /// Spill a table to a private file under `spill_dir`.
    pub fn local_file(table: Table, spill_dir: &Path) -> Result<Self, CacheError> {
        Ok(Self::LocalFile(LocalFileCacheData::from_table(
            table, spill_dir,
        )?))
    }

    pub fn data_type(&self) -> CacheDataType {
        match self {
            Self::Device(_) => CacheDataType::Device,
            Self::Host(_) => CacheDataType::Host,
            Self::LocalFile(_) => CacheDataType::LocalFile,
        }
    }

    pub fn tier(&self) -> Tier {
        self.data_type().tier()
    }

    fn meta(&self) -> &BatchMeta {
        match self {
            Self::Device(data) => data.meta(),
            Self::Host(data) => data.meta(),
            Self::LocalFile(data) => data.meta(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.meta().names
    }

    pub fn schema(&self) -> &[DataType] {
        &self.meta().schema
    }

    pub fn num_rows(&self) -> usize {
        self.meta().num_rows
    }

    /// Size of the batch in its current tier. Does not materialize it.
    pub fn size_in_bytes(&self) -> u64 {
        match self {
            Self::Device(data) => data.size_in_bytes(),
            Self::Host(data) => data.size_in_bytes(),
            Self::LocalFile(data) => data.size_in_bytes(),
        }
    }

    /// Materialize the batch as a compute-ready table, consuming the handle.
    pub fn decache(self) -> Result<Table, CacheError> {
        match self {
            Self::Device(data) => Ok(data.decache()),
            Self::Host(data) => data.decache(),
            Self::LocalFile(data) => data.decache(),
        }
    }

    /// Move the batch down to `tier` if that tier is slower than its current one.
    ///
    /// Batches are never promoted here; a faster target leaves the data as is.
    pub(crate) fn demote_to(self, tier: Tier, spill_dir: &Path) -> Result<Self, CacheError> {
        if tier <= self.tier() {
            return Ok(self);
        }

        match (self, tier) {
            (Self::Device(data), Tier::Host) => Self::host_from_table(data.decache()),
            (Self::Device(data), Tier::Disk) => Self::local_file(data.decache(), spill_dir),
            (Self::Host(data), Tier::Disk) => Ok(Self::LocalFile(
                LocalFileCacheData::from_host_table(data.release_host_table(), spill_dir)?,
            )),
            (data, _) => Ok(data),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::frame::Table;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    /// Table with `rows` rows of (`id`, `label`) starting at `start`.
    pub(crate) fn numbered_table(start: i64, rows: usize) -> Table {
        let ids: Vec<i64> = (start..start + rows as i64).collect();
        let labels: Vec<String> = ids.iter().map(|id| format!("label-{}", id)).collect();
        let batch = RecordBatch::try_from_iter(vec![
            ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
            ("label", Arc::new(StringArray::from(labels)) as ArrayRef),
        ])
        .unwrap();
        Table::new(batch)
    }
}
