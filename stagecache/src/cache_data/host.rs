use super::BatchMeta;
use crate::error::CacheError;
use crate::frame::{deserialize_from_host, serialize_to_host, HostTable, Table};

/// A batch held in host memory in serialized form.
#[derive(Debug)]
pub struct HostCacheData {
    meta: BatchMeta,
    host_table: HostTable,
}

impl HostCacheData {
    /// Serialize a compute-ready table into host memory.
    pub fn from_table(table: Table) -> Result<Self, CacheError> {
        let host_table = serialize_to_host(&table)?;
        Ok(Self::from_host_table(host_table))
    }

    /// Take ownership of an already serialized table.
    pub fn from_host_table(host_table: HostTable) -> Self {
        Self {
            meta: BatchMeta::of_host_table(&host_table),
            host_table,
        }
    }

    pub(crate) fn meta(&self) -> &BatchMeta {
        &self.meta
    }

    pub fn num_rows(&self) -> usize {
        self.meta.num_rows
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.host_table.size_in_bytes()
    }

    /// Deserialize back into a compute-ready table.
    pub fn decache(self) -> Result<Table, CacheError> {
        deserialize_from_host(&self.host_table)
    }

    /// Give up the host form directly, skipping deserialization.
    pub fn release_host_table(self) -> HostTable {
        self.host_table
    }
}
