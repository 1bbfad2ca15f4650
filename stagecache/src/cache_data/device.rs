use super::BatchMeta;
use crate::frame::Table;

/// A batch kept in the fast tier as a compute-ready table.
#[derive(Debug)]
pub struct DeviceCacheData {
    meta: BatchMeta,
    table: Table,
}

impl DeviceCacheData {
    pub fn new(table: Table) -> Self {
        Self {
            meta: BatchMeta::of_table(&table),
            table,
        }
    }

    pub(crate) fn meta(&self) -> &BatchMeta {
        &self.meta
    }

    /// Size of the live table.
    pub fn size_in_bytes(&self) -> u64 {
        self.table.size_in_bytes()
    }

    /// Hand the table out. No conversion takes place.
    pub fn decache(self) -> Table {
        self.table
    }
}
