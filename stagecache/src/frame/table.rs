//! Device-resident and host-resident table types.

use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;

use crate::error::CacheError;

/// A compute-ready batch of rows.
///
/// Tables are move-only: ownership passes from producer to cache to consumer
/// without copying column buffers.
#[derive(Debug)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Column names in schema order.
    pub fn names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    /// Column data types in schema order.
    pub fn schema(&self) -> Vec<DataType> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.data_type().clone())
            .collect()
    }

    pub fn arrow_schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Memory held by the table's column buffers.
    pub fn size_in_bytes(&self) -> u64 {
        self.batch.get_array_memory_size() as u64
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }
}

impl From<RecordBatch> for Table {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}

/// A table serialized into host memory as an Arrow IPC stream.
///
/// Names, schema, and row count are captured when the host table is built so
/// they can be reported without decoding the payload.
#[derive(Debug)]
pub struct HostTable {
    names: Vec<String>,
    schema: Vec<DataType>,
    num_rows: usize,
    payload: Bytes,
}

impl HostTable {
    pub(crate) fn from_parts(
        names: Vec<String>,
        schema: Vec<DataType>,
        num_rows: usize,
        payload: Bytes,
    ) -> Self {
        Self {
            names,
            schema,
            num_rows,
            payload,
        }
    }

    /// Take ownership of an IPC stream produced elsewhere, e.g. received from
    /// another node.
    ///
    /// The stream is decoded once to validate it and capture its metadata.
    pub fn from_ipc(payload: Bytes) -> Result<Self, CacheError> {
        let table = super::read_ipc_stream(payload.as_ref())?;
        Ok(Self::from_parts(
            table.names(),
            table.schema(),
            table.num_rows(),
            payload,
        ))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn schema(&self) -> &[DataType] {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Length of the serialized payload.
    pub fn size_in_bytes(&self) -> u64 {
        self.payload.len() as u64
    }

    /// The raw IPC stream.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}
