//! Arrow IPC conversions between the table forms.

use std::io::{Read, Write};

use arrow::compute::concat_batches;
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;

use super::{HostTable, Table};
use crate::error::CacheError;

/// Serialize a table into host memory (device-to-host transfer).
pub fn serialize_to_host(table: &Table) -> Result<HostTable, CacheError> {
    let mut buffer = Vec::with_capacity(table.size_in_bytes() as usize);
    write_ipc_stream(table, &mut buffer)?;

    Ok(HostTable::from_parts(
        table.names(),
        table.schema(),
        table.num_rows(),
        Bytes::from(buffer),
    ))
}

/// Rebuild a compute-ready table from its host form (host-to-device transfer).
pub fn deserialize_from_host(host_table: &HostTable) -> Result<Table, CacheError> {
    read_ipc_stream(host_table.payload().as_ref())
}

/// Concatenate tables in order into a single table.
///
/// Returns `None` for an empty input. All tables must share the same fields.
pub fn concat_tables(tables: Vec<Table>) -> Result<Option<Table>, CacheError> {
    let Some(first) = tables.first() else {
        return Ok(None);
    };

    let schema = first.arrow_schema();
    if let Some(position) = tables
        .iter()
        .position(|table| table.arrow_schema().fields() != schema.fields())
    {
        return Err(CacheError::Internal(format!(
            "cannot concatenate batch {} with a different schema",
            position
        )));
    }

    let batches: Vec<RecordBatch> = tables.into_iter().map(Table::into_batch).collect();
    let batch = concat_batches(&schema, &batches)?;
    Ok(Some(Table::new(batch)))
}

pub(crate) fn write_ipc_stream<W: Write>(table: &Table, out: W) -> Result<(), CacheError> {
    let mut writer = StreamWriter::try_new(out, table.arrow_schema().as_ref())?;
    writer.write(table.batch())?;
    writer.finish()?;
    Ok(())
}

/// Decode an IPC stream into one table.
///
/// A stream without batches yields an empty table carrying the stream schema;
/// multiple batches are concatenated.
pub(crate) fn read_ipc_stream<R: Read>(input: R) -> Result<Table, CacheError> {
    let reader = StreamReader::try_new(input, None)?;
    let schema = reader.schema();
    let mut batches = reader.collect::<Result<Vec<_>, _>>()?;

    let batch = match batches.len() {
        0 => RecordBatch::new_empty(schema),
        1 => batches.remove(0),
        _ => concat_batches(&schema, &batches)?,
    };
    Ok(Table::new(batch))
}
