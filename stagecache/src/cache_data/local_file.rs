use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::BatchMeta;
use crate::error::CacheError;
use crate::frame::{read_ipc_stream, write_ipc_stream, HostTable, Table};

const SPILL_FILE_PREFIX: &str = "batch-";
const SPILL_FILE_SUFFIX: &str = ".arrows";

/// A batch spilled to a private file on local disk.
///
/// The file is owned by this instance alone and is removed when the instance
/// is dropped, including after [`decache`](Self::decache).
#[derive(Debug)]
pub struct LocalFileCacheData {
    meta: BatchMeta,
    file: NamedTempFile,
    size_in_bytes: u64,
}

impl LocalFileCacheData {
    /// Serialize a table into a new spill file under `spill_dir`.
    pub fn from_table(table: Table, spill_dir: &Path) -> Result<Self, CacheError> {
        let meta = BatchMeta::of_table(&table);
        let mut file = create_spill_file(spill_dir)?;
        {
            let mut out = BufWriter::new(file.as_file_mut());
            write_ipc_stream(&table, &mut out)?;
            out.flush()?;
        }
        Self::finish(meta, file)
    }

    /// Write an already serialized host table straight to a spill file.
    pub fn from_host_table(host_table: HostTable, spill_dir: &Path) -> Result<Self, CacheError> {
        let meta = BatchMeta::of_host_table(&host_table);
        let mut file = create_spill_file(spill_dir)?;
        file.as_file_mut().write_all(host_table.payload())?;
        file.as_file_mut().flush()?;
        Self::finish(meta, file)
    }

    fn finish(meta: BatchMeta, file: NamedTempFile) -> Result<Self, CacheError> {
        let size_in_bytes = file.as_file().metadata()?.len();
        tracing::debug!(
            path = %file.path().display(),
            bytes = size_in_bytes,
            rows = meta.num_rows,
            "Spilled batch to local file"
        );
        Ok(Self {
            meta,
            file,
            size_in_bytes,
        })
    }

    pub(crate) fn meta(&self) -> &BatchMeta {
        &self.meta
    }

    /// Size of the spill file on disk.
    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    /// Location of the spill file, for diagnostics only.
    pub fn file_path(&self) -> &Path {
        self.file.path()
    }

    /// Read the spill file back into a compute-ready table.
    ///
    /// The file is deleted once the table has been read.
    pub fn decache(self) -> Result<Table, CacheError> {
        let reader = BufReader::new(self.file.reopen()?);
        let table = read_ipc_stream(reader)?;
        self.file.close()?;
        Ok(table)
    }
}

fn create_spill_file(spill_dir: &Path) -> Result<NamedTempFile, CacheError> {
    fs::create_dir_all(spill_dir)?;
    let file = tempfile::Builder::new()
        .prefix(SPILL_FILE_PREFIX)
        .suffix(SPILL_FILE_SUFFIX)
        .tempfile_in(spill_dir)?;
    Ok(file)
}
