use std::path::Path;

use super::memory::MemoryStore;
use super::model::{ColumnData, Grid};
use super::parquet_store::ParquetStore;
use crate::error::{EngineError, Result};

/// Stream of consecutive row blocks of a 2-D column.
pub type ChunkIter<'a> = Box<dyn Iterator<Item = Result<Grid>> + Send + 'a>;

// ---------------------------------------------------------------------------
// ColumnStore – the narrow read contract the engine depends on
// ---------------------------------------------------------------------------

/// Read access to the named columns of one opened photometry file.
///
/// 2-D columns hold one time series per object; 1-D columns hold one value
/// (or string) per object. Stores are read-only, closing is dropping.
pub trait ColumnStore: Send + Sync {
    /// Names of every column the store exposes.
    fn column_names(&self) -> Vec<String>;

    /// Number of objects (rows) in `column`.
    fn row_count(&self, column: &str) -> Result<usize>;

    /// One object's samples. A 1-D numeric column yields a single value.
    fn read_row(&self, column: &str, row: usize) -> Result<Vec<f64>>;

    /// The whole column.
    fn read_full(&self, column: &str) -> Result<ColumnData>;

    /// Consecutive blocks of at most `chunk_size` rows of a 2-D column, in
    /// ascending row order. Only one block needs to be resident at a time.
    fn read_chunks<'a>(&'a self, column: &str, chunk_size: usize) -> Result<ChunkIter<'a>>;

    fn has_column(&self, column: &str) -> bool {
        self.column_names().iter().any(|c| c == column)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Open a photometry file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – one row per object, list columns for time series
/// * `.json`            – `{ "column": [[...], ...] | [...] }`, loaded in memory
pub fn open_store(path: &Path) -> Result<Box<dyn ColumnStore>> {
    if !path.exists() {
        return Err(EngineError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    log::info!("Opening {}", path.display());
    match ext.as_str() {
        "parquet" | "pq" => Ok(Box::new(ParquetStore::open(path)?)),
        "json" => Ok(Box::new(MemoryStore::from_json_file(path)?)),
        other => Err(EngineError::Format(format!(
            "unsupported file extension: .{other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = open_store(Path::new("/definitely/not/here.parquet")).err().unwrap();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_is_a_format_error() {
        let file = tempfile::Builder::new().suffix(".fits").tempfile().unwrap();
        let err = open_store(file.path()).err().unwrap();
        assert!(matches!(err, EngineError::Format(_)));
    }
}
