use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use arrow::array::{
    Array, ArrayRef, AsArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{
    ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder, RowSelection, RowSelector,
};
use parquet::arrow::ProjectionMask;

use super::model::{ColumnData, Grid};
use super::store::{ChunkIter, ColumnStore};
use crate::error::{EngineError, Result};

/// Batch size used when a whole column is materialised.
const FULL_READ_BATCH: usize = 8192;

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

/// How a Parquet leaf maps onto the engine's column model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    /// `List<Float64|Float32>` / `LargeList<..>`: one series per object.
    Series,
    /// Float64 / Float32 / Int32 / Int64: one value per object.
    Values,
    /// Utf8 / LargeUtf8: one string per object.
    Text,
}

fn classify(data_type: &DataType) -> Option<ColumnKind> {
    match data_type {
        DataType::List(_) | DataType::LargeList(_) => Some(ColumnKind::Series),
        DataType::Float64 | DataType::Float32 | DataType::Int32 | DataType::Int64 => {
            Some(ColumnKind::Values)
        }
        DataType::Utf8 | DataType::LargeUtf8 => Some(ColumnKind::Text),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ParquetStore
// ---------------------------------------------------------------------------

/// Column store over a Parquet file with one row per object.
///
/// Expected schema:
/// - time-series columns (`hjd`, `tamflux`, `skybkg`, `ccdx`, ...):
///   `List<Float64>` or `List<Float32>`, all with the same length per row
/// - catalogue columns (`RA`, `DEC`): Float64 / Float32 / Int32 / Int64
/// - identifier columns (`OBJ_ID`): Utf8
///
/// Every read re-opens the file and projects a single column, so nothing but
/// the schema is held between calls.
#[derive(Debug, Clone)]
pub struct ParquetStore {
    path: PathBuf,
    schema: SchemaRef,
    num_rows: usize,
}

impl ParquetStore {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EngineError::NotFound(path.to_path_buf()),
            _ => EngineError::SourceRead(anyhow::Error::new(e).context("opening parquet file")),
        })?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| EngineError::Format(format!("reading parquet metadata: {e}")))?;

        let num_rows = builder.metadata().file_metadata().num_rows().max(0) as usize;
        let schema = builder.schema().clone();
        log::debug!(
            "{}: {num_rows} rows, columns {:?}",
            path.display(),
            schema.fields().iter().map(|f| f.name()).collect::<Vec<_>>()
        );

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            num_rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn column_index(&self, column: &str) -> Result<(usize, ColumnKind)> {
        let idx = self
            .schema
            .index_of(column)
            .map_err(|_| EngineError::unknown_column(column))?;
        let data_type = self.schema.field(idx).data_type();
        let kind = classify(data_type).ok_or_else(|| {
            EngineError::Format(format!("column '{column}' has unsupported type {data_type:?}"))
        })?;
        Ok((idx, kind))
    }

    /// A reader projecting only the root column `idx`.
    fn reader(
        &self,
        idx: usize,
        batch_size: usize,
        selection: Option<RowSelection>,
    ) -> anyhow::Result<ParquetRecordBatchReader> {
        let file = File::open(&self.path).context("opening parquet file")?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .context("reading parquet metadata")?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), [idx]);
        let mut builder = builder.with_projection(mask).with_batch_size(batch_size);
        if let Some(selection) = selection {
            builder = builder.with_row_selection(selection);
        }
        builder.build().context("building parquet reader")
    }
}

impl ColumnStore for ParquetStore {
    fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .filter(|f| classify(f.data_type()).is_some())
            .map(|f| f.name().clone())
            .collect()
    }

    fn row_count(&self, column: &str) -> Result<usize> {
        self.column_index(column)?;
        Ok(self.num_rows)
    }

    fn read_row(&self, column: &str, row: usize) -> Result<Vec<f64>> {
        let (idx, kind) = self.column_index(column)?;
        if kind == ColumnKind::Text {
            return Err(EngineError::InvalidParameter(format!(
                "column '{column}' holds text, not numbers"
            )));
        }
        if row >= self.num_rows {
            return Err(EngineError::out_of_range("row", row, self.num_rows));
        }

        let selection = RowSelection::from(vec![RowSelector::skip(row), RowSelector::select(1)]);
        let mut reader = self.reader(idx, 1, Some(selection))?;
        let batch = reader
            .next()
            .with_context(|| format!("row {row} of '{column}' missing from file"))?
            .context("reading parquet record batch")?;

        let col = batch.column(0);
        let values = match kind {
            ColumnKind::Series => extract_f64_list(col, 0)
                .with_context(|| format!("Row {row}: failed to read '{column}'"))?,
            _ => numeric_values(col)?,
        };
        Ok(values)
    }

    fn read_full(&self, column: &str) -> Result<ColumnData> {
        let (idx, kind) = self.column_index(column)?;
        let reader = self.reader(idx, FULL_READ_BATCH, None)?;

        let data = match kind {
            ColumnKind::Series => {
                let mut rows = Vec::with_capacity(self.num_rows);
                for batch in reader {
                    let batch = batch.context("reading parquet record batch")?;
                    rows.extend(list_rows(&batch)?);
                }
                ColumnData::Grid(Grid::from_rows(rows)?)
            }
            ColumnKind::Values => {
                let mut values = Vec::with_capacity(self.num_rows);
                for batch in reader {
                    let batch = batch.context("reading parquet record batch")?;
                    values.extend(numeric_values(batch.column(0))?);
                }
                ColumnData::Values(values)
            }
            ColumnKind::Text => {
                let mut text = Vec::with_capacity(self.num_rows);
                for batch in reader {
                    let batch = batch.context("reading parquet record batch")?;
                    text.extend(text_values(batch.column(0))?);
                }
                ColumnData::Text(text)
            }
        };
        Ok(data)
    }

    fn read_chunks<'a>(&'a self, column: &str, chunk_size: usize) -> Result<ChunkIter<'a>> {
        if chunk_size == 0 {
            return Err(EngineError::InvalidParameter("chunk size must be positive".into()));
        }
        let (idx, kind) = self.column_index(column)?;
        if kind != ColumnKind::Series {
            return Err(EngineError::InvalidParameter(format!(
                "column '{column}' is not a time-series column"
            )));
        }

        let reader = self.reader(idx, chunk_size, None)?;
        let chunks = reader.map(|batch| -> Result<Grid> {
            let batch = batch.context("reading parquet record batch")?;
            Grid::from_rows(list_rows(&batch)?)
        });
        Ok(Box::new(chunks))
    }
}

// -- Parquet / Arrow helpers --

/// Every row of the single projected list column of `batch`.
fn list_rows(batch: &RecordBatch) -> anyhow::Result<Vec<Vec<f64>>> {
    let col = batch.column(0);
    (0..batch.num_rows())
        .map(|row| extract_f64_list(col, row).with_context(|| format!("batch row {row}")))
        .collect()
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &ArrayRef, row: usize) -> anyhow::Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // Null samples become NaN so they are masked like any non-finite value.
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Scalar numeric column as `f64`, nulls as NaN.
fn numeric_values(col: &ArrayRef) -> anyhow::Result<Vec<f64>> {
    let values = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, |i| i as f64))
            .collect(),
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(values)
}

/// Text column, nulls as empty strings.
fn text_values(col: &ArrayRef) -> anyhow::Result<Vec<String>> {
    let text = match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .context("expected StringArray")?
            .iter()
            .map(|s| s.unwrap_or_default().to_string())
            .collect(),
        DataType::LargeUtf8 => col
            .as_string::<i64>()
            .iter()
            .map(|s| s.unwrap_or_default().to_string())
            .collect(),
        other => bail!("Expected a Utf8 column, got {other:?}"),
    };
    Ok(text)
}
