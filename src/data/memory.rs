use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde_json::Value as JsonValue;

use super::model::{ColumnData, Grid};
use super::store::{ChunkIter, ColumnStore};
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// MemoryStore – fully materialised columns
// ---------------------------------------------------------------------------

/// A column store held entirely in memory. Used for small files, synthetic
/// data and as the backing of test doubles.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    columns: BTreeMap<String, ColumnData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a column, enforcing that every 2-D column shares the
    /// same `(objects, samples)` shape.
    pub fn insert(&mut self, name: impl Into<String>, data: ColumnData) -> Result<()> {
        let name = name.into();
        if let ColumnData::Grid(grid) = &data {
            let clash = self.columns.iter().find_map(|(other, col)| match col {
                ColumnData::Grid(g) if *other != name && g.shape() != grid.shape() => {
                    Some((other.clone(), g.shape()))
                }
                _ => None,
            });
            if let Some((other, shape)) = clash {
                return Err(EngineError::Format(format!(
                    "column '{name}' has shape {:?} but '{other}' has {shape:?}",
                    grid.shape()
                )));
            }
        }
        self.columns.insert(name, data);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Result<Self> {
        self.insert(name, data)?;
        Ok(self)
    }

    fn column(&self, name: &str) -> Result<&ColumnData> {
        self.columns
            .get(name)
            .ok_or_else(|| EngineError::unknown_column(name))
    }

    // -----------------------------------------------------------------------
    // JSON loader
    // -----------------------------------------------------------------------

    /// Expected JSON schema (column-oriented):
    ///
    /// ```json
    /// {
    ///   "hjd":     [[0.0, 0.01, ...], [0.0, 0.01, ...]],
    ///   "tamflux": [[1021.3, 1019.8, ...], [88.1, 87.9, ...]],
    ///   "RA":      [10.684, 10.701],
    ///   "OBJ_ID":  ["NG0001", "NG0002"]
    /// }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context("reading JSON file")?;
        let root: JsonValue = serde_json::from_str(&text)
            .map_err(|e| EngineError::Format(format!("parsing JSON: {e}")))?;
        Self::from_json(&root)
    }

    pub fn from_json(root: &JsonValue) -> Result<Self> {
        let obj = root
            .as_object()
            .ok_or_else(|| EngineError::Format("expected top-level JSON object".into()))?;

        let mut store = MemoryStore::new();
        for (name, value) in obj {
            let data = json_to_column(name, value)
                .map_err(|e| EngineError::Format(format!("{e:#}")))?;
            store.insert(name.clone(), data)?;
        }
        Ok(store)
    }
}

fn json_to_column(name: &str, value: &JsonValue) -> anyhow::Result<ColumnData> {
    let items = value
        .as_array()
        .with_context(|| format!("column '{name}' is not an array"))?;

    match items.first() {
        None => Ok(ColumnData::Values(Vec::new())),
        Some(JsonValue::Array(_)) => {
            let rows = items
                .iter()
                .enumerate()
                .map(|(i, row)| json_array_to_f64(row, name, i))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let grid = Grid::from_rows(rows).with_context(|| format!("column '{name}'"))?;
            Ok(ColumnData::Grid(grid))
        }
        Some(JsonValue::String(_)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str()
                    .map(str::to_string)
                    .with_context(|| format!("column '{name}', row {i}: not a string"))
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .map(ColumnData::Text),
        Some(_) => Ok(ColumnData::Values(json_array_to_f64(value, name, 0)?)),
    }
}

/// `null` maps to NaN, mirroring null handling in the Parquet reader.
fn json_array_to_f64(val: &JsonValue, col: &str, row: usize) -> anyhow::Result<Vec<f64>> {
    let arr = val
        .as_array()
        .with_context(|| format!("column '{col}', row {row}: not an array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| match v {
            JsonValue::Null => Ok(f64::NAN),
            other => other
                .as_f64()
                .with_context(|| format!("column '{col}', row {row}, [{j}]: not a number")),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ColumnStore impl
// ---------------------------------------------------------------------------

impl ColumnStore for MemoryStore {
    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn row_count(&self, column: &str) -> Result<usize> {
        Ok(self.column(column)?.len())
    }

    fn read_row(&self, column: &str, row: usize) -> Result<Vec<f64>> {
        let data = self.column(column)?;
        if row >= data.len() {
            return Err(EngineError::out_of_range("row", row, data.len()));
        }
        match data {
            ColumnData::Grid(g) => Ok(g.row(row).to_vec()),
            ColumnData::Values(v) => Ok(vec![v[row]]),
            ColumnData::Text(_) => Err(EngineError::InvalidParameter(format!(
                "column '{column}' holds text, not numbers"
            ))),
        }
    }

    fn read_full(&self, column: &str) -> Result<ColumnData> {
        self.column(column).cloned()
    }

    fn read_chunks<'a>(&'a self, column: &str, chunk_size: usize) -> Result<ChunkIter<'a>> {
        if chunk_size == 0 {
            return Err(EngineError::InvalidParameter("chunk size must be positive".into()));
        }
        let grid = self.column(column)?.as_grid()?;
        let n_rows = grid.n_rows();
        let chunks = (0..n_rows)
            .step_by(chunk_size)
            .map(move |start| -> Result<Grid> { Ok(grid.slice_rows(start, start + chunk_size)) });
        Ok(Box::new(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_columns_are_typed_by_content() {
        let store = MemoryStore::from_json(&json!({
            "hjd": [[0.0, 1.0], [0.0, 1.0]],
            "flux": [[10.0, null], [20.0, 21.0]],
            "RA": [1.5, 2.5],
            "OBJ_ID": ["a", "b"],
        }))
        .unwrap();

        assert_eq!(store.row_count("hjd").unwrap(), 2);
        assert!(store.read_row("flux", 0).unwrap()[1].is_nan());
        assert_eq!(store.read_row("RA", 1).unwrap(), vec![2.5]);
        assert_eq!(
            store.read_full("OBJ_ID").unwrap(),
            ColumnData::Text(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn mismatched_2d_shapes_are_rejected() {
        let err = MemoryStore::from_json(&json!({
            "hjd": [[0.0, 1.0, 2.0]],
            "flux": [[1.0, 2.0]],
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::Format(_)));
    }

    #[test]
    fn chunks_cover_every_row_once() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64; 3]).collect();
        let store = MemoryStore::new()
            .with_column("flux", ColumnData::Grid(Grid::from_rows(rows).unwrap()))
            .unwrap();

        let sizes: Vec<usize> = store
            .read_chunks("flux", 2)
            .unwrap()
            .map(|chunk| chunk.unwrap().n_rows())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn unknown_column_and_row() {
        let store = MemoryStore::new()
            .with_column("RA", ColumnData::Values(vec![1.0]))
            .unwrap();
        assert!(matches!(
            store.read_row("nope", 0),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            store.read_row("RA", 1),
            Err(EngineError::OutOfRange { index: 1, len: 1, .. })
        ));
    }
}
