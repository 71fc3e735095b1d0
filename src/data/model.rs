use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Grid – a dense row-major (objects × samples) block
// ---------------------------------------------------------------------------

/// A 2-D numeric block, one row per object and one column per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl Grid {
    pub fn new(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(EngineError::InvalidParameter(format!(
                "grid of {n_rows}x{n_cols} needs {} values, got {}",
                n_rows * n_cols,
                data.len()
            )));
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
        })
    }

    /// Build a grid from equal-length rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(EngineError::InvalidParameter(format!(
                    "row {i} has {} samples, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Panics when `i` is out of bounds, like slice indexing.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact(0) would panic; a zero-width grid still has rows.
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Copy of rows `start..end` as a new grid.
    pub fn slice_rows(&self, start: usize, end: usize) -> Grid {
        let end = end.min(self.n_rows);
        let start = start.min(end);
        Grid {
            n_rows: end - start,
            n_cols: self.n_cols,
            data: self.data[start * self.n_cols..end * self.n_cols].to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnData – a materialised column (or one row of a column)
// ---------------------------------------------------------------------------

/// Whatever a column store hands back for a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// 1-D numeric array: a catalogue field, or one row of a 2-D column.
    Values(Vec<f64>),
    /// 2-D numeric array (objects × samples).
    Grid(Grid),
    /// 1-D text array, e.g. object identifiers.
    Text(Vec<String>),
}

impl ColumnData {
    /// Number of objects the column covers.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Values(v) => v.len(),
            ColumnData::Grid(g) => g.n_rows(),
            ColumnData::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ColumnData::Values(_) => "numeric 1-D",
            ColumnData::Grid(_) => "numeric 2-D",
            ColumnData::Text(_) => "text",
        }
    }

    pub fn as_values(&self) -> Result<&[f64]> {
        match self {
            ColumnData::Values(v) => Ok(v),
            other => Err(EngineError::InvalidParameter(format!(
                "expected a numeric 1-D array, got {}",
                other.kind()
            ))),
        }
    }

    pub fn as_grid(&self) -> Result<&Grid> {
        match self {
            ColumnData::Grid(g) => Ok(g),
            other => Err(EngineError::InvalidParameter(format!(
                "expected a numeric 2-D array, got {}",
                other.kind()
            ))),
        }
    }

    pub fn as_text(&self) -> Result<&[String]> {
        match self {
            ColumnData::Text(t) => Ok(t),
            other => Err(EngineError::InvalidParameter(format!(
                "expected a text array, got {}",
                other.kind()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// CleanedSeries – paired output of single-object extraction
// ---------------------------------------------------------------------------

/// Equal-length `(x, y)` sequences after outlier removal and optional binning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CleanedSeries {
    /// Keep only pairs where both coordinates are finite.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (x, y) = pairs
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .unzip();
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter(_)));
    }

    #[test]
    fn slice_rows_clamps() {
        let grid = Grid::from_rows(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let tail = grid.slice_rows(2, 10);
        assert_eq!(tail.shape(), (1, 1));
        assert_eq!(tail.row(0), &[3.0]);
    }

    #[test]
    fn pairs_drop_non_finite() {
        let series = CleanedSeries::from_pairs(vec![(0.0, 1.0), (1.0, f64::NAN), (f64::INFINITY, 2.0)]);
        assert_eq!(series.x, vec![0.0]);
        assert_eq!(series.y, vec![1.0]);
    }

    #[test]
    fn column_kind_mismatch() {
        let col = ColumnData::Text(vec!["a".into()]);
        assert!(col.as_values().is_err());
        assert_eq!(col.as_text().unwrap().len(), 1);
    }
}
