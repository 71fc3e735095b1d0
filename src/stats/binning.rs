use serde::{Deserialize, Serialize};

use super::robust;
use crate::data::model::Grid;
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Bin statistic
// ---------------------------------------------------------------------------

/// Aggregate applied to the members of a bin. Non-finite members are
/// ignored; a bin without finite members aggregates to NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinStatistic {
    #[default]
    Mean,
    Median,
}

impl BinStatistic {
    pub fn apply(self, values: &[f64]) -> f64 {
        let value = match self {
            BinStatistic::Mean => robust::finite_mean(values),
            BinStatistic::Median => robust::median(values),
        };
        value.unwrap_or(f64::NAN)
    }
}

// ---------------------------------------------------------------------------
// Block averager: fixed sample-count bins
// ---------------------------------------------------------------------------

fn check_bin_size(bin_size: usize, n_samples: usize) -> Result<()> {
    if bin_size == 0 || bin_size > n_samples {
        return Err(EngineError::InvalidParameter(format!(
            "bin size {bin_size} must be within 1..={n_samples}"
        )));
    }
    Ok(())
}

/// Reduce one row in consecutive blocks of `bin_size` samples. Trailing
/// samples that do not fill a whole block are dropped.
pub fn block_reduce_row(row: &[f64], bin_size: usize, stat: BinStatistic) -> Result<Vec<f64>> {
    check_bin_size(bin_size, row.len())?;
    Ok(row
        .chunks_exact(bin_size)
        .map(|block| stat.apply(block))
        .collect())
}

/// Row-wise block reduction: `(rows, cols) -> (rows, cols / bin_size)`.
pub fn block_reduce(grid: &Grid, bin_size: usize, stat: BinStatistic) -> Result<Grid> {
    check_bin_size(bin_size, grid.n_cols())?;
    let n_bins = grid.n_cols() / bin_size;
    let mut data = Vec::with_capacity(grid.n_rows() * n_bins);
    for row in grid.rows() {
        data.extend(row.chunks_exact(bin_size).map(|block| stat.apply(block)));
    }
    Grid::new(grid.n_rows(), n_bins, data)
}

/// Mean block average of one row.
pub fn block_average_row(row: &[f64], bin_size: usize) -> Result<Vec<f64>> {
    block_reduce_row(row, bin_size, BinStatistic::Mean)
}

/// Mean block average of every row.
pub fn block_average(grid: &Grid, bin_size: usize) -> Result<Grid> {
    block_reduce(grid, bin_size, BinStatistic::Mean)
}

// ---------------------------------------------------------------------------
// Irregular binner: fixed coordinate-range bins
// ---------------------------------------------------------------------------

/// Result of binning `y` against `x` into equal-width ranges of `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct IrregularBins {
    /// Aggregate of the `y` members of each bin (NaN for an empty bin).
    pub values: Vec<f64>,
    /// Midpoint of each bin's edges.
    pub centers: Vec<f64>,
}

/// Bin `(x, y)` into `floor(len / npts_per_bin)` equal-width bins spanning
/// the range of finite `x`. The last bin is closed on the right so the
/// maximum lands in it.
pub fn bin_irregular(
    x: &[f64],
    y: &[f64],
    npts_per_bin: usize,
    stat: BinStatistic,
) -> Result<IrregularBins> {
    if x.len() != y.len() {
        return Err(EngineError::InvalidParameter(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    check_bin_size(npts_per_bin, y.len())?;
    let n_bins = y.len() / npts_per_bin;

    let (mut lo, mut hi) = x
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return Err(EngineError::EmptyAfterClipping);
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / n_bins as f64;

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); n_bins];
    for (&xi, &yi) in x.iter().zip(y) {
        if !xi.is_finite() {
            continue;
        }
        let idx = (((xi - lo) / width).floor() as usize).min(n_bins - 1);
        members[idx].push(yi);
    }

    let values = members.iter().map(|m| stat.apply(m)).collect();
    let centers = (0..n_bins)
        .map(|i| lo + width * (i as f64 + 0.5))
        .collect();
    Ok(IrregularBins { values, centers })
}
