use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Valid-row predicate
// ---------------------------------------------------------------------------

/// Return physical indices of rows whose statistics are usable.
///
/// A row passes when both its median flux and its fractional RMS are
/// strictly positive (NaN fails both comparisons). Order is ascending.
pub fn valid_indices(med_flux: &[f64], frms: &[f64]) -> Vec<usize> {
    med_flux
        .iter()
        .zip(frms)
        .enumerate()
        .filter(|(_, (m, f))| **m > 0.0 && **f > 0.0)
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// IndexRemapper: dense rank ↔ physical row
// ---------------------------------------------------------------------------

/// Maps the dense rank of a valid object (0..K) to its physical row and back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRemapper {
    /// Ascending physical rows.
    valid: Vec<usize>,
}

impl IndexRemapper {
    /// `valid` must be strictly ascending, as produced by [`valid_indices`].
    pub fn new(valid: Vec<usize>) -> Self {
        debug_assert!(valid.windows(2).all(|w| w[0] < w[1]));
        Self { valid }
    }

    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    pub fn valid_rows(&self) -> &[usize] {
        &self.valid
    }

    pub fn to_physical(&self, rank: usize) -> Result<usize> {
        self.valid
            .get(rank)
            .copied()
            .ok_or_else(|| EngineError::out_of_range("rank", rank, self.valid.len()))
    }

    /// Inverse of [`to_physical`](Self::to_physical). Rows that were filtered
    /// out have no rank.
    pub fn to_rank(&self, physical_row: usize) -> Result<usize> {
        self.valid.binary_search(&physical_row).map_err(|_| {
            EngineError::InvalidParameter(format!("row {physical_row} is not a valid object"))
        })
    }
}
