use serde::Serialize;

use super::remap::{valid_indices, IndexRemapper};
use crate::data::store::ColumnStore;
use crate::error::{EngineError, Result};
use crate::stats::{block_average_row, robust_dispersion, sigma_clip, ClipConfig};

// ---------------------------------------------------------------------------
// Summary – per-object noise vs brightness over a whole file
// ---------------------------------------------------------------------------

/// Median flux and fractional RMS for every physical row of one flux column,
/// plus the set of rows for which both are usable.
///
/// Immutable once built; shared by reference between queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    column: String,
    bin_size: Option<usize>,
    med_flux: Vec<f64>,
    frms: Vec<f64>,
    remapper: IndexRemapper,
}

/// Serializable headline numbers of a [`Summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryOverview {
    pub column: String,
    pub bin_size: Option<usize>,
    pub n_objects: usize,
    pub n_valid: usize,
}

impl Summary {
    /// Build from per-row statistics. Rows are valid when both values are
    /// strictly positive.
    pub fn from_statistics(
        column: impl Into<String>,
        bin_size: Option<usize>,
        med_flux: Vec<f64>,
        frms: Vec<f64>,
    ) -> Result<Self> {
        if med_flux.len() != frms.len() {
            return Err(EngineError::InvalidParameter(format!(
                "{} median values but {} rms values",
                med_flux.len(),
                frms.len()
            )));
        }
        let remapper = IndexRemapper::new(valid_indices(&med_flux, &frms));
        Ok(Self {
            column: column.into(),
            bin_size,
            med_flux,
            frms,
            remapper,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn bin_size(&self) -> Option<usize> {
        self.bin_size
    }

    /// Indexed by physical row.
    pub fn med_flux(&self) -> &[f64] {
        &self.med_flux
    }

    /// Indexed by physical row.
    pub fn frms(&self) -> &[f64] {
        &self.frms
    }

    pub fn n_objects(&self) -> usize {
        self.med_flux.len()
    }

    pub fn count_valid(&self) -> usize {
        self.remapper.len()
    }

    pub fn valid_rows(&self) -> &[usize] {
        self.remapper.valid_rows()
    }

    pub fn remapper(&self) -> &IndexRemapper {
        &self.remapper
    }

    pub fn rank_to_physical(&self, rank: usize) -> Result<usize> {
        self.remapper.to_physical(rank)
    }

    pub fn physical_to_rank(&self, physical_row: usize) -> Result<usize> {
        self.remapper.to_rank(physical_row)
    }

    /// `(log10 median flux, log10 fractional rms)` of every valid row, in
    /// rank order.
    pub fn frms_scatter(&self) -> Vec<[f64; 2]> {
        self.valid_rows()
            .iter()
            .map(|&i| [self.med_flux[i].log10(), self.frms[i].log10()])
            .filter(|[m, f]| m.is_finite() && f.is_finite())
            .collect()
    }

    pub fn overview(&self) -> SummaryOverview {
        SummaryOverview {
            column: self.column.clone(),
            bin_size: self.bin_size,
            n_objects: self.n_objects(),
            n_valid: self.count_valid(),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary extraction
// ---------------------------------------------------------------------------

/// Parameters of a summary scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryOptions {
    /// Block-average the clipped series with this many samples per bin.
    pub bin_size: Option<usize>,
    /// Rows per block read from the store.
    pub chunk_size: usize,
    pub clip: ClipConfig,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            bin_size: None,
            chunk_size: 1024,
            clip: ClipConfig::default(),
        }
    }
}

/// `(median, fractional rms)` of one row. Rows without usable statistics
/// come back with a non-positive value instead of an error.
fn row_statistics(row: &[f64], options: &SummaryOptions) -> Result<(f64, f64)> {
    let clip = sigma_clip(row, &options.clip);
    let mut clipped = clip.masked_as_nan(row);
    if let Some(bin_size) = options.bin_size {
        clipped = block_average_row(&clipped, bin_size)?;
    }

    match robust_dispersion(&clipped) {
        Ok(d) if d.fractional_rms.is_finite() => Ok((d.median, d.fractional_rms)),
        Ok(d) => Ok((d.median, 0.0)),
        Err(EngineError::EmptyAfterClipping) => Ok((0.0, 0.0)),
        Err(EngineError::DegenerateStatistics { median }) => Ok((median, 0.0)),
        Err(e) => Err(e),
    }
}

/// Scan `column` in blocks of `options.chunk_size` rows and compute the
/// median flux and fractional RMS of every row.
///
/// Rows that clip to nothing get a zero median, rows with a non-positive
/// median keep it with a zero RMS; both end up outside the valid set.
pub fn extract_summary(
    store: &dyn ColumnStore,
    column: &str,
    options: &SummaryOptions,
) -> Result<Summary> {
    if options.chunk_size == 0 {
        return Err(EngineError::InvalidParameter("chunk size must be positive".into()));
    }
    if options.bin_size == Some(0) {
        return Err(EngineError::InvalidParameter("bin size must be positive".into()));
    }

    let n_objects = store.row_count(column)?;
    log::info!(
        "Summarising '{column}': {n_objects} objects in chunks of {}",
        options.chunk_size
    );

    let mut med_flux = vec![0.0; n_objects];
    let mut frms = vec![0.0; n_objects];
    let mut start = 0;
    let mut substituted = 0;

    for chunk in store.read_chunks(column, options.chunk_size)? {
        let chunk = chunk?;
        let end = start + chunk.n_rows();
        if end > n_objects {
            return Err(EngineError::SourceRead(anyhow::anyhow!(
                "'{column}' yielded more than its {n_objects} rows"
            )));
        }
        log::debug!("Reading apertures {start} to {end}");

        for (offset, row) in chunk.rows().enumerate() {
            let (m, f) = row_statistics(row, options)?;
            if m <= 0.0 || f <= 0.0 {
                substituted += 1;
            }
            med_flux[start + offset] = m;
            frms[start + offset] = f;
        }
        start = end;
    }

    if start != n_objects {
        return Err(EngineError::SourceRead(anyhow::anyhow!(
            "'{column}' yielded {start} of {n_objects} rows"
        )));
    }

    let summary = Summary::from_statistics(column, options.bin_size, med_flux, frms)?;
    if substituted > 0 {
        log::warn!("{substituted} of {n_objects} rows in '{column}' have unusable statistics");
    }
    log::info!(
        "'{column}': {} of {n_objects} objects are valid",
        summary.count_valid()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::data::model::{ColumnData, Grid};
    use approx::assert_relative_eq;

    fn store_with(rows: Vec<Vec<f64>>) -> MemoryStore {
        MemoryStore::new()
            .with_column("flux", ColumnData::Grid(Grid::from_rows(rows).unwrap()))
            .unwrap()
    }

    #[test]
    fn summary_matches_row_statistics() {
        let store = store_with(vec![
            vec![8.0, 9.0, 10.0, 11.0, 12.0],
            vec![-3.0, -2.0, -1.0, -2.0, -3.0],
            vec![4.0; 5],
        ]);
        let summary = extract_summary(&store, "flux", &SummaryOptions::default()).unwrap();

        assert_eq!(summary.n_objects(), 3);
        assert_relative_eq!(summary.med_flux()[0], 10.0);
        assert_relative_eq!(summary.frms()[0], 1.4826 / 10.0, epsilon = 1e-12);
        // negative median stays visible, but is invalid
        assert_relative_eq!(summary.med_flux()[1], -2.0);
        // zero scatter means zero rms, so also invalid
        assert_eq!(summary.frms()[2], 0.0);
        assert_eq!(summary.valid_rows(), &[0]);
    }

    #[test]
    fn chunk_boundaries_do_not_change_the_result() {
        let rows: Vec<Vec<f64>> = (1..=7)
            .map(|i| (0..6).map(|j| (i * 10 + j % 3) as f64).collect())
            .collect();
        let store = store_with(rows);

        let whole = extract_summary(&store, "flux", &SummaryOptions::default()).unwrap();
        for chunk_size in [1, 2, 3, 7, 100] {
            let options = SummaryOptions {
                chunk_size,
                ..SummaryOptions::default()
            };
            let chunked = extract_summary(&store, "flux", &options).unwrap();
            assert_eq!(chunked, whole);
        }
    }

    #[test]
    fn fully_masked_row_gets_a_sentinel() {
        let store = store_with(vec![vec![f64::NAN; 4], vec![1.0, 2.0, 3.0, 4.0]]);
        let summary = extract_summary(&store, "flux", &SummaryOptions::default()).unwrap();
        assert_eq!(summary.med_flux()[0], 0.0);
        assert_eq!(summary.valid_rows(), &[1]);
    }

    #[test]
    fn binning_happens_after_clipping() {
        // Bins alternate 100.5 / 102.5; the clipped outlier leaves its bin
        // at 102, a surviving one would push it far above 102.5.
        let mut row: Vec<f64> = (0..24).map(|j| 100.0 + (j % 4) as f64).collect();
        row[3] = 10_000.0;
        let store = store_with(vec![row]);
        let options = SummaryOptions {
            bin_size: Some(2),
            ..SummaryOptions::default()
        };
        let summary = extract_summary(&store, "flux", &options).unwrap();
        assert_relative_eq!(summary.med_flux()[0], 101.25);
    }

    #[test]
    fn oversized_bin_is_rejected() {
        let store = store_with(vec![vec![1.0, 2.0]]);
        let options = SummaryOptions {
            bin_size: Some(3),
            ..SummaryOptions::default()
        };
        assert!(matches!(
            extract_summary(&store, "flux", &options),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn scatter_is_log_scaled() {
        let summary =
            Summary::from_statistics("flux", None, vec![100.0, -1.0, 1000.0], vec![0.01, 0.1, 0.1])
                .unwrap();
        assert_eq!(summary.count_valid(), 2);
        let scatter = summary.frms_scatter();
        assert_relative_eq!(scatter[0][0], 2.0);
        assert_relative_eq!(scatter[0][1], -2.0);
        assert_relative_eq!(scatter[1][0], 3.0);
        assert_eq!(summary.rank_to_physical(1).unwrap(), 2);
    }
}
