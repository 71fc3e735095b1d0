use std::path::Path;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::data::cache::{DataCache, Memo};
use crate::data::store::{open_store, ColumnStore};
use crate::engine::{
    extract_summary, Catalog, CoordAxis, CoordinateSeries, LightcurveExtractor,
    LightcurveReport, LightcurveSeries, SkyPosition, Summary, SummaryOptions,
};
use crate::error::{EngineError, Result};

type SummaryKey = (String, Option<usize>);

// ---------------------------------------------------------------------------
// Session – one opened file and everything derived from it
// ---------------------------------------------------------------------------

/// The query surface for one opened photometry file.
///
/// Owns the store, the read cache and the memoised summaries. Different
/// sessions share nothing; one session can be queried from several threads.
///
/// [`rank_to_physical`](Self::rank_to_physical) always resolves against the
/// summary of the configured flux column and bin size. Ranks of any other
/// summary resolve through its own handle, so computing one summary never
/// changes the ranks of another.
pub struct Session {
    config: SessionConfig,
    cache: DataCache,
    /// Summaries by `(flux column, bin size)`, each computed at most once.
    summaries: Memo<SummaryKey, Arc<Summary>>,
}

impl Session {
    /// Open `path` (see [`open_store`]) with a validated config.
    pub fn open(path: &Path, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let store = open_store(path)?;
        Self::from_store(Arc::from(store), config)
    }

    pub fn from_store(store: Arc<dyn ColumnStore>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: DataCache::new(store),
            summaries: Memo::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ColumnStore {
        self.cache.store()
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    // -----------------------------------------------------------------------
    // Summary and rank lookups
    // -----------------------------------------------------------------------

    /// Per-object statistics of `flux_column`. The scan runs once per
    /// `(column, bin_size)`; later calls return the same immutable summary.
    pub fn summarize(
        &self,
        flux_column: &str,
        bin_size: Option<usize>,
    ) -> Result<(usize, Arc<Summary>)> {
        let key = (flux_column.to_string(), bin_size);
        let summary = self.summaries.get_or_try_insert_with(&key, || {
            let options = SummaryOptions {
                bin_size,
                chunk_size: self.config.chunk_size,
                clip: self.config.clip,
            };
            extract_summary(self.store(), flux_column, &options).map(Arc::new)
        })?;
        Ok((summary.count_valid(), summary))
    }

    /// [`summarize`](Self::summarize) with the configured flux column and
    /// bin size.
    pub fn summarize_default(&self) -> Result<(usize, Arc<Summary>)> {
        self.summarize(&self.config.flux_column, self.config.bin_size)
    }

    fn default_key(&self) -> SummaryKey {
        (self.config.flux_column.clone(), self.config.bin_size)
    }

    /// The summary rank lookups use, if it was computed already.
    pub fn summary(&self) -> Option<Arc<Summary>> {
        self.summaries.get(&self.default_key())
    }

    /// Physical row of the `rank`-th valid object of the configured
    /// summary, computing that summary on first use.
    pub fn rank_to_physical(&self, rank: usize) -> Result<usize> {
        self.summarize_default()?.1.rank_to_physical(rank)
    }

    pub fn physical_to_rank(&self, physical_row: usize) -> Result<usize> {
        self.summarize_default()?.1.physical_to_rank(physical_row)
    }

    // -----------------------------------------------------------------------
    // Single-object queries
    // -----------------------------------------------------------------------

    fn check_row(&self, column: &str, physical_row: usize) -> Result<()> {
        let n_rows = self.store().row_count(column)?;
        if physical_row >= n_rows {
            return Err(EngineError::out_of_range("row", physical_row, n_rows));
        }
        Ok(())
    }

    fn extractor(&self) -> LightcurveExtractor<'_> {
        LightcurveExtractor::new(&self.cache, &self.config)
    }

    /// Cleaned flux series of one object.
    pub fn lightcurve(
        &self,
        flux_column: &str,
        physical_row: usize,
        bin_size: Option<usize>,
    ) -> Result<LightcurveSeries> {
        self.check_row(flux_column, physical_row)?;
        self.extractor()
            .extract(flux_column, physical_row, bin_size)
            .map(LightcurveSeries::from)
    }

    /// Cleaned flux series with its peak-to-peak extent and fractional rms.
    pub fn lightcurve_report(
        &self,
        flux_column: &str,
        physical_row: usize,
        bin_size: Option<usize>,
    ) -> Result<LightcurveReport> {
        self.check_row(flux_column, physical_row)?;
        self.extractor().report(flux_column, physical_row, bin_size)
    }

    /// Cleaned sky background series of one object.
    pub fn sky_background(
        &self,
        physical_row: usize,
        bin_size: Option<usize>,
    ) -> Result<LightcurveSeries> {
        self.lightcurve(&self.config.sky_column, physical_row, bin_size)
    }

    /// Clipped centroid series with trend and spread extents.
    pub fn coordinate_series(&self, axis: CoordAxis, physical_row: usize) -> Result<CoordinateSeries> {
        self.check_row(axis.column(&self.config), physical_row)?;
        self.extractor().coordinate_series(axis, physical_row)
    }

    /// Median of one object's raw samples of `column`.
    pub fn scalar_summary(&self, column: &str, physical_row: usize) -> Result<f64> {
        self.check_row(column, physical_row)?;
        self.extractor().scalar_summary(column, physical_row)
    }

    /// Median detector position along `axis`.
    pub fn mean_coordinate(&self, axis: CoordAxis, physical_row: usize) -> Result<f64> {
        self.scalar_summary(axis.column(&self.config), physical_row)
    }

    // -----------------------------------------------------------------------
    // Catalogue
    // -----------------------------------------------------------------------

    pub fn object_name(&self, physical_row: usize) -> Result<String> {
        Catalog::new(&self.cache, &self.config).object_name(physical_row)
    }

    pub fn sky_position(&self, physical_row: usize) -> Result<SkyPosition> {
        Catalog::new(&self.cache, &self.config).sky_position(physical_row)
    }
}
