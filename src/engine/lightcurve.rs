use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::SessionConfig;
use crate::data::cache::DataCache;
use crate::data::model::CleanedSeries;
use crate::error::{EngineError, Result};
use crate::stats::robust::{
    median, peak_to_peak, percentile_spread, population_std, trend_extent,
};
use crate::stats::{bin_irregular, sigma_clip, BinStatistic};

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// Cleaned flux against time, time measured from the integer part of the
/// first epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightcurveSeries {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl From<CleanedSeries> for LightcurveSeries {
    fn from(series: CleanedSeries) -> Self {
        Self {
            times: series.x,
            values: series.y,
        }
    }
}

/// A lightcurve with the two scalars shown next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightcurveReport {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
    /// Peak-to-peak range of the cleaned flux.
    pub extent: Option<f64>,
    /// `1000 * std / median` of the cleaned flux.
    pub frms: Option<f64>,
}

/// Both extent metrics of a centroid series. They answer different
/// questions and are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateExtent {
    /// Mean of the last N samples minus mean of the first N: drift.
    pub trend: f64,
    /// High minus low percentile: scatter.
    pub spread: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateSeries {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
    pub extent: CoordinateExtent,
}

// ---------------------------------------------------------------------------
// CoordAxis
// ---------------------------------------------------------------------------

/// Detector axis of a centroid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordAxis {
    X,
    Y,
}

impl CoordAxis {
    /// Name of the centroid column for this axis.
    pub fn column<'a>(&self, config: &'a SessionConfig) -> &'a str {
        match self {
            CoordAxis::X => &config.x_column,
            CoordAxis::Y => &config.y_column,
        }
    }
}

impl FromStr for CoordAxis {
    type Err = EngineError;

    /// Accepts `x`/`y` and the plural `xs`/`ys`, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "x" | "xs" => Ok(CoordAxis::X),
            "y" | "ys" => Ok(CoordAxis::Y),
            other => Err(EngineError::InvalidParameter(format!(
                "invalid coordinate type '{other}', expected x or y"
            ))),
        }
    }
}

impl fmt::Display for CoordAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordAxis::X => write!(f, "x"),
            CoordAxis::Y => write!(f, "y"),
        }
    }
}

// ---------------------------------------------------------------------------
// LightcurveExtractor
// ---------------------------------------------------------------------------

/// Single-object reads through the session cache.
pub struct LightcurveExtractor<'a> {
    cache: &'a DataCache,
    config: &'a SessionConfig,
}

impl<'a> LightcurveExtractor<'a> {
    pub fn new(cache: &'a DataCache, config: &'a SessionConfig) -> Self {
        Self { cache, config }
    }

    /// One object's samples of `column`, minus the configured leading skip.
    fn read_row(&self, column: &str, row: usize) -> Result<Vec<f64>> {
        let data = self.cache.row(column, row)?;
        let values = data.as_values()?;
        let skip = self.config.skip_leading_samples.min(values.len());
        Ok(values[skip..].to_vec())
    }

    fn read_pair(&self, column: &str, row: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        let time = self.read_row(&self.config.time_column, row)?;
        let values = self.read_row(column, row)?;
        if time.len() != values.len() {
            return Err(EngineError::SourceRead(anyhow::anyhow!(
                "row {row}: '{}' has {} samples but '{column}' has {}",
                self.config.time_column,
                time.len(),
                values.len()
            )));
        }
        Ok((time, values))
    }

    /// Time-binned (optional), sigma-clipped flux of one object with time
    /// shifted to start near zero. Fails with `EmptyAfterClipping` when no
    /// finite sample survives, like every other single-object query.
    pub fn extract(
        &self,
        flux_column: &str,
        physical_row: usize,
        npts_per_bin: Option<usize>,
    ) -> Result<CleanedSeries> {
        let (mut time, mut flux) = self.read_pair(flux_column, physical_row)?;

        if let Some(npts) = npts_per_bin {
            let bins = bin_irregular(&time, &flux, npts, BinStatistic::Mean)?;
            flux = bins.values;
            time = bins.centers;
        }

        let t0 = time
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .reduce(f64::min)
            .ok_or(EngineError::EmptyAfterClipping)?
            .trunc();

        let clip = sigma_clip(&flux, &self.config.clip);
        let series = CleanedSeries::from_pairs(
            time.iter()
                .zip(&flux)
                .zip(&clip.mask)
                .filter(|(_, &masked)| !masked)
                .map(|((&t, &f), _)| (t - t0, f)),
        );
        log::debug!(
            "'{flux_column}' row {physical_row}: kept {} of {} samples",
            series.len(),
            flux.len()
        );
        if series.is_empty() {
            return Err(EngineError::EmptyAfterClipping);
        }
        Ok(series)
    }

    /// [`extract`](Self::extract) plus peak-to-peak extent and `frms` in
    /// parts per thousand.
    pub fn report(
        &self,
        flux_column: &str,
        physical_row: usize,
        npts_per_bin: Option<usize>,
    ) -> Result<LightcurveReport> {
        let series = self.extract(flux_column, physical_row, npts_per_bin)?;
        let extent = peak_to_peak(&series.y).filter(|v| v.is_finite());
        let frms = match (population_std(&series.y), median(&series.y)) {
            (Some(std), Some(med)) if med > 0.0 => Some(std / med * 1000.0),
            _ => None,
        }
        .filter(|v| v.is_finite());

        Ok(LightcurveReport {
            times: series.x,
            values: series.y,
            extent,
            frms,
        })
    }

    /// Sigma-clipped centroid series with both extent metrics. Times are
    /// reported as stored.
    pub fn coordinate_series(&self, axis: CoordAxis, physical_row: usize) -> Result<CoordinateSeries> {
        let column = axis.column(self.config);
        let (time, values) = self.read_pair(column, physical_row)?;

        let clip = sigma_clip(&values, &self.config.clip);
        let kept = clip.kept(&values);
        if kept.is_empty() {
            return Err(EngineError::EmptyAfterClipping);
        }

        let [lo, hi] = self.config.spread_percentiles;
        let extent = CoordinateExtent {
            trend: EngineError::check_finite(
                "trend extent",
                trend_extent(&kept, self.config.extent_points)?,
            )?,
            spread: EngineError::check_finite("spread extent", percentile_spread(&kept, lo, hi)?)?,
        };

        let series = CleanedSeries::from_pairs(
            time.iter()
                .zip(&values)
                .zip(&clip.mask)
                .filter(|(_, &masked)| !masked)
                .map(|((&t, &v), _)| (t, v)),
        );
        Ok(CoordinateSeries {
            times: series.x,
            values: series.y,
            extent,
        })
    }

    /// Median of one object's raw samples of `column`, e.g. its mean
    /// detector position.
    pub fn scalar_summary(&self, column: &str, physical_row: usize) -> Result<f64> {
        let values = self.read_row(column, physical_row)?;
        let value = median(&values).ok_or(EngineError::EmptyAfterClipping)?;
        EngineError::check_finite("median", value)
    }
}
