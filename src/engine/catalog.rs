use serde::Serialize;

use crate::config::SessionConfig;
use crate::data::cache::DataCache;
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Sky position
// ---------------------------------------------------------------------------

/// Equatorial position of one object, numeric and formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkyPosition {
    /// Degrees.
    pub ra: f64,
    /// Degrees.
    pub dec: f64,
    /// Five-decimal degree strings.
    pub ra_display: String,
    pub dec_display: String,
    /// `HHhMMmSS.SSSs`
    pub ra_hms: String,
    /// `±DDdMMmSS.SSs`
    pub dec_dms: String,
}

impl SkyPosition {
    pub fn from_degrees(ra: f64, dec: f64) -> Result<Self> {
        if !ra.is_finite() || !dec.is_finite() || !(-90.0..=90.0).contains(&dec) {
            return Err(EngineError::InvalidParameter(format!(
                "no valid sky position for ra={ra}, dec={dec}"
            )));
        }
        Ok(Self {
            ra,
            dec,
            ra_display: format!("{ra:.5}"),
            dec_display: format!("{dec:.5}"),
            ra_hms: format_hms(ra),
            dec_dms: format_dms(dec),
        })
    }
}

/// Right ascension in degrees as sexagesimal hours, milliseconds of time.
pub fn format_hms(ra_deg: f64) -> String {
    let ms = (ra_deg.rem_euclid(360.0) / 15.0 * 3_600_000.0).round() as u64;
    let h = ms / 3_600_000 % 24;
    let m = ms / 60_000 % 60;
    let s = ms % 60_000;
    format!("{h:02}h{m:02}m{:02}.{:03}s", s / 1000, s % 1000)
}

/// Declination in degrees as signed sexagesimal degrees, centi-arcseconds.
pub fn format_dms(dec_deg: f64) -> String {
    let sign = if dec_deg < 0.0 { '-' } else { '+' };
    let cas = (dec_deg.abs() * 360_000.0).round() as u64;
    let d = cas / 360_000;
    let m = cas / 6_000 % 60;
    let s = cas % 6_000;
    format!("{sign}{d:02}d{m:02}m{:02}.{:02}s", s / 100, s % 100)
}

// ---------------------------------------------------------------------------
// Catalogue lookups
// ---------------------------------------------------------------------------

/// Per-object catalogue fields. Whole catalogue columns are read once and
/// served from the cache.
pub struct Catalog<'a> {
    cache: &'a DataCache,
    config: &'a SessionConfig,
}

impl<'a> Catalog<'a> {
    pub fn new(cache: &'a DataCache, config: &'a SessionConfig) -> Self {
        Self { cache, config }
    }

    pub fn object_name(&self, physical_row: usize) -> Result<String> {
        let column = self.cache.column(&self.config.object_id_column)?;
        let names = column.as_text()?;
        names
            .get(physical_row)
            .map(|name| name.trim().to_string())
            .ok_or_else(|| EngineError::out_of_range("row", physical_row, names.len()))
    }

    pub fn sky_position(&self, physical_row: usize) -> Result<SkyPosition> {
        let ra = self.scalar(&self.config.ra_column, physical_row)?;
        let dec = self.scalar(&self.config.dec_column, physical_row)?;
        SkyPosition::from_degrees(ra, dec)
    }

    fn scalar(&self, column: &str, physical_row: usize) -> Result<f64> {
        let data = self.cache.column(column)?;
        let values = data.as_values()?;
        values
            .get(physical_row)
            .copied()
            .ok_or_else(|| EngineError::out_of_range("row", physical_row, values.len()))
    }
}
