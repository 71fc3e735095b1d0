use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::stats::ClipConfig;

// ---------------------------------------------------------------------------
// Session configuration
// ---------------------------------------------------------------------------

/// Column names and processing parameters for one opened file.
///
/// Every field has a default, so a JSON config only needs the keys it
/// overrides:
///
/// ```json
/// { "flux_column": "flux", "bin_size": 5, "clip": { "sigma": 4.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub time_column: String,
    /// Flux column used when a query does not name one.
    pub flux_column: String,
    pub sky_column: String,
    pub x_column: String,
    pub y_column: String,
    pub object_id_column: String,
    pub ra_column: String,
    pub dec_column: String,

    /// Rows per block during the summary scan.
    pub chunk_size: usize,
    /// Samples per bin; `None` disables binning.
    pub bin_size: Option<usize>,
    /// Samples dropped from the start of every per-object read.
    pub skip_leading_samples: usize,
    pub clip: ClipConfig,

    /// Points averaged at each end for the trend extent.
    pub extent_points: usize,
    /// `[low, high]` percentiles for the spread extent.
    pub spread_percentiles: [f64; 2],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_column: "hjd".into(),
            flux_column: "tamflux".into(),
            sky_column: "skybkg".into(),
            x_column: "ccdx".into(),
            y_column: "ccdy".into(),
            object_id_column: "OBJ_ID".into(),
            ra_column: "RA".into(),
            dec_column: "DEC".into(),
            chunk_size: 1024,
            bin_size: None,
            skip_leading_samples: 0,
            clip: ClipConfig::default(),
            extent_points: 10,
            spread_percentiles: [5.0, 95.0],
        }
    }
}

impl SessionConfig {
    /// Load a (partial) config from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SessionConfig = serde_json::from_str(&text)
            .map_err(|e| EngineError::InvalidParameter(format!("config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EngineError::InvalidParameter(msg));

        if self.chunk_size == 0 {
            return invalid("chunk_size must be positive".into());
        }
        if self.bin_size == Some(0) {
            return invalid("bin_size must be positive".into());
        }
        if !(self.clip.sigma.is_finite() && self.clip.sigma > 0.0) {
            return invalid(format!("clip.sigma must be positive, got {}", self.clip.sigma));
        }
        if self.extent_points == 0 {
            return invalid("extent_points must be positive".into());
        }
        let [lo, hi] = self.spread_percentiles;
        if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
            return invalid(format!(
                "spread_percentiles [{lo}, {hi}] must be ordered within 0..=100"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CenterFn;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "flux_column": "flux", "bin_size": 5, "clip": {{ "center": "median" }} }}"#
        )
        .unwrap();

        let config = SessionConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.flux_column, "flux");
        assert_eq!(config.bin_size, Some(5));
        assert_eq!(config.clip.center, CenterFn::Median);
        assert_eq!(config.clip.sigma, 3.0);
        assert_eq!(config.time_column, "hjd");
        assert_eq!(config.chunk_size, 1024);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = SessionConfig::default();
        assert!(config.validate().is_ok());

        config.chunk_size = 0;
        assert!(config.validate().is_err());

        config = SessionConfig {
            spread_percentiles: [95.0, 5.0],
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidParameter(_))
        ));
    }
}
