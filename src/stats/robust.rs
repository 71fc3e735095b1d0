use crate::error::{EngineError, Result};

/// Scale factor that turns a MAD into a consistent estimator of the standard
/// deviation for normally distributed data.
pub const MAD_TO_SIGMA: f64 = 1.4826;

// ---------------------------------------------------------------------------
// Order statistics (NaN-aware: non-finite samples are ignored)
// ---------------------------------------------------------------------------

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Median of the finite samples; `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some(midpoint(sorted[mid - 1], sorted[mid]))
    }
}

/// `(a + b) / 2` without overflowing for operands near `f64::MAX`.
fn midpoint(a: f64, b: f64) -> f64 {
    if (a < 0.0) != (b < 0.0) {
        (a + b) / 2.0
    } else {
        a + (b - a) / 2.0
    }
}

/// Median absolute deviation about `center`.
pub fn mad(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - center).abs())
        .collect();
    median(&deviations)
}

/// Percentile `q` in `[0, 100]`, linearly interpolated between closest ranks.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=100.0).contains(&q) {
        return None;
    }
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return None;
    }
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    if sorted[lo] == sorted[hi] {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}

/// Arithmetic mean of the finite samples. Falls back to summing `v / n`
/// when the plain sum overflows.
pub fn finite_mean(values: &[f64]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return None;
    }
    let n = n as f64;
    if sum.is_finite() {
        return Some(sum / n);
    }
    Some(values.iter().filter(|v| v.is_finite()).map(|v| v / n).sum())
}

// ---------------------------------------------------------------------------
// Dispersion estimator
// ---------------------------------------------------------------------------

/// Robust location/scale summary of one (clipped) series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    pub median: f64,
    pub mad: f64,
    /// `MAD_TO_SIGMA * mad`
    pub robust_std: f64,
    /// `robust_std / median`
    pub fractional_rms: f64,
}

/// Median, MAD and fractional RMS of the finite samples of `values`.
///
/// Fails with `EmptyAfterClipping` when no finite sample is left and with
/// `DegenerateStatistics` when the median is not strictly positive.
pub fn robust_dispersion(values: &[f64]) -> Result<Dispersion> {
    let median = median(values).ok_or(EngineError::EmptyAfterClipping)?;
    if median <= 0.0 {
        return Err(EngineError::DegenerateStatistics { median });
    }
    let mad = mad(values, median).ok_or(EngineError::EmptyAfterClipping)?;
    let robust_std = MAD_TO_SIGMA * mad;
    Ok(Dispersion {
        median,
        mad,
        robust_std,
        fractional_rms: robust_std / median,
    })
}

// ---------------------------------------------------------------------------
// Extent metrics
// ---------------------------------------------------------------------------

/// Trend magnitude: mean of the last `npoints` samples minus mean of the
/// first `npoints`. Shorter series use every sample for both ends.
pub fn trend_extent(values: &[f64], npoints: usize) -> Result<f64> {
    if npoints == 0 {
        return Err(EngineError::InvalidParameter(
            "extent needs at least one point per end".into(),
        ));
    }
    let n = npoints.min(values.len());
    let start = finite_mean(&values[..n]).ok_or(EngineError::EmptyAfterClipping)?;
    let end = finite_mean(&values[values.len() - n..]).ok_or(EngineError::EmptyAfterClipping)?;
    Ok(end - start)
}

/// Distribution spread: `percentile(hi) - percentile(lo)`.
pub fn percentile_spread(values: &[f64], lo: f64, hi: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
        return Err(EngineError::InvalidParameter(format!(
            "percentiles ({lo}, {hi}) must be ordered within 0..=100"
        )));
    }
    let p_lo = percentile(values, lo).ok_or(EngineError::EmptyAfterClipping)?;
    let p_hi = percentile(values, hi).ok_or(EngineError::EmptyAfterClipping)?;
    Ok(p_hi - p_lo)
}

/// Peak-to-peak range of the finite samples.
pub fn peak_to_peak(values: &[f64]) -> Option<f64> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite()).peekable();
    finite.peek()?;
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    Some(max - min)
}

/// Population standard deviation of the finite samples.
///
/// Deviations are scaled by the largest one before squaring, so the result
/// is only infinite when a single deviation already is.
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mean = finite_mean(values)?;
    let deviations: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - mean).abs())
        .collect();
    let scale = deviations.iter().copied().fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return Some(scale);
    }
    let mean_sq =
        deviations.iter().map(|d| (d / scale).powi(2)).sum::<f64>() / deviations.len() as f64;
    Some(scale * mean_sq.sqrt())
}
