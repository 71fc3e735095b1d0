use serde::{Deserialize, Serialize};

use super::robust;
use crate::data::model::Grid;

// ---------------------------------------------------------------------------
// Sigma clipping configuration
// ---------------------------------------------------------------------------

/// Which location estimate the clipping distance is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterFn {
    #[default]
    Mean,
    Median,
}

/// Parameters of the iterative outlier rejection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    /// Rejection threshold in standard deviations.
    pub sigma: f64,
    /// Iteration bound; `None` iterates until nothing new is masked.
    pub max_iters: Option<usize>,
    pub center: CenterFn,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            max_iters: Some(5),
            center: CenterFn::Mean,
        }
    }
}

// ---------------------------------------------------------------------------
// Clip result
// ---------------------------------------------------------------------------

/// Outcome of clipping one series. `mask[i] == true` means sample `i` was
/// rejected (outlier or non-finite).
#[derive(Debug, Clone, PartialEq)]
pub struct ClipResult {
    pub mask: Vec<bool>,
    /// Centre of the surviving samples (NaN when everything was rejected).
    pub center: f64,
    /// Population standard deviation of the surviving samples.
    pub std: f64,
    pub iterations: usize,
}

impl ClipResult {
    pub fn n_kept(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    pub fn is_empty(&self) -> bool {
        self.n_kept() == 0
    }

    /// Copy of `values` with every rejected sample replaced by NaN, so
    /// downstream NaN-aware reductions skip it.
    pub fn masked_as_nan(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(&self.mask)
            .map(|(&v, &m)| if m { f64::NAN } else { v })
            .collect()
    }

    /// Surviving samples, in order.
    pub fn kept(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(&self.mask)
            .filter(|(_, &m)| !m)
            .map(|(&v, _)| v)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Clipping
// ---------------------------------------------------------------------------

/// Iteratively reject samples further than `sigma` standard deviations from
/// the centre of the remaining samples.
///
/// Non-finite samples are rejected up front. A series that ends up fully
/// rejected is returned as such; the caller decides how to treat it.
pub fn sigma_clip(values: &[f64], config: &ClipConfig) -> ClipResult {
    let mut mask: Vec<bool> = values.iter().map(|v| !v.is_finite()).collect();
    let mut iterations = 0;
    let (mut center, mut std) = center_and_std(values, &mask, config.center);

    loop {
        if config.max_iters.is_some_and(|max| iterations >= max) {
            break;
        }
        if !center.is_finite() {
            break;
        }
        iterations += 1;

        let limit = config.sigma * std;
        let mut changed = false;
        for (m, &v) in mask.iter_mut().zip(values) {
            if !*m && (v - center).abs() > limit {
                *m = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        (center, std) = center_and_std(values, &mask, config.center);
    }

    ClipResult {
        mask,
        center,
        std,
        iterations,
    }
}

/// Row-wise clipping of a 2-D block (axis = samples).
pub fn sigma_clip_rows(grid: &Grid, config: &ClipConfig) -> Vec<ClipResult> {
    grid.rows().map(|row| sigma_clip(row, config)).collect()
}

fn center_and_std(values: &[f64], mask: &[bool], center_fn: CenterFn) -> (f64, f64) {
    let kept: Vec<f64> = values
        .iter()
        .zip(mask)
        .filter(|(_, &m)| !m)
        .map(|(&v, _)| v)
        .collect();
    if kept.is_empty() {
        return (f64::NAN, f64::NAN);
    }

    let mean = robust::finite_mean(&kept).unwrap_or(f64::NAN);
    let center = match center_fn {
        CenterFn::Mean => mean,
        CenterFn::Median => robust::median(&kept).unwrap_or(mean),
    };
    // Spread is always measured about the mean, centre only shifts the window.
    let std = robust::population_std(&kept).unwrap_or(f64::NAN);
    (center, std)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_outlier_is_the_only_rejected_sample() {
        let mut values = vec![10.0; 20];
        values[7] = 1_000.0;
        let clip = sigma_clip(&values, &ClipConfig::default());

        let rejected: Vec<usize> = clip
            .mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(rejected, vec![7]);
        assert_eq!(clip.center, 10.0);
        assert_eq!(clip.std, 0.0);
    }

    #[test]
    fn too_few_samples_cannot_isolate_outlier() {
        // With n samples a lone outlier sits sqrt(n - 1) sigma away.
        let values = vec![1.0, 1.0, 1.0, 1.0, 100.0];
        let clip = sigma_clip(&values, &ClipConfig::default());
        assert_eq!(clip.n_kept(), 5);
    }

    #[test]
    fn non_finite_samples_are_masked() {
        let values = vec![1.0, f64::NAN, 2.0, f64::INFINITY, 3.0];
        let clip = sigma_clip(&values, &ClipConfig::default());
        assert_eq!(clip.mask, vec![false, true, false, true, false]);
        assert_eq!(clip.kept(&values), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn all_nan_row_is_fully_masked() {
        let values = vec![f64::NAN; 4];
        let clip = sigma_clip(&values, &ClipConfig::default());
        assert!(clip.is_empty());
        assert!(clip.center.is_nan());
        assert_eq!(clip.iterations, 0);
    }

    #[test]
    fn iteration_bound_is_respected() {
        let config = ClipConfig {
            max_iters: Some(1),
            ..ClipConfig::default()
        };
        let mut values: Vec<f64> = (0..50).map(|i| (i % 5) as f64).collect();
        values.push(500.0);
        values.push(60.0);
        let clip = sigma_clip(&values, &config);
        assert_eq!(clip.iterations, 1);
        // The first pass only catches the extreme point; 60 survives it.
        assert!(clip.mask[50]);
        assert!(!clip.mask[51]);

        let full = sigma_clip(&values, &ClipConfig { max_iters: None, ..config });
        assert!(full.mask[51]);
    }

    #[test]
    fn rows_are_clipped_independently() {
        let mut first = vec![5.0; 12];
        first[0] = 500.0;
        let second = vec![2.0; 12];
        let grid = Grid::from_rows(vec![first, second]).unwrap();
        let clips = sigma_clip_rows(&grid, &ClipConfig::default());
        assert_eq!(clips[0].n_kept(), 11);
        assert_eq!(clips[1].n_kept(), 12);
    }

    #[test]
    fn median_centre_rejects_a_cluster_the_mean_absorbs() {
        // 20 zeros and a cluster of four tens: mean 1.67, std 3.73.
        let mut values = vec![0.0; 20];
        values.extend([10.0; 4]);
        let mean_centred = ClipConfig {
            sigma: 2.5,
            ..ClipConfig::default()
        };
        let median_centred = ClipConfig {
            center: CenterFn::Median,
            ..mean_centred
        };

        // 8.3 from the mean is inside 2.5 sigma, 10 from the median is not.
        let by_mean = sigma_clip(&values, &mean_centred);
        assert_eq!(by_mean.n_kept(), 24);

        let by_median = sigma_clip(&values, &median_centred);
        assert_eq!(by_median.n_kept(), 20);
        assert!(by_median.mask[20..].iter().all(|&m| m));
        assert_eq!(by_median.center, 0.0);
    }

    #[test]
    fn huge_values_are_still_clipped() {
        let mut values = vec![1.0e307; 20];
        values[3] = 1.7e308;
        let clip = sigma_clip(&values, &ClipConfig::default());
        assert!(clip.center.is_finite());
        assert_eq!(clip.n_kept(), 19);
        assert!(clip.mask[3]);
    }

    #[test]
    fn masked_as_nan_preserves_length() {
        let values = vec![1.0, f64::NAN, 3.0];
        let clip = sigma_clip(&values, &ClipConfig::default());
        let masked = clip.masked_as_nan(&values);
        assert_eq!(masked.len(), 3);
        assert!(masked[1].is_nan());
    }
}
