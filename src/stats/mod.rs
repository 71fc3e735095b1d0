/// Numerical kernels shared by the extractors.
///
/// * `clip`    - iterative sigma clipping (row-wise or whole series)
/// * `robust`  - median / MAD / percentile estimators and extent metrics
/// * `binning` - fixed sample-count blocks and fixed coordinate-range bins

pub mod binning;
pub mod clip;
pub mod robust;

pub use binning::{
    bin_irregular, block_average, block_average_row, block_reduce, block_reduce_row,
    BinStatistic, IrregularBins,
};
pub use clip::{sigma_clip, sigma_clip_rows, CenterFn, ClipConfig, ClipResult};
pub use robust::{robust_dispersion, Dispersion, MAD_TO_SIGMA};
