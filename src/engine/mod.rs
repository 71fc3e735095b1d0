/// Query engine: everything between the column store and the caller.
///
/// Control flow:
/// ```text
///   summary     full-column chunked scan → Summary (+ valid index set)
///   remap       rank (0..K) ↔ physical row
///   lightcurve  cache → [irregular binning] → sigma clip → cleaned series
///   catalog     object names and sky positions
/// ```

pub mod catalog;
pub mod lightcurve;
pub mod remap;
pub mod summary;

pub use catalog::{Catalog, SkyPosition};
pub use lightcurve::{
    CoordAxis, CoordinateExtent, CoordinateSeries, LightcurveExtractor, LightcurveReport,
    LightcurveSeries,
};
pub use remap::{valid_indices, IndexRemapper};
pub use summary::{extract_summary, Summary, SummaryOptions, SummaryOverview};
