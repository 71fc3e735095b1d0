//! Lightcurve extraction and robust noise statistics over large columnar
//! photometry files.
//!
//! A [`Session`] wraps one opened file. [`Session::summarize`] scans a flux
//! column once, in bounded chunks, and ranks objects by robust fractional
//! RMS against median flux; single-object queries ([`Session::lightcurve`],
//! [`Session::coordinate_series`], ...) read through a per-session cache.
//!
//! ```no_run
//! use std::path::Path;
//! use rusty_lightcurves::{Session, SessionConfig};
//!
//! # fn main() -> rusty_lightcurves::Result<()> {
//! let session = Session::open(Path::new("night.parquet"), SessionConfig::default())?;
//! let (n_valid, _summary) = session.summarize("tamflux", None)?;
//! if n_valid > 0 {
//!     let row = session.rank_to_physical(0)?;
//!     let lc = session.lightcurve("tamflux", row, Some(5))?;
//!     println!("{} points", lc.times.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod session;
pub mod stats;

pub use config::SessionConfig;
pub use data::{open_store, ColumnData, ColumnStore, DataCache, Grid, MemoryStore, ParquetStore};
pub use engine::{
    CoordAxis, CoordinateExtent, CoordinateSeries, LightcurveReport, LightcurveSeries,
    SkyPosition, Summary, SummaryOverview,
};
pub use error::{EngineError, Result};
pub use session::Session;
