/// Data layer: core types, column stores, and the read cache.
///
/// Architecture:
/// ```text
///  .parquet / .json
///        │
///        ▼
///   ┌──────────────┐
///   │ ColumnStore  │  ParquetStore (streaming) | MemoryStore
///   └──────────────┘
///        │  read_row / read_full / read_chunks
///        ▼
///   ┌──────────────┐
///   │  DataCache   │  (column, row) → Arc<ColumnData>, first read wins
///   └──────────────┘
///        │
///        ▼
///   engine: summary / lightcurve / catalogue queries
/// ```

pub mod cache;
pub mod memory;
pub mod model;
pub mod parquet_store;
pub mod store;

pub use cache::{CacheKey, DataCache, Memo};
pub use memory::MemoryStore;
pub use model::{CleanedSeries, ColumnData, Grid};
pub use parquet_store::ParquetStore;
pub use store::{open_store, ChunkIter, ColumnStore};
