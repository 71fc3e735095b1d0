mod common;

use std::sync::Arc;

use approx::assert_relative_eq;
use rusty_lightcurves::{
    open_store, ColumnData, ColumnStore, EngineError, ParquetStore, Session, SessionConfig,
};
use tempfile::NamedTempFile;

fn parquet_file() -> NamedTempFile {
    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    common::write_parquet(file.path());
    file
}

#[test]
fn schema_and_row_count() {
    let file = parquet_file();
    let store = ParquetStore::open(file.path()).unwrap();

    assert_eq!(store.row_count("tamflux").unwrap(), 5);
    assert!(store.has_column("OBJ_ID"));
    assert!(!store.has_column("ccdx"));
    let names = store.column_names();
    assert!(names.contains(&"hjd".to_string()));
    assert!(names.contains(&"DEC".to_string()));
}

#[test]
fn single_rows_are_widened_to_f64() {
    let file = parquet_file();
    let store = ParquetStore::open(file.path()).unwrap();

    // row 4 lives in the third row group
    let flux = store.read_row("tamflux", 4).unwrap();
    assert_eq!(flux, common::flux_rows()[4]);

    let hjd = store.read_row("hjd", 3).unwrap();
    assert_eq!(hjd.len(), common::N_SAMPLES);
    assert_relative_eq!(hjd[1], 57_000.51, epsilon = 1e-9);

    assert_eq!(store.read_row("RA", 2).unwrap(), vec![30.0]);
}

#[test]
fn full_columns_keep_their_kind() {
    let file = parquet_file();
    let store = ParquetStore::open(file.path()).unwrap();

    match store.read_full("OBJ_ID").unwrap() {
        ColumnData::Text(names) => assert_eq!(names[3], "OBJ3"),
        other => panic!("expected text, got {}", other.kind()),
    }
    match store.read_full("DEC").unwrap() {
        ColumnData::Values(dec) => assert_eq!(dec, vec![-30.5; 5]),
        other => panic!("expected values, got {}", other.kind()),
    }
    match store.read_full("tamflux").unwrap() {
        ColumnData::Grid(grid) => {
            assert_eq!(grid.shape(), (5, common::N_SAMPLES));
            assert_eq!(grid.row(2), common::flux_rows()[2].as_slice());
        }
        other => panic!("expected grid, got {}", other.kind()),
    }
}

#[test]
fn chunks_cover_every_row_once() {
    let file = parquet_file();
    let store = ParquetStore::open(file.path()).unwrap();

    let mut rows = Vec::new();
    for chunk in store.read_chunks("tamflux", 3).unwrap() {
        let chunk = chunk.unwrap();
        assert!(chunk.n_rows() <= 3);
        assert_eq!(chunk.n_cols(), common::N_SAMPLES);
        rows.extend(chunk.rows().map(<[f64]>::to_vec));
    }
    assert_eq!(rows, common::flux_rows());
}

#[test]
fn bad_requests_are_typed_errors() {
    let file = parquet_file();
    let store = ParquetStore::open(file.path()).unwrap();

    assert!(matches!(
        store.read_row("nope", 0),
        Err(EngineError::InvalidParameter(_))
    ));
    assert!(matches!(
        store.read_row("tamflux", 5),
        Err(EngineError::OutOfRange { index: 5, len: 5, .. })
    ));
    assert!(matches!(
        store.read_chunks("RA", 2),
        Err(EngineError::InvalidParameter(_))
    ));
    assert!(matches!(
        store.read_chunks("tamflux", 0),
        Err(EngineError::InvalidParameter(_))
    ));
}

#[test]
fn garbage_with_a_parquet_suffix_is_a_format_error() {
    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    std::fs::write(file.path(), b"not parquet at all").unwrap();
    assert!(matches!(
        open_store(file.path()).err().unwrap(),
        EngineError::Format(_)
    ));
}

#[test]
fn summary_over_parquet_matches_memory() {
    let file = parquet_file();
    let config = SessionConfig {
        chunk_size: 2,
        ..SessionConfig::default()
    };
    let from_file = Session::open(file.path(), config.clone()).unwrap();
    let in_memory =
        Session::from_store(Arc::new(common::memory_store()), config).unwrap();

    let (n_file, file_summary) = from_file.summarize("tamflux", None).unwrap();
    let (n_mem, mem_summary) = in_memory.summarize("tamflux", None).unwrap();
    assert_eq!(n_file, 3);
    assert_eq!(n_file, n_mem);
    assert_eq!(file_summary.valid_rows(), mem_summary.valid_rows());
    for (a, b) in file_summary.frms().iter().zip(mem_summary.frms()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }

    let row = from_file.rank_to_physical(1).unwrap();
    assert_eq!(row, 2);
    assert_eq!(from_file.object_name(row).unwrap(), "OBJ2");
    assert_eq!(from_file.lightcurve("tamflux", row, None).unwrap().values.len(), common::N_SAMPLES);
}
