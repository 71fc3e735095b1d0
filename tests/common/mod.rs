//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Builder, Float64Array, Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use rusty_lightcurves::{ColumnData, Grid, MemoryStore};

pub const N_SAMPLES: usize = 24;

/// Epochs shared by every object, one sample every 0.01 d.
pub fn epochs() -> Vec<f64> {
    (0..N_SAMPLES).map(|i| 57_000.5 + i as f64 * 0.01).collect()
}

/// Flux rows for five objects; rows 1 and 3 have non-positive medians.
pub fn flux_rows() -> Vec<Vec<f64>> {
    let wobble = |level: f64| -> Vec<f64> {
        (0..N_SAMPLES)
            .map(|i| level + [-2.0, -1.0, 0.0, 1.0, 2.0][i % 5])
            .collect()
    };
    vec![
        wobble(1_000.0),
        wobble(-50.0),
        wobble(200.0),
        vec![0.0; N_SAMPLES],
        wobble(5_000.0),
    ]
}

pub fn memory_store() -> MemoryStore {
    let n = flux_rows().len();
    let grid = |rows: Vec<Vec<f64>>| ColumnData::Grid(Grid::from_rows(rows).unwrap());
    let ramp = |start: f64| -> Vec<f64> { (0..N_SAMPLES).map(|i| start + i as f64 * 0.1).collect() };

    MemoryStore::new()
        .with_column("hjd", grid(vec![epochs(); n]))
        .unwrap()
        .with_column("tamflux", grid(flux_rows()))
        .unwrap()
        .with_column("skybkg", grid(vec![vec![300.0; N_SAMPLES]; n]))
        .unwrap()
        .with_column("ccdx", grid((0..n).map(|i| ramp(100.0 * i as f64)).collect()))
        .unwrap()
        .with_column("ccdy", grid(vec![vec![512.0; N_SAMPLES]; n]))
        .unwrap()
        .with_column(
            "OBJ_ID",
            ColumnData::Text((0..n).map(|i| format!("OBJ{i}")).collect()),
        )
        .unwrap()
        .with_column("RA", ColumnData::Values((0..n).map(|i| 15.0 * i as f64).collect()))
        .unwrap()
        .with_column("DEC", ColumnData::Values(vec![-30.5; n]))
        .unwrap()
}

fn list_f64(rows: &[Vec<f64>]) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().append_slice(row);
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn list_f32(rows: &[Vec<f64>]) -> ArrayRef {
    let mut builder = ListBuilder::new(Float32Builder::new());
    for row in rows {
        for &v in row {
            builder.values().append_value(v as f32);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn list_field(name: &str, inner: DataType) -> Field {
    Field::new(name, DataType::List(Arc::new(Field::new("item", inner, true))), false)
}

/// Write the same objects as [`memory_store`] to Parquet, flux as Float32,
/// split over several small row groups.
pub fn write_parquet(path: &Path) {
    let rows = flux_rows();
    let n = rows.len();

    let schema = Arc::new(Schema::new(vec![
        list_field("hjd", DataType::Float64),
        list_field("tamflux", DataType::Float32),
        Field::new("OBJ_ID", DataType::Utf8, false),
        Field::new("RA", DataType::Float64, false),
        Field::new("DEC", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            list_f64(&vec![epochs(); n]),
            list_f32(&rows),
            Arc::new(StringArray::from(
                (0..n).map(|i| format!("OBJ{i}")).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from((0..n).map(|i| 15.0 * i as f64).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(vec![-30.5; n])),
        ],
    )
    .unwrap();

    let props = WriterProperties::builder().set_max_row_group_size(2).build();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}
