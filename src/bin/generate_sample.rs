use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const N_OBJECTS: usize = 500;
const N_SAMPLES: usize = 600;
/// Cadence in days (~13 s exposures).
const CADENCE: f64 = 1.5e-4;
const EPOCH0: f64 = 2_457_274.5;

/// Deterministic splitmix64 stream, so every run writes the same file.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }

    fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        let r = (-2.0 * (1.0 - self.unit()).ln()).sqrt();
        let theta = std::f64::consts::TAU * self.unit();
        mean + sigma * r * theta.cos()
    }
}

fn list_column(rows: &[Vec<f64>]) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().append_slice(row);
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn list_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
        false,
    )
}

fn main() -> Result<()> {
    let mut rng = SampleRng(42);

    let times: Vec<f64> = (0..N_SAMPLES)
        .map(|i| {
            // a gap in the middle of the night makes the sampling irregular
            let gap = if i >= N_SAMPLES / 2 { 0.05 } else { 0.0 };
            EPOCH0 + i as f64 * CADENCE + gap
        })
        .collect();

    let mut hjd = Vec::with_capacity(N_OBJECTS);
    let mut flux = Vec::with_capacity(N_OBJECTS);
    let mut sky = Vec::with_capacity(N_OBJECTS);
    let mut ccdx = Vec::with_capacity(N_OBJECTS);
    let mut ccdy = Vec::with_capacity(N_OBJECTS);
    let mut names = Vec::with_capacity(N_OBJECTS);
    let mut ra = Vec::with_capacity(N_OBJECTS);
    let mut dec = Vec::with_capacity(N_OBJECTS);

    for obj in 0..N_OBJECTS {
        // Log-uniform brightness; photon noise plus a scintillation floor.
        let level = 10f64.powf(rng.uniform(2.0, 6.0));
        let noise = (level + 0.0004 * level * level).sqrt();
        // every 50th aperture sits on a bad pixel and reads negative
        let level = if obj % 50 == 49 { -level } else { level };
        let sky_level = rng.uniform(200.0, 400.0);
        let (x0, y0) = (rng.uniform(0.0, 2048.0), rng.uniform(0.0, 2048.0));
        let drift = rng.normal(0.0, 0.3);

        let mut row = Vec::with_capacity(N_SAMPLES);
        let mut sky_row = Vec::with_capacity(N_SAMPLES);
        let mut x_row = Vec::with_capacity(N_SAMPLES);
        let mut y_row = Vec::with_capacity(N_SAMPLES);
        for i in 0..N_SAMPLES {
            let phase = i as f64 / N_SAMPLES as f64;
            let mut value = rng.normal(level, noise);
            // occasional cosmic ray
            if rng.unit() < 0.005 {
                value += 50.0 * noise;
            }
            row.push(value);
            sky_row.push(rng.normal(sky_level, sky_level.sqrt()));
            x_row.push(x0 + drift * phase + rng.normal(0.0, 0.05));
            y_row.push(y0 - drift * phase + rng.normal(0.0, 0.05));
        }

        hjd.push(times.clone());
        flux.push(row);
        sky.push(sky_row);
        ccdx.push(x_row);
        ccdy.push(y_row);
        names.push(format!("NG0000-{obj:05}"));
        ra.push(rng.uniform(0.0, 360.0));
        dec.push(rng.uniform(-60.0, 10.0));
    }

    let schema = Arc::new(Schema::new(vec![
        list_field("hjd"),
        list_field("tamflux"),
        list_field("skybkg"),
        list_field("ccdx"),
        list_field("ccdy"),
        Field::new("OBJ_ID", DataType::Utf8, false),
        Field::new("RA", DataType::Float64, false),
        Field::new("DEC", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            list_column(&hjd),
            list_column(&flux),
            list_column(&sky),
            list_column(&ccdx),
            list_column(&ccdy),
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(ra)),
            Arc::new(Float64Array::from(dec)),
        ],
    )
    .context("building record batch")?;

    // Write Parquet
    let output_path = "sample_lightcurves.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("Wrote {N_OBJECTS} objects ({N_SAMPLES} samples each) to {output_path}");
    Ok(())
}
