//! Synthetic tables for load generation and tests.
//!
//! Tables are indexed by consecutive minutes starting at
//! `2013-01-01 00:00:00` and filled with standard-normal-ish values.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;

use csvd_core::{Table, TableName, TableResult};

/// Format of the generated index labels.
pub const INDEX_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns of a [`random_frame`].
pub const FRAME_COLUMNS: [&str; 2] = ["val1", "val2"];

/// Column of a [`random_series`].
pub const SERIES_COLUMN: &str = "value";

fn index_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2013, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Returns `rows` labels one minute apart, starting at `2013-01-01 00:00:00`.
pub fn minute_index(rows: usize) -> Vec<String> {
    let start = index_start();
    (0..rows)
        .map(|i| {
            (start + Duration::minutes(i as i64))
                .format(INDEX_FORMAT)
                .to_string()
        })
        .collect()
}

/// Builds a minute-indexed table with the given columns and random values.
pub fn random_table<R: Rng + ?Sized>(
    rng: &mut R,
    columns: &[&str],
    rows: usize,
) -> TableResult<Table> {
    let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let mut builder = Table::builder("", columns)?;
    let width = builder.columns().len();

    let mut cells = Vec::with_capacity(width);
    for label in minute_index(rows) {
        cells.clear();
        cells.extend((0..width).map(|_| gaussian(rng)));
        builder.push_row(label, &cells)?;
    }
    Ok(builder.build())
}

/// A `val1`, `val2` table of `rows` rows, the shape uploaded to `/frame`.
pub fn random_frame<R: Rng + ?Sized>(rng: &mut R, rows: usize) -> TableResult<Table> {
    random_table(rng, &FRAME_COLUMNS, rows)
}

/// A single `value` column of `rows` rows.
pub fn random_series<R: Rng + ?Sized>(rng: &mut R, rows: usize) -> TableResult<Table> {
    random_table(rng, &[SERIES_COLUMN], rows)
}

/// A random 16-character alphanumeric table name.
pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> TableName {
    TableName::random(rng)
}

// Box-Muller.
fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
