//! CSV encoding and decoding of tables.
//!
//! The wire shape is the one pandas' `DataFrame.to_csv()` produces:
//!
//! ```text
//! ,val1,val2
//! 2013-01-01 00:00:00,0.4967,-0.1383
//! 2013-01-01 00:01:00,0.6477,1.5230
//! ```
//!
//! The first header cell names the index column (often empty), the rest name
//! the data columns. Each following record is an index label and one number
//! per column. Index labels are opaque strings; they are never parsed as dates.
//!
//! Numbers are written with the shortest representation that parses back to
//! the same `f64`, so `decode(encode(t)) == t` holds exactly. Magnitudes
//! below `1e-4` or from `1e16` up use exponent form (`1e300`, `5e-324`).

use std::fmt::Write as _;
use std::io;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::{DecodeError, DecodeResult, TableError};
use crate::table::{Table, TableBuilder};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Content type used for CSV bodies.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

// =========================================================================
// Encoding
// =========================================================================

/// Encodes a table as CSV text.
pub fn encode(table: &Table) -> csv::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(estimate_size(table));
    encode_to(table, &mut buf)?;
    Ok(buf)
}

/// Encodes a table as CSV into `writer`.
pub fn encode_to<W: io::Write>(table: &Table, writer: W) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_field(table.index_label())?;
    for column in table.columns() {
        wtr.write_field(column)?;
    }
    wtr.write_record(None::<&[u8]>)?;

    let mut cell = String::with_capacity(32);
    for (label, values) in table.rows() {
        wtr.write_field(label)?;
        for value in values {
            cell.clear();
            let _ = write!(cell, "{:?}", value);
            wtr.write_field(&cell)?;
        }
        wtr.write_record(None::<&[u8]>)?;
    }

    wtr.flush()?;
    Ok(())
}

fn estimate_size(table: &Table) -> usize {
    let header: usize = table.columns().iter().map(|c| c.len() + 1).sum();
    let labels: usize = table.index().iter().map(|l| l.len() + 1).sum();
    header + labels + table.num_cells() * 20
}

// =========================================================================
// Decoding
// =========================================================================

/// Decodes CSV text into a table.
///
/// Rejects empty bodies, ragged records, and cells that are not finite
/// numbers. Nothing is returned unless the whole body is valid.
pub fn decode(bytes: &[u8]) -> DecodeResult<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(DecodeError::Empty),
    };
    let mut builder = header_to_builder(&header)?;
    let expected = builder.columns().len() + 1;

    let mut cells = Vec::with_capacity(expected - 1);
    for record in records {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        if record.len() != expected {
            return Err(DecodeError::Ragged {
                line,
                expected,
                found: record.len(),
            });
        }

        cells.clear();
        for (raw, column) in record.iter().skip(1).zip(builder.columns()) {
            cells.push(parse_cell(raw, line, column)?);
        }

        builder.push_row(&record[0], &cells)?;
    }

    Ok(builder.build())
}

fn header_to_builder(header: &StringRecord) -> DecodeResult<TableBuilder> {
    let mut fields = header.iter();
    let index_label = fields.next().unwrap_or_default().to_string();
    let columns: Vec<String> = fields.map(str::to_string).collect();

    TableBuilder::with_capacity(index_label, columns, 0).map_err(|e| match e {
        TableError::NoColumns => DecodeError::NoColumns,
        TableError::DuplicateColumn { column } => DecodeError::DuplicateColumn { column },
        other => DecodeError::Table(other),
    })
}

fn parse_cell(raw: &str, line: u64, column: &str) -> DecodeResult<f64> {
    let text = raw.trim();
    let value: f64 = text.parse().map_err(|_| DecodeError::NonNumeric {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })?;

    if !value.is_finite() {
        return Err(DecodeError::NonFinite {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn minute_labels(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("2013-01-01 {:02}:{:02}:00", i / 60, i % 60))
            .collect()
    }

    fn random_table(rng: &mut StdRng, rows: usize, cols: usize) -> Table {
        let columns = (0..cols).map(|i| format!("val{}", i + 1)).collect();
        let data = (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen_range(-1e6..1e6)).collect())
            .collect();
        Table::new(columns, minute_labels(rows), data).unwrap()
    }

    #[test]
    fn test_encode_shape() {
        let table = Table::new(
            labels(&["val1", "val2"]),
            labels(&["2013-01-01 00:00:00", "2013-01-01 00:01:00"]),
            vec![vec![0.5, -1.25], vec![3.0, 1e-7]],
        )
        .unwrap();

        let text = String::from_utf8(encode(&table).unwrap()).unwrap();
        assert_eq!(
            text,
            ",val1,val2\n\
             2013-01-01 00:00:00,0.5,-1.25\n\
             2013-01-01 00:01:00,3.0,1e-7\n"
        );
    }

    #[test]
    fn test_decode_pandas_output() {
        let body = b",val1,val2\n\
            2013-01-01 00:00:00,0.4967141530112327,-0.13826430117118466\n\
            2013-01-01 00:01:00,0.6476885381006925,1.5230298564080254\n";

        let table = decode(body).unwrap();
        assert_eq!(table.index_label(), "");
        assert_eq!(table.columns(), &labels(&["val1", "val2"])[..]);
        assert_eq!(table.index()[1], "2013-01-01 00:01:00");
        assert_eq!(table.row(0), Some(&[0.4967141530112327, -0.13826430117118466][..]));
    }

    #[test]
    fn test_round_trip_random_tables() {
        let mut rng = StdRng::seed_from_u64(42);
        for (rows, cols) in [(1, 1), (10, 1), (100, 2), (7, 5), (250, 3)] {
            let table = random_table(&mut rng, rows, cols);
            let decoded = decode(&encode(&table).unwrap()).unwrap();
            assert_eq!(decoded, table, "rows={} cols={}", rows, cols);
        }
    }

    #[test]
    fn test_round_trip_extreme_values() {
        let table = Table::new(
            labels(&["v"]),
            labels(&["a", "b", "c", "d", "e", "f"]),
            vec![
                vec![f64::MAX],
                vec![f64::MIN_POSITIVE],
                vec![-0.0],
                vec![5e-324],
                vec![0.1 + 0.2],
                vec![-123456789.000001],
            ],
        )
        .unwrap();

        let decoded = decode(&encode(&table).unwrap()).unwrap();
        assert_eq!(decoded, table);
        assert!(decoded.row(2).unwrap()[0].is_sign_negative());
    }

    #[test]
    fn test_extreme_magnitudes_use_exponent_form() {
        let table = Table::new(
            labels(&["a"]),
            labels(&["x", "y", "z"]),
            vec![vec![1e300], vec![-2.5e-300], vec![12345.5]],
        )
        .unwrap();

        let text = String::from_utf8(encode(&table).unwrap()).unwrap();
        assert_eq!(text, ",a\nx,1e300\ny,-2.5e-300\nz,12345.5\n");
        assert_eq!(decode(text.as_bytes()).unwrap(), table);
    }

    #[test]
    fn test_round_trip_keeps_index_label_and_quoting() {
        let table = Table::new(
            labels(&["price, usd", "say \"hi\""]),
            labels(&["2013-01-01T00:00:00+05:00", "row, two"]),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap()
        .with_index_label("timestamp");

        let decoded = decode(&encode(&table).unwrap()).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.index_label(), "timestamp");
    }

    #[test]
    fn test_single_column_matches_multi_column_behaviour() {
        let single = decode(b",value\nt0,1.5\nt1,2.5\n").unwrap();
        assert_eq!(single.num_columns(), 1);
        assert_eq!(single.column("value"), Some(vec![1.5, 2.5]));
        assert_eq!(decode(&encode(&single).unwrap()).unwrap(), single);
    }

    #[test]
    fn test_decode_header_only() {
        let table = decode(b",value\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 1);
    }

    #[test]
    fn test_decode_crlf_and_bom() {
        let table = decode(b"\xEF\xBB\xBFidx,a\r\nx,1\r\ny,2\r\n").unwrap();
        assert_eq!(table.index_label(), "idx");
        assert_eq!(table.column("a"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_decode_trims_numeric_cells() {
        let table = decode(b",a,b\nx, 1.5 ,2\n").unwrap();
        assert_eq!(table.row(0), Some(&[1.5, 2.0][..]));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(matches!(decode(b""), Err(DecodeError::Empty)));
        assert!(matches!(decode(b"  \n\r\n"), Err(DecodeError::Empty)));
        assert!(matches!(decode(UTF8_BOM), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_rejects_index_only_header() {
        assert!(matches!(decode(b"idx\nx\n"), Err(DecodeError::NoColumns)));
    }

    #[test]
    fn test_decode_rejects_duplicate_columns() {
        match decode(b",a,a\nx,1,2\n") {
            Err(DecodeError::DuplicateColumn { column }) => assert_eq!(column, "a"),
            other => panic!("expected DuplicateColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_short_row() {
        match decode(b",a,b\nx,1,2\ny,3\n") {
            Err(DecodeError::Ragged {
                line,
                expected,
                found,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected Ragged, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_long_row() {
        assert!(matches!(
            decode(b",a\nx,1,2\n"),
            Err(DecodeError::Ragged { found: 3, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        match decode(b",a,b\nx,1,abc\n") {
            Err(DecodeError::NonNumeric {
                line,
                column,
                value,
            }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "b");
                assert_eq!(value, "abc");
            }
            other => panic!("expected NonNumeric, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_empty_cell() {
        assert!(matches!(
            decode(b",a,b\nx,1,\n"),
            Err(DecodeError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_non_finite() {
        assert!(matches!(
            decode(b",a\nx,NaN\n"),
            Err(DecodeError::NonFinite { .. })
        ));
        assert!(matches!(
            decode(b",a\nx,-inf\n"),
            Err(DecodeError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode(b",a\n\xFF\xFE,1\n"),
            Err(DecodeError::Csv(_))
        ));
    }
}
