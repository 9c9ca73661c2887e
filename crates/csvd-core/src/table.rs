//! The table value stored under each name.
//!
//! A [`Table`] is an ordered list of index labels, an ordered list of unique
//! column labels, and one row of finite `f64` cells per index label. Tables
//! are validated on construction and never mutated afterwards; the store
//! replaces them wholesale.

use std::collections::HashSet;

use crate::error::{TableError, TableResult};

/// An immutable, validated tabular dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Header cell above the index column (empty for an unnamed index).
    index_label: String,
    /// Data column labels, in order.
    columns: Vec<String>,
    /// Row labels, one per row.
    index: Vec<String>,
    /// Row-major cells, `index.len() * columns.len()` of them.
    values: Vec<f64>,
}

impl Table {
    /// Creates a table from columns, index labels and rows.
    ///
    /// The index label (first header cell) is empty; use
    /// [`Table::with_index_label`] to name it.
    pub fn new(
        columns: Vec<String>,
        index: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> TableResult<Self> {
        if index.len() != rows.len() {
            return Err(TableError::IndexLengthMismatch {
                index: index.len(),
                rows: rows.len(),
            });
        }

        let mut builder = TableBuilder::with_capacity(String::new(), columns, rows.len())?;
        for (label, row) in index.into_iter().zip(rows) {
            builder.push_row(label, &row)?;
        }
        Ok(builder.build())
    }

    /// Returns a builder for a table with the given header.
    pub fn builder(
        index_label: impl Into<String>,
        columns: Vec<String>,
    ) -> TableResult<TableBuilder> {
        TableBuilder::with_capacity(index_label.into(), columns, 0)
    }

    /// Sets the index column's header cell.
    pub fn with_index_label(mut self, label: impl Into<String>) -> Self {
        self.index_label = label.into();
        self
    }

    /// Returns the index column's header cell.
    pub fn index_label(&self) -> &str {
        &self.index_label
    }

    /// Returns the data column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the row labels.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    /// Returns the number of data columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the cells of row `i`.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i >= self.num_rows() {
            return None;
        }
        let width = self.num_columns();
        Some(&self.values[i * width..(i + 1) * width])
    }

    /// Iterates over `(index label, cells)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.index
            .iter()
            .map(String::as_str)
            .zip(self.values.chunks_exact(self.columns.len()))
    }

    /// Returns the values of the named column, top to bottom.
    pub fn column(&self, label: &str) -> Option<Vec<f64>> {
        let pos = self.columns.iter().position(|c| c == label)?;
        Some(self.rows().map(|(_, cells)| cells[pos]).collect())
    }

    /// Returns the number of cells.
    pub fn num_cells(&self) -> usize {
        self.values.len()
    }
}

/// Incremental, validating constructor for [`Table`].
///
/// Used by the decoder so that a bad row is rejected as soon as it is seen.
#[derive(Debug)]
pub struct TableBuilder {
    index_label: String,
    columns: Vec<String>,
    index: Vec<String>,
    values: Vec<f64>,
}

impl TableBuilder {
    /// Validates the header and reserves room for `rows` rows.
    pub fn with_capacity(
        index_label: String,
        columns: Vec<String>,
        rows: usize,
    ) -> TableResult<Self> {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        let width = columns.len();
        Ok(Self {
            index_label,
            columns,
            index: Vec::with_capacity(rows),
            values: Vec::with_capacity(rows * width),
        })
    }

    /// Appends one row.
    pub fn push_row(&mut self, label: impl Into<String>, cells: &[f64]) -> TableResult<()> {
        let row = self.index.len();
        if cells.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row,
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        if let Some(pos) = cells.iter().position(|v| !v.is_finite()) {
            return Err(TableError::NonFinite {
                row,
                column: self.columns[pos].clone(),
            });
        }

        self.index.push(label.into());
        self.values.extend_from_slice(cells);
        Ok(())
    }

    /// Returns the data column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Finishes the table.
    pub fn build(self) -> Table {
        Table {
            index_label: self.index_label,
            columns: self.columns,
            index: self.index,
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_new() {
        let table = Table::new(
            labels(&["val1", "val2"]),
            labels(&["2013-01-01 00:00:00", "2013-01-01 00:01:00"]),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.num_cells(), 4);
        assert_eq!(table.index_label(), "");
        assert_eq!(table.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(table.row(2), None);
        assert_eq!(table.column("val2"), Some(vec![2.0, 4.0]));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_table_rows_iterator() {
        let table = Table::new(
            labels(&["value"]),
            labels(&["a", "b", "c"]),
            vec![vec![1.0], vec![2.0], vec![3.0]],
        )
        .unwrap();

        let collected: Vec<(&str, f64)> = table.rows().map(|(l, c)| (l, c[0])).collect();
        assert_eq!(collected, vec![("a", 1.0), ("b", 2.0), ("c", 3.0)]);
    }

    #[test]
    fn test_table_zero_rows() {
        let table = Table::new(labels(&["value"]), vec![], vec![]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.rows().count(), 0);
    }

    #[test]
    fn test_table_rejects_no_columns() {
        let err = Table::new(vec![], vec![], vec![]).unwrap_err();
        assert_eq!(err, TableError::NoColumns);
    }

    #[test]
    fn test_table_rejects_duplicate_columns() {
        let err = Table::new(labels(&["a", "b", "a"]), vec![], vec![]).unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateColumn {
                column: "a".to_string()
            }
        );
    }

    #[test]
    fn test_table_rejects_index_mismatch() {
        let err = Table::new(labels(&["a"]), labels(&["x"]), vec![]).unwrap_err();
        assert_eq!(err, TableError::IndexLengthMismatch { index: 1, rows: 0 });
    }

    #[test]
    fn test_table_rejects_ragged_row() {
        let err = Table::new(
            labels(&["a", "b"]),
            labels(&["x", "y"]),
            vec![vec![1.0, 2.0], vec![3.0]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_table_rejects_non_finite() {
        let err = Table::new(labels(&["a", "b"]), labels(&["x"]), vec![vec![1.0, f64::NAN]])
            .unwrap_err();
        assert_eq!(
            err,
            TableError::NonFinite {
                row: 0,
                column: "b".to_string()
            }
        );
    }

    #[test]
    fn test_builder_keeps_index_label() {
        let mut builder = Table::builder("ts", labels(&["v"])).unwrap();
        builder.push_row("t0", &[0.5]).unwrap();
        let table = builder.build();
        assert_eq!(table.index_label(), "ts");
        assert_eq!(table.index(), &["t0".to_string()]);
    }
}
