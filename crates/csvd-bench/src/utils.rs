//! Benchmark utilities and helpers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use csvd_core::{Table, TableName};

/// Generates a `rows` x `cols` table of random values with sequential labels.
pub fn generate_table(rows: usize, cols: usize) -> Table {
    let mut rng = StdRng::seed_from_u64(42);
    let columns = (0..cols).map(|c| format!("col{}", c)).collect();
    let mut builder = Table::builder("", columns).expect("columns are unique");

    let mut cells = vec![0.0; cols];
    for i in 0..rows {
        for cell in cells.iter_mut() {
            *cell = rng.gen_range(-1000.0..1000.0);
        }
        builder
            .push_row(format!("row_{:08}", i), &cells)
            .expect("cells are finite");
    }
    builder.build()
}

/// Generates sequential table names for benchmarks.
pub fn generate_names(count: usize, prefix: &str) -> Vec<TableName> {
    (0..count)
        .filter_map(|i| TableName::new(format!("{}{:08}", prefix, i)).ok())
        .collect()
}

/// Generates random 16-character table names.
pub fn generate_random_names(count: usize) -> Vec<TableName> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count).map(|_| TableName::random(&mut rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_names() {
        let names = generate_random_names(100);
        assert_eq!(names.len(), 100);
        assert!(names.iter().all(|n| n.as_str().len() == 16));
        assert_eq!(generate_random_names(100), names);
    }

    #[test]
    fn test_generate_table_shape() {
        let table = generate_table(10, 3);
        assert_eq!(table.num_rows(), 10);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(table.index()[9], "row_00000009");
    }
}
