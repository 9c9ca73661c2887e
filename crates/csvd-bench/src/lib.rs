//! csvd Performance Benchmarks
//!
//! This crate contains benchmarks for the csvd core:
//! - CSV encode and decode of tables of various shapes
//! - Table store puts, gets and generated-name inserts, single and multi-threaded
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p csvd-bench
//! ```

pub mod utils;
