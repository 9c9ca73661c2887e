//! # csvd-core
//!
//! Table model, CSV codec, and concurrent table store for csvd.
//!
//! This crate provides:
//!
//! - **Table**: an immutable, validated dataset of index labels × named
//!   numeric columns
//! - **Codec**: CSV encode/decode in the shape pandas' `to_csv()` produces
//! - **TableStore**: a sharded name → table registry with per-name atomic
//!   replacement and optional one-file-per-table persistence
//!
//! ## Example
//!
//! ```rust
//! use csvd_core::{codec, TableName, TableStore};
//!
//! let store = TableStore::in_memory();
//! let table = codec::decode(b",value\n2013-01-01 00:00:00,1.5\n").unwrap();
//!
//! let name = TableName::new("prices").unwrap();
//! store.put(&name, table).unwrap();
//!
//! let stored = store.get("prices").unwrap();
//! assert_eq!(stored.column("value"), Some(vec![1.5]));
//! assert!(store.get("missing").unwrap_err().is_not_found());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod error;
pub mod name;
pub mod store;
pub mod table;

pub use config::StoreConfig;
pub use error::{
    DecodeError, DecodeResult, StoreError, StoreResult, TableError, TableResult,
};
pub use name::TableName;
pub use store::{PutOutcome, StoreStats, TableStore};
pub use table::{Table, TableBuilder};
