//! # csvd-client
//!
//! Client library for csvd.
//!
//! This crate provides a typed HTTP client for a csvd server and the
//! helpers the `csvd-load` binary uses to generate traffic:
//!
//! - **Client**: upload, replace, fetch, delete and list tables
//! - **Workload**: random minute-indexed tables and random table names
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csvd_client::{workload, Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new().host("localhost").port(3737))?;
//!
//!     // Upload under a generated name
//!     let table = workload::random_frame(&mut rand::thread_rng(), 100)?;
//!     let name = client.upload_frame(&table).await?;
//!
//!     // Read it back
//!     let fetched = client.read_table(name.as_str()).await?;
//!     assert_eq!(fetched, table);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

/// HTTP client.
pub mod client;

/// Synthetic table generation.
pub mod workload;

// Re-exports
pub use client::{Client, ClientConfig, ClientStats, Health};
pub use csvd_core::PutOutcome;
pub use error::{ClientError, ClientResult};
