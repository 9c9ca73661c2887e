//! # csvd-server
//!
//! Network server for csvd, a concurrent named-table store that speaks CSV
//! over HTTP.
//!
//! This crate provides:
//!
//! - **HTTP Layer**: axum routes that decode uploaded CSV into tables, store
//!   them by name, and serve them back as CSV.
//!
//! - **Configuration**: TOML-backed server settings with a builder.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use csvd_core::TableStore;
//! use csvd_server::http::HttpServer;
//!
//! let store = Arc::new(TableStore::in_memory());
//! let server = HttpServer::new(store, "127.0.0.1:3737".parse()?);
//! server.serve().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Server configuration.
pub mod config;

/// HTTP routes, handlers and server.
pub mod http;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use http::{ApiError, BoundServer, HttpOptions, HttpServer};
