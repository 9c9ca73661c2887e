//! # csvd-test
//!
//! Integration tests for csvd.
//!
//! This crate contains:
//! - A harness that runs a real server on an ephemeral port
//! - End-to-end tests that drive it through `csvd-client`

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Server harness for end-to-end tests.
pub mod harness;

pub use harness::TestServer;
