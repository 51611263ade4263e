//! # Sales Summary Core
//!
//! Shared, runtime-agnostic logic for Sales Summary: sales record models,
//! the streaming per-department aggregator, the summary CSV encoder, and the
//! result store abstraction.
//!
//! This crate contains no tokio, filesystem I/O, or HTTP dependencies.
//! Everything here operates on `std::io::Read` streams and in-memory
//! buffers so it can be driven from a server, a CLI, or a test.

pub mod aggregate;
pub mod models;
pub mod store;
pub mod summary;
