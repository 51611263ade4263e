//! # Sales Summary
//!
//! Upload per-department sales CSVs, aggregate total sales per department,
//! and download the aggregated summary.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │ POST /upload │──▶│ UploadProcessor  │──▶│  ResultStore     │
//! │ CLI process  │   │ aggregate+encode │   │ processed_files/ │
//! └──────────────┘   └────────┬─────────┘   └────────┬─────────┘
//!                             │ deferred             │
//!                             ▼                      ▼
//!                      ┌────────────┐       ┌──────────────────────┐
//!                      │ TaskQueue  │       │ GET /results/{id}    │
//!                      └────────────┘       │ CLI get              │
//!                                           └──────────────────────┘
//! ```
//!
//! Parsing, aggregation and encoding live in [`sales_summary_core`]; this
//! crate adds configuration, on-disk storage, the background queue, the
//! HTTP server and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`file_store`] | Local-directory result store |
//! | [`tasks`] | Background task queue |
//! | [`processor`] | Upload → summary pipeline |
//! | [`server`] | HTTP server |
//! | [`get`] | Stored summary retrieval |
//! | [`process_cmd`] | Offline processing command |
//! | [`logging`] | Tracing setup |

pub mod config;
pub mod file_store;
pub mod get;
pub mod logging;
pub mod process_cmd;
pub mod processor;
pub mod server;
pub mod tasks;
