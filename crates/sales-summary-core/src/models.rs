//! Core data models used throughout Sales Summary.
//!
//! These types represent the per-row sales records read from an upload,
//! the per-department totals built from them, and the metrics reported
//! for one aggregation run.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Header label that marks the first row of an input file as a header.
pub const DEPARTMENT_HEADER: &str = "Department Name";

/// Header row written at the top of every summary file.
pub const SUMMARY_HEADER: [&str; 2] = [DEPARTMENT_HEADER, "Total Number of Sales"];

/// Per-department running totals, in first-seen order.
///
/// Order only affects the row order of the encoded summary; lookups and
/// equality do not depend on it. Totals are 128-bit so sums of
/// 64-bit-sized counts cannot overflow in practice.
pub type DepartmentTotals = IndexMap<String, i128>;

/// One parsed input row: `Department Name,Date,Number of Sales`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRecord {
    pub department: String,
    /// Carried through for completeness; aggregation ignores it.
    pub date: Option<String>,
    pub sales: i128,
}

/// Reason a data row was counted but not aggregated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("row has no department name field")]
    MissingDepartment,

    #[error("row has no number of sales field")]
    MissingSalesCount,

    #[error("number of sales is not an integer: {value:?}")]
    InvalidSalesCount { value: String },

    #[error("row could not be decoded: {reason}")]
    Malformed { reason: String },

    #[error("adding this row would overflow the total for {department:?}")]
    TotalOverflow { department: String },
}

/// Metrics computed once at the end of an aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Wall-clock seconds from the first read to the final row.
    pub processing_time_seconds: f64,
    /// Data rows seen, excluding a detected header but including skipped rows.
    pub total_rows_processed: usize,
    /// Distinct departments with at least one aggregated row.
    pub total_departments: usize,
    /// Rows counted in `total_rows_processed` that contributed nothing.
    pub rows_skipped: usize,
    pub completed_at: DateTime<Utc>,
}
