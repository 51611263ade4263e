//! Streaming per-department sales aggregator.
//!
//! Reads a CSV stream of `Department Name,Date,Number of Sales` rows in a
//! single pass and sums the sales count per department.
//!
//! # Algorithm
//!
//! 1. Fields are read positionally; the stream has no guaranteed header.
//! 2. If the first row's first field is exactly `Department Name`, it is a
//!    header and is neither aggregated nor counted.
//! 3. Every other row is counted. Rows that fail [`parse_record`] (missing
//!    department, missing or non-integer count, undecodable bytes) are
//!    skipped without aborting the run.
//! 4. Parsed counts are added to the department's running total, creating
//!    the entry on first sight. A row whose addition would overflow the
//!    total is skipped like any other bad row, leaving the total unchanged.
//! 5. Metrics are computed once the stream is exhausted.
//!
//! Negative counts are accepted and summed as-is.
//!
//! # Example
//!
//! ```rust
//! use sales_summary_core::aggregate::aggregate_sales;
//!
//! let input = "Department Name,Date,Number of Sales\n\
//!              Electronics,2023-08-01,100\n\
//!              Electronics,2023-08-02,150\n";
//! let result = aggregate_sales(input.as_bytes()).unwrap();
//! assert_eq!(result.totals["Electronics"], 250);
//! assert_eq!(result.metrics.total_rows_processed, 2);
//! ```

use std::io::Read;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use csv::StringRecord;
use tracing::{debug, info};

use crate::models::{
    DepartmentTotals, ProcessingMetrics, RowError, SalesRecord, DEPARTMENT_HEADER,
};

/// Totals and metrics produced by one aggregation run.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub totals: DepartmentTotals,
    pub metrics: ProcessingMetrics,
}

/// Parse one positional CSV record into a [`SalesRecord`].
///
/// Only the department (field 0) and the sales count (field 2) are
/// required. The count may carry surrounding whitespace.
pub fn parse_record(record: &StringRecord) -> Result<SalesRecord, RowError> {
    let department = record.get(0).ok_or(RowError::MissingDepartment)?;
    let raw_sales = record.get(2).ok_or(RowError::MissingSalesCount)?;

    let sales = raw_sales
        .trim()
        .parse::<i128>()
        .map_err(|_| RowError::InvalidSalesCount {
            value: raw_sales.to_string(),
        })?;

    Ok(SalesRecord {
        department: department.to_string(),
        date: record.get(1).map(str::to_string),
        sales,
    })
}

fn add_sale(totals: &mut DepartmentTotals, sale: SalesRecord) -> Result<(), RowError> {
    let current = totals.get(&sale.department).copied().unwrap_or(0);
    let Some(total) = current.checked_add(sale.sales) else {
        return Err(RowError::TotalOverflow {
            department: sale.department,
        });
    };
    totals.insert(sale.department, total);
    Ok(())
}

/// Stream a sales CSV and compute per-department totals.
///
/// Row-level problems never fail the run. An error is returned only when
/// the underlying reader itself fails.
pub fn aggregate_sales<R: Read>(reader: R) -> Result<Aggregation> {
    let started = Instant::now();

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut totals = DepartmentTotals::new();
    let mut rows_processed = 0usize;
    let mut rows_skipped = 0usize;
    let mut first_row = true;
    let mut record = StringRecord::new();

    loop {
        let outcome = match csv_reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let is_header = first_row && record.get(0) == Some(DEPARTMENT_HEADER);
                first_row = false;
                if is_header {
                    continue;
                }
                parse_record(&record)
            }
            Err(e) if e.is_io_error() => {
                return Err(e).context("Failed to read sales CSV stream");
            }
            Err(e) => {
                first_row = false;
                Err(RowError::Malformed {
                    reason: e.to_string(),
                })
            }
        };

        rows_processed += 1;
        if let Err(e) = outcome.and_then(|sale| add_sale(&mut totals, sale)) {
            rows_skipped += 1;
            debug!(row = rows_processed, error = %e, "skipping sales row");
        }
    }

    let metrics = ProcessingMetrics {
        processing_time_seconds: started.elapsed().as_secs_f64(),
        total_rows_processed: rows_processed,
        total_departments: totals.len(),
        rows_skipped,
        completed_at: Utc::now(),
    };

    info!(
        rows = metrics.total_rows_processed,
        departments = metrics.total_departments,
        skipped = metrics.rows_skipped,
        seconds = metrics.processing_time_seconds,
        "aggregated sales stream"
    );

    Ok(Aggregation { totals, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Department Name,Date,Number of Sales\n\
                          Electronics,2023-08-01,100\n\
                          Clothing,2023-08-01,200\n\
                          Electronics,2023-08-02,150\n";

    #[test]
    fn test_sample_with_header() {
        let result = aggregate_sales(SAMPLE.as_bytes()).unwrap();
        assert_eq!(result.totals.len(), 2);
        assert_eq!(result.totals["Electronics"], 250);
        assert_eq!(result.totals["Clothing"], 200);
        assert_eq!(result.metrics.total_rows_processed, 3);
        assert_eq!(result.metrics.total_departments, 2);
        assert_eq!(result.metrics.rows_skipped, 0);
        assert!(result.metrics.processing_time_seconds >= 0.0);
    }

    #[test]
    fn test_first_seen_order() {
        let result = aggregate_sales(SAMPLE.as_bytes()).unwrap();
        let keys: Vec<&str> = result.totals.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Electronics", "Clothing"]);
    }

    #[test]
    fn test_without_header_first_row_is_data() {
        let input = "Electronics,2023-08-01,100\nClothing,2023-08-01,200\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.totals["Electronics"], 100);
        assert_eq!(result.totals["Clothing"], 200);
        assert_eq!(result.metrics.total_rows_processed, 2);
    }

    #[test]
    fn test_empty_stream() {
        let result = aggregate_sales("".as_bytes()).unwrap();
        assert!(result.totals.is_empty());
        assert_eq!(result.metrics.total_rows_processed, 0);
        assert_eq!(result.metrics.total_departments, 0);
    }

    #[test]
    fn test_header_only() {
        let input = "Department Name,Date,Number of Sales\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert!(result.totals.is_empty());
        assert_eq!(result.metrics.total_rows_processed, 0);
    }

    #[test]
    fn test_header_detection_is_case_sensitive() {
        let input = "department name,date,number of sales\nToys,2023-08-01,5\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.metrics.total_rows_processed, 2);
        assert_eq!(result.metrics.rows_skipped, 1);
        assert_eq!(result.totals["Toys"], 5);
    }

    #[test]
    fn test_header_only_detected_on_first_row() {
        let input = "Toys,2023-08-01,5\nDepartment Name,Date,Number of Sales\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.metrics.total_rows_processed, 2);
        assert_eq!(result.metrics.rows_skipped, 1);
        assert_eq!(result.totals.len(), 1);
    }

    #[test]
    fn test_non_numeric_count_is_counted_not_summed() {
        let input = "Electronics,2023-08-01,100\nToys,2023-08-01,abc\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.metrics.total_rows_processed, 2);
        assert_eq!(result.metrics.rows_skipped, 1);
        assert!(!result.totals.contains_key("Toys"));
        assert_eq!(result.metrics.total_departments, 1);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let input = "Electronics,2023-08-01,100\nToys\nGarden,2023-08-01\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.metrics.total_rows_processed, 3);
        assert_eq!(result.metrics.rows_skipped, 2);
        assert_eq!(result.totals.len(), 1);
    }

    #[test]
    fn test_negative_and_zero_counts_accepted() {
        let input = "Returns,2023-08-01,-40\nReturns,2023-08-02,10\nIdle,2023-08-01,0\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.totals["Returns"], -30);
        assert_eq!(result.totals["Idle"], 0);
        assert_eq!(result.metrics.total_departments, 2);
    }

    #[test]
    fn test_totals_beyond_i64_are_exact() {
        let input = "Toys,d,9223372036854775807\nToys,d,1\nBig,d,99999999999999999999\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.totals["Toys"], 9_223_372_036_854_775_808);
        assert_eq!(result.totals["Big"], 99_999_999_999_999_999_999);
        assert_eq!(result.metrics.rows_skipped, 0);
    }

    #[test]
    fn test_overflowing_row_is_skipped() {
        let input = format!("Toys,d,{}\nToys,d,1\nToys,d,-5\n", i128::MAX);
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.metrics.total_rows_processed, 3);
        assert_eq!(result.metrics.rows_skipped, 1);
        assert_eq!(result.totals["Toys"], i128::MAX - 5);
    }

    #[test]
    fn test_count_whitespace_tolerated() {
        let input = "Electronics,2023-08-01, 100 \n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.totals["Electronics"], 100);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let input = "Electronics,2023-08-01,100,extra,fields\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.totals["Electronics"], 100);
        assert_eq!(result.metrics.rows_skipped, 0);
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let mut input = b"Electronics,2023-08-01,100\n".to_vec();
        input.extend_from_slice(b"Bad\xff\xfe,2023-08-01,7\n");
        input.extend_from_slice(b"Electronics,2023-08-02,1\n");
        let result = aggregate_sales(input.as_slice()).unwrap();
        assert_eq!(result.metrics.total_rows_processed, 3);
        assert_eq!(result.metrics.rows_skipped, 1);
        assert_eq!(result.totals["Electronics"], 101);
    }

    #[test]
    fn test_quoted_department_with_comma() {
        let input = "\"Home, Garden\",2023-08-01,12\n";
        let result = aggregate_sales(input.as_bytes()).unwrap();
        assert_eq!(result.totals["Home, Garden"], 12);
    }

    #[test]
    fn test_reader_failure_propagates() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk on fire"))
            }
        }
        assert!(aggregate_sales(FailingReader).is_err());
    }

    #[test]
    fn test_parse_record_errors() {
        let missing_count = StringRecord::from(vec!["Toys", "2023-08-01"]);
        assert_eq!(
            parse_record(&missing_count),
            Err(RowError::MissingSalesCount)
        );

        let bad_count = StringRecord::from(vec!["Toys", "2023-08-01", "12x"]);
        assert_eq!(
            parse_record(&bad_count),
            Err(RowError::InvalidSalesCount {
                value: "12x".to_string()
            })
        );

        let empty = StringRecord::new();
        assert_eq!(parse_record(&empty), Err(RowError::MissingDepartment));
    }

    #[test]
    fn test_parse_record_success() {
        let record = StringRecord::from(vec!["Toys", "2023-08-01", "12"]);
        let sale = parse_record(&record).unwrap();
        assert_eq!(sale.department, "Toys");
        assert_eq!(sale.date.as_deref(), Some("2023-08-01"));
        assert_eq!(sale.sales, 12);
    }
}
