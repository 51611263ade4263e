//! Summary CSV encoding.
//!
//! A summary file has a fixed two-column header followed by one row per
//! department, in the iteration order of the [`DepartmentTotals`] it was
//! built from:
//!
//! Rows end in `\r\n`.
//!
//! ```text
//! Department Name,Total Number of Sales
//! Electronics,250
//! Clothing,200
//! ```

use anyhow::{bail, Context, Result};
use csv::StringRecord;

use crate::models::{DepartmentTotals, SUMMARY_HEADER};

/// Encode department totals as a fully materialized summary CSV.
pub fn encode_summary(totals: &DepartmentTotals) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(SUMMARY_HEADER)?;
    for (department, total) in totals {
        writer.write_record([department.as_str(), total.to_string().as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush summary CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("Summary CSV is not valid UTF-8")
}

/// Parse a summary CSV back into department totals.
///
/// A leading header row is skipped. Repeated departments are summed, so
/// the result equals re-aggregating the summary rows. Unlike the input
/// aggregator this is strict: a row without a valid integer total is an
/// error, since summaries are only ever produced by [`encode_summary`].
pub fn parse_summary(text: &str) -> Result<DepartmentTotals> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut totals = DepartmentTotals::new();
    let mut record = StringRecord::new();
    let mut line = 0usize;

    while reader
        .read_record(&mut record)
        .context("Failed to read summary CSV")?
    {
        line += 1;
        if line == 1 && record.get(0) == Some(SUMMARY_HEADER[0]) {
            continue;
        }

        let (Some(department), Some(raw_total)) = (record.get(0), record.get(1)) else {
            bail!("summary row {} has fewer than two fields", line);
        };
        let value: i128 = raw_total
            .trim()
            .parse()
            .with_context(|| format!("summary row {} has invalid total: {:?}", line, raw_total))?;

        let total = totals.entry(department.to_string()).or_insert(0);
        *total = total
            .checked_add(value)
            .with_context(|| format!("summary total for {:?} overflows", department))?;
    }

    Ok(totals)
}
