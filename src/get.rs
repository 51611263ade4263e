//! Stored summary retrieval by result ID.
//!
//! Used by the `sales-summary get` CLI command. The HTTP server reads the
//! same store through `GET /results/{result_id}`.
//!
//! # Usage
//!
//! ```bash
//! # Print the raw summary CSV
//! sales-summary get summary_0192f0c4-....csv
//!
//! # Print parsed per-department totals
//! sales-summary get summary_0192f0c4-....csv --totals
//! ```

use anyhow::{bail, Result};

use sales_summary_core::store::ResultStore;
use sales_summary_core::summary::parse_summary;

use crate::config::Config;
use crate::file_store::LocalFileStore;

/// Read a stored summary, failing if it does not exist.
pub async fn get_summary(store: &dyn ResultStore, id: &str) -> Result<String> {
    match store.get(id).await? {
        Some(content) => Ok(content),
        None => bail!("result not found: {}", id),
    }
}

/// CLI entry point for `sales-summary get <id>`.
pub async fn run_get(config: &Config, id: &str, totals: bool) -> Result<()> {
    let store = LocalFileStore::from_config(config)?;
    let content = get_summary(&store, id).await?;

    if !totals {
        print!("{}", content);
        return Ok(());
    }

    let parsed = parse_summary(&content)?;
    println!("--- {} ---", id);
    for (department, total) in &parsed {
        println!("{:<30} {:>12}", department, total);
    }
    println!("departments: {}", parsed.len());
    match parsed.values().try_fold(0i128, |acc, v| acc.checked_add(*v)) {
        Some(sum) => println!("total sales: {}", sum),
        None => println!("total sales: overflow"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_summary_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_get_summary_found() {
        let store = InMemoryStore::new();
        store.save("a.csv", "Department Name,Total Number of Sales\n").await.unwrap();
        let content = get_summary(&store, "a.csv").await.unwrap();
        assert!(content.starts_with("Department Name"));
    }

    #[tokio::test]
    async fn test_get_summary_missing() {
        let store = InMemoryStore::new();
        let err = get_summary(&store, "missing.csv").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
