//! Folder processing: read every invoice XML in a directory, extract one
//! record per document, filter by issue date, and fold the totals.
//!
//! A document that cannot be read, parsed, or added to the running totals
//! is logged and skipped; it never aborts the batch. Only failing to list
//! the directory is an error.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use comprobante::batch::{BatchConfig, DateRange, process_directory};
//!
//! let config = BatchConfig {
//!     date_range: Some(DateRange::days(
//!         NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
//!     )),
//!     ..Default::default()
//! };
//! let report = process_directory("facturas/", &config).unwrap();
//! println!("{} invoices, IVA {}", report.aggregate.invoice_count, report.aggregate.tax_total);
//! ```

mod config;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::{Aggregate, ComprobanteError, InvoiceRecord};
use crate::xml;

pub use config::{BatchConfig, DateRange};

/// An invoice record together with the file it came from.
#[derive(Debug, Clone)]
pub struct ProcessedInvoice {
    pub path: PathBuf,
    pub file_name: String,
    pub record: InvoiceRecord,
}

/// A file that was left out of the batch, and why. Date-filtered files are
/// not skipped files.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: ComprobanteError,
}

/// Outcome of processing a folder.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Invoices that passed the date filter, in processing order.
    pub invoices: Vec<ProcessedInvoice>,
    /// Totals over `invoices`.
    pub aggregate: Aggregate,
    /// Files that could not be read, parsed, or totaled.
    pub skipped: Vec<SkippedFile>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}

/// Read, parse, and summarize a single invoice file.
pub fn process_file(path: impl AsRef<Path>) -> Result<ProcessedInvoice, ComprobanteError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| ComprobanteError::io(path, e))?;
    let record = xml::parse_bytes(&bytes)?.summarize()?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ProcessedInvoice {
        path: path.to_path_buf(),
        file_name,
        record,
    })
}

/// Files directly inside `dir` with the configured extension.
pub fn list_inputs(dir: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>, ComprobanteError> {
    let entries = fs::read_dir(dir).map_err(|e| ComprobanteError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ComprobanteError::io(dir, e))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&config.extension));
        if is_file && matches {
            paths.push(path);
        }
    }
    if config.sort_inputs {
        paths.sort();
    }
    Ok(paths)
}

/// Process every invoice file in `dir`.
pub fn process_directory(
    dir: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<BatchReport, ComprobanteError> {
    let dir = dir.as_ref();
    let paths = list_inputs(dir, config)?;
    debug!(dir = %dir.display(), files = paths.len(), "processing invoice folder");

    let mut report = BatchReport::default();
    let range = config.date_range.unwrap_or_default();
    for path in paths {
        let invoice = match process_file(&path) {
            Ok(invoice) => invoice,
            Err(error) => {
                warn!(file = %path.display(), %error, "skipping invoice file");
                report.skipped.push(SkippedFile { path, error });
                continue;
            }
        };
        if !range.contains(invoice.record.issue_date) {
            debug!(file = %invoice.file_name, "outside date range");
            continue;
        }
        match report.aggregate.add(&invoice.record) {
            Ok(()) => report.invoices.push(invoice),
            Err(error) => {
                warn!(file = %path.display(), %error, "skipping invoice that overflows totals");
                report.skipped.push(SkippedFile { path, error });
            }
        }
    }

    info!(
        invoices = report.aggregate.invoice_count,
        skipped = report.skipped.len(),
        tax_total = %report.aggregate.tax_total,
        "invoice folder processed"
    );
    Ok(report)
}
