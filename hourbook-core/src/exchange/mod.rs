//! Moving entries in and out of the log as text: CSV export and import, and
//! a plain-text summary for messaging.

mod csv_export;
mod csv_import;
mod share;

use thiserror::Error;

pub use csv_export::{export_csv, export_file_name, CSV_HEADER};
pub use csv_import::{parse_import, ImportOutcome};
pub use share::{share_text, ShareLabels};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("there are no entries to export")]
    NothingToExport,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file has no header or no data rows")]
    Empty,
    #[error("required column `{0}` is missing")]
    MissingColumn(&'static str),
    #[error("failed to read header row: {0}")]
    Header(#[from] csv::Error),
}
