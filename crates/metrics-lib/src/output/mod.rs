//! Output writers for processed records
//!
//! Both writers take the same ordered slice, so the JSON array and the
//! spreadsheet rows always describe the same records in the same order.

mod json;
mod xlsx;

pub use json::write_json;
pub use xlsx::{write_xlsx, SHEET_NAME};

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build spreadsheet: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
