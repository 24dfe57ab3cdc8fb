use thiserror::Error;

/// Why a workbook could not be loaded.
///
/// Any of these leaves the previously loaded workbook (if any) in place.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("workbook is empty (0 bytes)")]
    Empty,

    #[error("not a recognized workbook: {0}")]
    Unrecognized(String),

    #[error("failed to read sheet '{name}': {reason}")]
    Sheet { name: String, reason: String },

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}
