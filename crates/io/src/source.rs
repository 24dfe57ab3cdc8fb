//! Where a workbook comes from: a local file or a URL.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use budgetgrid_engine::workbook::Workbook;

use crate::error::ImportError;
use crate::xlsx::{self, ImportReport};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbookSource {
    Path(PathBuf),
    Url(String),
}

impl WorkbookSource {
    /// Interpret a configured location: `http://` and `https://` are URLs,
    /// anything else is a filesystem path.
    pub fn from_location(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            WorkbookSource::Url(trimmed.to_string())
        } else {
            WorkbookSource::Path(PathBuf::from(trimmed))
        }
    }

    /// Fetch the raw workbook bytes.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ImportError> {
        match self {
            WorkbookSource::Path(path) => Ok(std::fs::read(path)?),
            WorkbookSource::Url(url) => fetch(url),
        }
    }

    /// Fetch and decode.
    pub fn load(&self) -> Result<(Workbook, ImportReport), ImportError> {
        log::info!("loading workbook from {}", self);
        let bytes = self.read_bytes()?;
        xlsx::parse(&bytes)
    }
}

impl fmt::Display for WorkbookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkbookSource::Path(path) => write!(f, "{}", path.display()),
            WorkbookSource::Url(url) => f.write_str(url),
        }
    }
}

fn fetch(url: &str) -> Result<Vec<u8>, ImportError> {
    let fetch_error = |reason: String| ImportError::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("budgetgrid/{}", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| fetch_error(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status.as_u16())));
    }

    let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
    log::debug!("fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}
