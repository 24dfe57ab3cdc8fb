//! Report composition and the export surface contract.
//!
//! The session captures what is on screen as a [`ReportRegion`] and hands it
//! to an [`ExportSurface`]. How the region becomes a document is entirely the
//! surface's business.

use std::path::PathBuf;

use budgetgrid_core::cell::Row;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{EmptyResultNotice, GridPage};

/// Title printed at the top of every exported report.
pub const REPORT_TITLE: &str = "Presupuesto General del Proyecto";

/// Frozen copy of one grid's visible page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub total_filtered: usize,
    pub page: usize,
    pub page_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<EmptyResultNotice>,
}

impl GridSnapshot {
    pub fn capture(title: impl Into<String>, headers: &Row, page: &GridPage<'_>) -> Self {
        Self {
            title: title.into(),
            headers: headers.cells().iter().map(|c| c.display_text()).collect(),
            rows: page.rows.iter().map(|r| (*r).clone()).collect(),
            total_filtered: page.total_filtered,
            page: page.page,
            page_count: page.page_count(),
            notice: page.notice,
        }
    }
}

/// Everything an export surface needs to render the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRegion {
    pub title: String,
    /// Display text of the selected master key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_key: Option<String>,
    /// Master grid first, then the visible detail grids.
    pub grids: Vec<GridSnapshot>,
}

impl ReportRegion {
    pub fn row_count(&self) -> usize {
        self.grids.iter().map(|g| g.rows.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Export configuration. Deserializes with defaults for any missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Page margin in inches, all sides.
    pub margin: f64,
    pub file_name: String,
    /// 0.0..=1.0
    pub image_quality: f64,
    /// Render scale; surfaces that print map it to a print scale.
    pub scale: f64,
    pub page_format: PageFormat,
    pub orientation: Orientation,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            margin: 0.5,
            file_name: "Presupuesto_General_Proyecto.xlsx".to_string(),
            image_quality: 0.98,
            scale: 2.0,
            page_format: PageFormat::A4,
            orientation: Orientation::Portrait,
        }
    }
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub grids: usize,
    pub rows: usize,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no workbook loaded; nothing to export")]
    NothingToExport,

    #[error("invalid export options: {0}")]
    InvalidOptions(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export surface failed: {0}")]
    Surface(String),
}

/// Turns a report region into a document.
pub trait ExportSurface {
    fn export(
        &mut self,
        region: &ReportRegion,
        options: &ExportOptions,
    ) -> Result<ExportReceipt, ExportError>;
}
