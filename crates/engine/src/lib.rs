//! Tabular data engine: sheets, cross-sheet filtering, the grid
//! presentation pipeline and the report session that ties them together.

pub mod collate;
pub mod events;
pub mod filter;
pub mod relate;
pub mod report;
pub mod session;
pub mod sheet;
pub mod workbook;

pub use filter::{EmptyResultNotice, GridPage, GridViewState, SortDirection, SortState};
pub use report::{ExportError, ExportOptions, ExportReceipt, ExportSurface, ReportRegion};
pub use session::{DetailGrid, GridId, MissingSheetWarning, ReportSession, SheetRoles};
pub use sheet::SheetTable;
pub use workbook::Workbook;
