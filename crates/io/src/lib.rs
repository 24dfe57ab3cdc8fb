// Workbook I/O: decoding, sources and report export

pub mod error;
pub mod report_xlsx;
pub mod source;
pub mod xlsx;

pub use error::ImportError;
pub use report_xlsx::XlsxReportSurface;
pub use source::WorkbookSource;
pub use xlsx::{parse, ImportReport, SheetStats};
