//! Excel import/export
//!
//! - Import: .xlsx → worksheets, structures and cells (full replace)
//! - Export: stored grids → .xlsx, optionally on top of a template workbook

pub mod codec;
mod exporter;
mod importer;

pub use codec::{CellValue, SheetCells, XLSX_CONTENT_TYPE};
pub use exporter::{ExcelExporter, ExportArtifact, ExportOptions};
pub use importer::{flatten_sheet, ExcelImporter, ImportSummary, SheetSummary};
