//! Excel exporter - stored grids → .xlsx, optionally on top of a template

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::codec::{self, CellValue, SheetCells, XLSX_CONTENT_TYPE};
use crate::error::{ChecklistError, ChecklistResult};
use crate::grid::materialize_sheet;
use crate::store::GridStore;

/// Grid row 0 lands on sheet row 2; row 1 holds the headers.
const DATA_ROW_OFFSET: u32 = 1;

/// Where and how exports are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Base workbook; ignored when the file does not exist
    pub template: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub file_prefix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            template: None,
            output_dir: PathBuf::from("exports"),
            file_prefix: "Checklist".to_string(),
        }
    }
}

/// A finished export on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: usize,
    pub content_type: &'static str,
}

/// Writes the stored worksheets back out as a workbook
pub struct ExcelExporter {
    options: ExportOptions,
}

impl ExcelExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Template sheets (if any) with every stored worksheet laid over them, in output order
    pub fn compose<S: GridStore + ?Sized>(&self, store: &S) -> ChecklistResult<Vec<SheetCells>> {
        let mut book = self.load_base()?;

        for worksheet in store.list_worksheets()? {
            let view = materialize_sheet(store, &worksheet.name)?;

            let idx = match book.iter().position(|s| s.name == worksheet.name) {
                Some(idx) => idx,
                None => {
                    // No template counterpart: the stored headers go in row 1.
                    let mut sheet = SheetCells::new(worksheet.name.clone());
                    for (col, header) in view.headers.iter().enumerate() {
                        if !header.is_empty() {
                            sheet.set(0, col as u32, CellValue::Text(header.clone()));
                        }
                    }
                    book.push(sheet);
                    book.len() - 1
                }
            };

            let sheet = &mut book[idx];
            for (r, row) in view.grid.rows().iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    let (r, c) = (r as u32 + DATA_ROW_OFFSET, c as u32);
                    if value.is_empty() {
                        sheet.clear(r, c);
                    } else {
                        sheet.set(r, c, CellValue::Text(value.clone()));
                    }
                }
            }
            debug!(
                sheet = %worksheet.name,
                rows = view.grid.row_count(),
                cols = view.grid.col_count(),
                "composed worksheet"
            );
        }

        Ok(book)
    }

    /// Compose, serialize and save under a timestamped file name
    pub fn export<S: GridStore + ?Sized>(&self, store: &S) -> ChecklistResult<ExportArtifact> {
        self.export_at(store, Local::now())
    }

    pub fn export_at<S: GridStore + ?Sized>(
        &self,
        store: &S,
        now: DateTime<Local>,
    ) -> ChecklistResult<ExportArtifact> {
        let book = self.compose(store)?;
        let bytes = codec::write_workbook(&book)?;

        let file_name = format!(
            "{}_{}.xlsx",
            self.options.file_prefix,
            now.format("%Y%m%d_%H%M%S")
        );
        let path = self.options.output_dir.join(&file_name);
        write_atomically(&self.options.output_dir, &path, &bytes)?;

        info!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(ExportArtifact {
            path,
            file_name,
            size_bytes: bytes.len(),
            content_type: XLSX_CONTENT_TYPE,
        })
    }

    fn load_base(&self) -> ChecklistResult<Vec<SheetCells>> {
        match &self.options.template {
            Some(template) if template.exists() => {
                debug!(template = %template.display(), "loading export template");
                codec::read_workbook_path(template).map_err(|e| {
                    ChecklistError::Export(format!(
                        "Failed to load template {}: {}",
                        template.display(),
                        e
                    ))
                })
            }
            Some(template) => {
                warn!(
                    template = %template.display(),
                    "template not found, starting from an empty workbook"
                );
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Write to a temp file next to `path`, then rename it into place.
fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> ChecklistResult<()> {
    let export_err = |e: std::io::Error| {
        ChecklistError::Export(format!("Failed to save {}: {}", path.display(), e))
    };

    fs::create_dir_all(dir).map_err(export_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(export_err)?;
    tmp.write_all(bytes).map_err(export_err)?;
    tmp.flush().map_err(export_err)?;
    tmp.persist(path).map_err(|e| export_err(e.error))?;
    Ok(())
}
