//! Excel importer - workbook → worksheets, structures and cells

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::codec::{self, SheetCells};
use crate::error::{ChecklistError, ChecklistResult};
use crate::store::GridStore;
use crate::types::{SheetSnapshot, Structure, Worksheet};

/// Per-worksheet line of an import result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub total_rows: usize,
    pub total_cols: usize,
}

/// What an import wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub worksheets: Vec<SheetSummary>,
    pub cells_written: usize,
}

/// Replaces the whole store with the contents of one workbook
pub struct ExcelImporter {
    sheets: Vec<SheetCells>,
}

impl ExcelImporter {
    /// Read the workbook at `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> ChecklistResult<Self> {
        Ok(Self::from_sheets(codec::read_workbook_path(path)?))
    }

    /// Read an uploaded workbook
    pub fn from_bytes(bytes: &[u8]) -> ChecklistResult<Self> {
        Ok(Self::from_sheets(codec::read_workbook_bytes(bytes)?))
    }

    pub fn from_sheets(sheets: Vec<SheetCells>) -> Self {
        Self { sheets }
    }

    /// Flatten every worksheet, in workbook order
    pub fn snapshots(&self) -> Vec<SheetSnapshot> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(idx, sheet)| flatten_sheet(sheet, idx as u32))
            .collect()
    }

    /// Discard everything in `store` and load this workbook in its place
    pub fn import_into<S: GridStore + ?Sized>(
        &self,
        store: &mut S,
    ) -> ChecklistResult<ImportSummary> {
        let snapshots = self.snapshots();

        store.replace_all(&snapshots).map_err(|e| match e {
            ChecklistError::DuplicateIdentity(_) | ChecklistError::Import(_) => e,
            other => ChecklistError::Import(other.to_string()),
        })?;

        let mut summary = ImportSummary::default();
        for snapshot in &snapshots {
            info!(
                sheet = %snapshot.worksheet.name,
                rows = snapshot.structure.total_rows,
                cols = snapshot.structure.total_cols,
                "loaded worksheet"
            );
            summary.cells_written += snapshot.cell_count();
            summary.worksheets.push(SheetSummary {
                name: snapshot.worksheet.name.clone(),
                total_rows: snapshot.structure.total_rows,
                total_cols: snapshot.structure.total_cols,
            });
        }
        Ok(summary)
    }
}

/// Row 1 becomes the headers, every later row becomes data padded to the header width.
pub fn flatten_sheet(sheet: &SheetCells, display_order: u32) -> SheetSnapshot {
    let width = sheet.width;
    let headers: Vec<String> = (0..width).map(|col| sheet.text(0, col)).collect();
    let rows: Vec<Vec<String>> = (1..sheet.height.max(1))
        .map(|row| (0..width).map(|col| sheet.text(row, col)).collect())
        .collect();

    SheetSnapshot {
        worksheet: Worksheet::new(sheet.name.clone(), display_order),
        structure: Structure::new(sheet.name.clone(), headers, rows.len(), width as usize),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn checks_sheet() -> SheetCells {
        SheetCells::from_rows(
            "Checks",
            vec![vec!["Item", "Status"], vec!["Check power", "Pending"]],
        )
    }

    #[test]
    fn test_flatten_header_and_data() {
        let snapshot = flatten_sheet(&checks_sheet(), 3);
        assert_eq!(snapshot.worksheet, Worksheet::new("Checks", 3));
        assert_eq!(snapshot.structure.headers, vec!["Item", "Status"]);
        assert_eq!(snapshot.structure.total_rows, 1);
        assert_eq!(snapshot.structure.total_cols, 2);
        assert_eq!(snapshot.rows, vec![vec!["Check power", "Pending"]]);
    }

    #[test]
    fn test_flatten_blank_cells_become_empty_strings() {
        let sheet = SheetCells::from_rows("S", vec![vec!["A", "", "C"], vec!["", "x", ""]]);
        let snapshot = flatten_sheet(&sheet, 0);
        assert_eq!(snapshot.structure.headers, vec!["A", "", "C"]);
        assert_eq!(snapshot.rows, vec![vec!["", "x", ""]]);
        assert_eq!(snapshot.cell_count(), 3);
    }

    #[test]
    fn test_flatten_header_only_sheet() {
        let sheet = SheetCells::from_rows("S", vec![vec!["Only", "Headers"]]);
        let snapshot = flatten_sheet(&sheet, 0);
        assert_eq!(snapshot.structure.total_rows, 0);
        assert_eq!(snapshot.structure.total_cols, 2);
        assert!(snapshot.rows.is_empty());
    }

    #[test]
    fn test_flatten_empty_sheet() {
        let snapshot = flatten_sheet(&SheetCells::new("Blank"), 0);
        assert!(snapshot.structure.headers.is_empty());
        assert_eq!(snapshot.structure.total_rows, 0);
        assert_eq!(snapshot.structure.total_cols, 0);
    }

    #[test]
    fn test_snapshots_assign_display_order() {
        let importer = ExcelImporter::from_sheets(vec![
            SheetCells::from_rows("First", vec![vec!["a"]]),
            SheetCells::from_rows("Second", vec![vec!["b"]]),
        ]);
        let orders: Vec<_> = importer
            .snapshots()
            .into_iter()
            .map(|s| (s.worksheet.name, s.worksheet.display_order))
            .collect();
        assert_eq!(
            orders,
            vec![("First".to_string(), 0), ("Second".to_string(), 1)]
        );
    }

    #[test]
    fn test_import_into_summary() {
        let mut store = MemoryStore::new();
        let summary = ExcelImporter::from_sheets(vec![checks_sheet()])
            .import_into(&mut store)
            .unwrap();

        assert_eq!(summary.cells_written, 2);
        assert_eq!(
            summary.worksheets,
            vec![SheetSummary {
                name: "Checks".into(),
                total_rows: 1,
                total_cols: 2
            }]
        );
        assert_eq!(store.cell_count(), 2);
    }

    #[test]
    fn test_import_failure_is_import_error() {
        let mut store = MemoryStore::new();
        store.fail_next_replace_after(0);
        let result = ExcelImporter::from_sheets(vec![checks_sheet()]).import_into(&mut store);
        assert!(matches!(result, Err(ChecklistError::Import(_))));
    }
}
