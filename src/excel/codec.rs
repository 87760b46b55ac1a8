//! Workbook codec: .xlsx ↔ sparse typed sheets
//!
//! Reading goes through calamine, writing through rust_xlsxwriter. Nothing
//! here knows about the store; pipelines sit on top.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::error::{ChecklistError, ChecklistResult};

/// MIME type of generated workbooks
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel's last column index (XFD)
const MAX_COL: u32 = 16_383;

/// Excel's last row index (row 1048576)
const MAX_ROW: u32 = 1_048_575;

/// A non-empty cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// String form stored by the editor
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
        }
    }

    /// `None` for empty cells
    fn from_data(cell: &Data) -> Option<Self> {
        match cell {
            Data::Empty => None,
            Data::String(s) if s.is_empty() => None,
            Data::String(s) => Some(CellValue::Text(s.clone())),
            Data::Float(f) => Some(CellValue::Number(*f)),
            Data::Int(i) => Some(CellValue::Number(*i as f64)),
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            Data::DateTime(dt) => Some(CellValue::Text(match dt.as_datetime() {
                Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => dt.as_f64().to_string(),
            })),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
            Data::Error(e) => Some(CellValue::Text(e.to_string())),
        }
    }
}

/// One worksheet as a sparse map of 0-based (row, col) → value.
/// `height`/`width` measure from A1 to the last used cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetCells {
    pub name: String,
    pub height: u32,
    pub width: u32,
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl SheetCells {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            height: 0,
            width: 0,
            cells: BTreeMap::new(),
        }
    }

    /// Build from rows of text, row 0 first. Empty strings are left blank.
    pub fn from_rows<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sheet = Self::new(name);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                let value = value.into();
                if !value.is_empty() {
                    sheet.set(r as u32, c as u32, CellValue::Text(value));
                }
            }
        }
        sheet
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Cell text, empty string when blank
    pub fn text(&self, row: u32, col: u32) -> String {
        self.get(row, col).map(CellValue::to_text).unwrap_or_default()
    }

    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.height = self.height.max(row + 1);
        self.width = self.width.max(col + 1);
        self.cells.insert((row, col), value);
    }

    /// Blank a cell. Dimensions do not shrink.
    pub fn clear(&mut self, row: u32, col: u32) {
        self.cells.remove(&(row, col));
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u32), &CellValue)> {
        self.cells.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let mut sheet = Self::new(name);
        let Some((start_row, start_col)) = range.start() else {
            return sheet;
        };
        for (r, c, data) in range.used_cells() {
            if let Some(value) = CellValue::from_data(data) {
                sheet.set(start_row + r as u32, start_col + c as u32, value);
            }
        }
        // Formatted-but-empty trailing cells still count toward the sheet's extent.
        if let Some((end_row, end_col)) = range.end() {
            sheet.height = sheet.height.max(end_row + 1);
            sheet.width = sheet.width.max(end_col + 1);
        }
        sheet
    }
}

/// Read every worksheet of the .xlsx file at `path`, in workbook order
pub fn read_workbook_path<P: AsRef<Path>>(path: P) -> ChecklistResult<Vec<SheetCells>> {
    let path = path.as_ref();
    let workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        ChecklistError::Import(format!("Failed to open Excel file {}: {}", path.display(), e))
    })?;
    read_sheets(workbook)
}

/// Read every worksheet of an in-memory .xlsx file
pub fn read_workbook_bytes(bytes: &[u8]) -> ChecklistResult<Vec<SheetCells>> {
    let workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ChecklistError::Import(format!("Failed to read Excel data: {}", e)))?;
    read_sheets(workbook)
}

fn read_sheets<RS: Read + Seek>(mut workbook: Xlsx<RS>) -> ChecklistResult<Vec<SheetCells>> {
    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            ChecklistError::Import(format!("Failed to read worksheet '{}': {}", name, e))
        })?;
        let sheet = SheetCells::from_range(&name, &range);
        debug!(sheet = %name, rows = sheet.height, cols = sheet.width, "read worksheet");
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// Serialize sheets, in order, to .xlsx bytes
pub fn write_workbook(sheets: &[SheetCells]) -> ChecklistResult<Vec<u8>> {
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(|e| {
            ChecklistError::Export(format!("Invalid worksheet name '{}': {}", sheet.name, e))
        })?;

        for (&(row, col), value) in sheet.cells() {
            if col > MAX_COL {
                return Err(ChecklistError::Export(format!(
                    "Column {} out of range in worksheet '{}'",
                    col, sheet.name
                )));
            }
            let col = col as u16;
            let written = match value {
                CellValue::Text(s) => worksheet.write_string(row, col, s),
                CellValue::Number(n) => worksheet.write_number(row, col, *n),
                CellValue::Bool(b) => worksheet.write_boolean(row, col, *b),
            };
            written.map_err(|e| {
                ChecklistError::Export(format!(
                    "Failed to write {}!{}: {}",
                    sheet.name,
                    cell_reference(row, col as u32),
                    e
                ))
            })?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ChecklistError::Export(format!("Failed to build Excel file: {}", e)))
}

/// Convert column index to Excel column letter (0→A, 1→B, 25→Z, 26→AA, etc.)
pub fn column_letter(n: u32) -> String {
    let mut result = String::new();
    let mut num = n;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

/// A1-style reference for a 0-based sheet position
pub fn cell_reference(row: u32, col: u32) -> String {
    format!("{}{}", column_letter(col), u64::from(row) + 1)
}

/// Like [`cell_reference`], but `None` past Excel's last row or column
pub fn checked_cell_reference(row: usize, col: usize) -> Option<String> {
    let row = u32::try_from(row).ok().filter(|r| *r <= MAX_ROW)?;
    let col = u32::try_from(col).ok().filter(|c| *c <= MAX_COL)?;
    Some(cell_reference(row, col))
}
