//! Checklist Editor - spreadsheet-backed checklists with a sparse cell store
//!
//! Imports an Excel workbook into a relational store, lets callers view and
//! edit each worksheet's grid cell by cell, and exports the edited grids back
//! to an .xlsx file.
//!
//! # Features
//!
//! - Full-replace import: worksheets, header rows and every data cell
//! - Sparse cell store with upsert semantics, SQLite or in-memory
//! - Dense grid materialization bounded by the imported structure
//! - Export onto an optional template workbook, timestamped file names
//! - User accounts with Argon2 password hashes and admin/user roles
//!
//! # Example
//!
//! ```no_run
//! use checklist_editor::excel::{ExcelImporter, ExcelExporter, ExportOptions};
//! use checklist_editor::grid::materialize;
//! use checklist_editor::store::{GridStore, SqliteStore};
//!
//! let mut store = SqliteStore::open("checklist.db")?;
//! ExcelImporter::from_path("checklist.xlsx")?.import_into(&mut store)?;
//!
//! store.upsert_cell("Checks", 0, 1, "Done")?;
//! println!("{:?}", materialize(&store, "Checks")?);
//!
//! let artifact = ExcelExporter::new(ExportOptions::default()).export(&store)?;
//! println!("{}", artifact.path.display());
//! # Ok::<(), checklist_editor::error::ChecklistError>(())
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod grid;
pub mod report;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{ChecklistError, ChecklistResult};
pub use types::{Cell, Grid, Role, SheetView, Structure, Worksheet};
