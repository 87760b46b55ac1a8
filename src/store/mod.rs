//! Persistence for worksheets, structures, cells and users
//!
//! The core never talks to a database directly. Pipelines and the grid
//! materializer take a `GridStore`, so they run unchanged against
//! `SqliteStore` in production and `MemoryStore` in tests.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::ChecklistResult;
use crate::types::{Cell, NewUser, SheetSnapshot, Structure, User, Worksheet};

/// Cell store, structure registry and worksheet registry
pub trait GridStore {
    /// Update the value and timestamp of the cell at the key, inserting it if absent.
    /// No bounds check against the declared structure.
    fn upsert_cell(&mut self, sheet: &str, row: usize, col: usize, value: &str)
        -> ChecklistResult<()>;

    /// All cells stored for a worksheet, in no particular order
    fn get_cells(&self, sheet: &str) -> ChecklistResult<Vec<Cell>>;

    /// Replace the structure stored under `structure.sheet_name`
    fn set_structure(&mut self, structure: &Structure) -> ChecklistResult<()>;

    /// `None` when the worksheet was never imported
    fn get_structure(&self, sheet: &str) -> ChecklistResult<Option<Structure>>;

    /// Worksheets by ascending display order
    fn list_worksheets(&self) -> ChecklistResult<Vec<Worksheet>>;

    /// Fails with `DuplicateIdentity` if the name is taken
    fn register_worksheet(&mut self, worksheet: &Worksheet) -> ChecklistResult<()>;

    /// Discard every worksheet, structure and cell, then write `sheets`.
    /// Either all of it happens or none of it does.
    fn replace_all(&mut self, sheets: &[SheetSnapshot]) -> ChecklistResult<()>;
}

/// Account storage. Passwords arrive already hashed.
pub trait UserStore {
    /// Returns the new id. Fails with `DuplicateIdentity` if the username is taken.
    fn insert_user(&mut self, user: &NewUser, password_hash: &str) -> ChecklistResult<i64>;

    fn find_user(&self, username: &str) -> ChecklistResult<Option<User>>;

    fn list_users(&self) -> ChecklistResult<Vec<User>>;

    /// Returns whether a row was removed
    fn delete_user(&mut self, id: i64) -> ChecklistResult<bool>;
}
