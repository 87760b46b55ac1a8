use std::collections::{BTreeMap, HashSet};

use chrono::Utc;

use super::{GridStore, UserStore};
use crate::error::{ChecklistError, ChecklistResult};
use crate::types::{Cell, NewUser, SheetSnapshot, Structure, User, Worksheet};

type CellKey = (String, usize, usize);

#[derive(Debug, Clone, Default)]
struct GridState {
    worksheets: Vec<Worksheet>,
    structures: BTreeMap<String, Structure>,
    cells: BTreeMap<CellKey, Cell>,
}

/// In-process store used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    grid: GridState,
    users: Vec<User>,
    next_user_id: i64,
    /// When set, `replace_all` fails after staging this many sheets
    fail_replace_after: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `replace_all` fail partway through, after `sheets` sheets.
    pub fn fail_next_replace_after(&mut self, sheets: usize) {
        self.fail_replace_after = Some(sheets);
    }

    /// Number of stored cells across every worksheet
    pub fn cell_count(&self) -> usize {
        self.grid.cells.len()
    }
}

impl GridStore for MemoryStore {
    fn upsert_cell(
        &mut self,
        sheet: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> ChecklistResult<()> {
        let cell = Cell {
            sheet_name: sheet.to_string(),
            row,
            col,
            value: value.to_string(),
            updated_at: Utc::now(),
        };
        self.grid.cells.insert((sheet.to_string(), row, col), cell);
        Ok(())
    }

    fn get_cells(&self, sheet: &str) -> ChecklistResult<Vec<Cell>> {
        Ok(self
            .grid
            .cells
            .values()
            .filter(|c| c.sheet_name == sheet)
            .cloned()
            .collect())
    }

    fn set_structure(&mut self, structure: &Structure) -> ChecklistResult<()> {
        self.grid
            .structures
            .insert(structure.sheet_name.clone(), structure.clone());
        Ok(())
    }

    fn get_structure(&self, sheet: &str) -> ChecklistResult<Option<Structure>> {
        Ok(self.grid.structures.get(sheet).cloned())
    }

    fn list_worksheets(&self) -> ChecklistResult<Vec<Worksheet>> {
        let mut sheets = self.grid.worksheets.clone();
        sheets.sort_by_key(|w| w.display_order);
        Ok(sheets)
    }

    fn register_worksheet(&mut self, worksheet: &Worksheet) -> ChecklistResult<()> {
        if self.grid.worksheets.iter().any(|w| w.name == worksheet.name) {
            return Err(ChecklistError::DuplicateIdentity(format!(
                "worksheet '{}'",
                worksheet.name
            )));
        }
        self.grid.worksheets.push(worksheet.clone());
        Ok(())
    }

    fn replace_all(&mut self, sheets: &[SheetSnapshot]) -> ChecklistResult<()> {
        // Build the new state off to the side and swap it in at the end.
        let fail_after = self.fail_replace_after.take();
        let mut staged = GridState::default();
        let mut seen = HashSet::new();
        let now = Utc::now();

        for (idx, snapshot) in sheets.iter().enumerate() {
            if fail_after == Some(idx) {
                return Err(ChecklistError::Import(format!(
                    "simulated failure before sheet '{}'",
                    snapshot.worksheet.name
                )));
            }
            let name = &snapshot.worksheet.name;
            if !seen.insert(name.clone()) {
                return Err(ChecklistError::DuplicateIdentity(format!(
                    "worksheet '{}'",
                    name
                )));
            }
            staged.worksheets.push(snapshot.worksheet.clone());
            staged
                .structures
                .insert(name.clone(), snapshot.structure.clone());
            for (row, values) in snapshot.rows.iter().enumerate() {
                for (col, value) in values.iter().enumerate() {
                    staged.cells.insert(
                        (name.clone(), row, col),
                        Cell {
                            sheet_name: name.clone(),
                            row,
                            col,
                            value: value.clone(),
                            updated_at: now,
                        },
                    );
                }
            }
        }

        self.grid = staged;
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn insert_user(&mut self, user: &NewUser, password_hash: &str) -> ChecklistResult<i64> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(ChecklistError::DuplicateIdentity(format!(
                "user '{}'",
                user.username
            )));
        }
        self.next_user_id += 1;
        let id = self.next_user_id;
        self.users.push(User {
            id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            department: user.department.clone(),
            password_hash: password_hash.to_string(),
            role: user.role,
        });
        Ok(id)
    }

    fn find_user(&self, username: &str) -> ChecklistResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    fn list_users(&self) -> ChecklistResult<Vec<User>> {
        Ok(self.users.clone())
    }

    fn delete_user(&mut self, id: i64) -> ChecklistResult<bool> {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        Ok(self.users.len() != before)
    }
}
