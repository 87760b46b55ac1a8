use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChecklistError;

//==============================================================================
// Worksheet Model
//==============================================================================

/// A named tab of the imported workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,
    /// Tab position, 0-based, in workbook order
    pub display_order: u32,
}

impl Worksheet {
    pub fn new(name: impl Into<String>, display_order: u32) -> Self {
        Self {
            name: name.into(),
            display_order,
        }
    }
}

/// Declared shape of a worksheet's data region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub total_rows: usize,
    pub total_cols: usize,
}

impl Structure {
    pub fn new(
        sheet_name: impl Into<String>,
        headers: Vec<String>,
        total_rows: usize,
        total_cols: usize,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            headers,
            total_rows,
            total_cols,
        }
    }

    /// Whether (row, col) falls inside the declared data region
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.total_rows && col < self.total_cols
    }
}

/// One stored grid value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub sheet_name: String,
    pub row: usize,
    pub col: usize,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Everything an import writes for one worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSnapshot {
    pub worksheet: Worksheet,
    pub structure: Structure,
    /// Data rows, each exactly `structure.total_cols` wide
    pub rows: Vec<Vec<String>>,
}

impl SheetSnapshot {
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

//==============================================================================
// Dense Grid
//==============================================================================

/// Fully populated rows x cols array of cell values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// A grid of empty strings. Either dimension being zero yields no rows.
    pub fn blank(rows: usize, cols: usize) -> Self {
        if rows == 0 || cols == 0 {
            return Self::default();
        }
        Self {
            rows: vec![vec![String::new(); cols]; rows],
        }
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Returns false when (row, col) is outside the grid
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }
}

/// What the editor shows for one worksheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetView {
    pub name: String,
    pub headers: Vec<String>,
    pub grid: Grid,
}

//==============================================================================
// Users
//==============================================================================

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Admin satisfies every requirement; User satisfies only User.
    pub fn satisfies(&self, required: Role) -> bool {
        matches!((self, required), (Role::Admin, _) | (Role::User, Role::User))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ChecklistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(ChecklistError::Config(format!("Unknown role '{}'", other))),
        }
    }
}

/// Stored account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub department: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

/// Account fields before the password is hashed and an id assigned
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub password: String,
    pub role: Role,
}
