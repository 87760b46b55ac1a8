// SQLite-backed store. One connection per call; nothing is held between calls.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use super::{GridStore, UserStore};
use crate::error::{ChecklistError, ChecklistResult};
use crate::types::{Cell, NewUser, Role, SheetSnapshot, Structure, User, Worksheet};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS worksheets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet_name TEXT UNIQUE NOT NULL,
    display_order INTEGER NOT NULL,
    uploaded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS checklist_structure (
    sheet_name TEXT PRIMARY KEY,
    headers TEXT NOT NULL,           -- JSON array of header labels
    total_rows INTEGER NOT NULL,
    total_cols INTEGER NOT NULL,
    uploaded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS checklist_data (
    sheet_name TEXT NOT NULL,
    row_index INTEGER NOT NULL,
    col_index INTEGER NOT NULL,
    value TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL,
    PRIMARY KEY (sheet_name, row_index, col_index)
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    department TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL
);
"#;

const UPSERT_CELL: &str = "INSERT INTO checklist_data (sheet_name, row_index, col_index, value, updated_at) \
     VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT(sheet_name, row_index, col_index) \
     DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

const UPSERT_STRUCTURE: &str = "INSERT INTO checklist_structure (sheet_name, headers, total_rows, total_cols, uploaded_at) \
     VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT(sheet_name) \
     DO UPDATE SET headers = excluded.headers, total_rows = excluded.total_rows, \
                   total_cols = excluded.total_cols, uploaded_at = excluded.uploaded_at";

const INSERT_WORKSHEET: &str =
    "INSERT INTO worksheets (sheet_name, display_order, uploaded_at) VALUES (?1, ?2, ?3)";

/// Store backed by a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> ChecklistResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %store.path.display(), "schema ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> ChecklistResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}

/// Map a UNIQUE or PRIMARY KEY violation to `DuplicateIdentity`, pass anything
/// else (including NOT NULL and CHECK failures) through.
fn unique_violation(err: rusqlite::Error, what: String) -> ChecklistError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                ) =>
        {
            ChecklistError::DuplicateIdentity(what)
        }
        other => ChecklistError::Storage(other),
    }
}

fn insert_structure(
    conn: &Connection,
    structure: &Structure,
    now: DateTime<Utc>,
) -> ChecklistResult<()> {
    let headers = serde_json::to_string(&structure.headers)?;
    conn.execute(
        UPSERT_STRUCTURE,
        params![
            structure.sheet_name,
            headers,
            structure.total_rows as i64,
            structure.total_cols as i64,
            now
        ],
    )?;
    Ok(())
}

fn insert_worksheet(
    conn: &Connection,
    worksheet: &Worksheet,
    now: DateTime<Utc>,
) -> ChecklistResult<()> {
    conn.execute(
        INSERT_WORKSHEET,
        params![worksheet.name, worksheet.display_order, now],
    )
    .map_err(|e| unique_violation(e, format!("worksheet '{}'", worksheet.name)))?;
    Ok(())
}

fn structure_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(User, String)> {
    let role: String = row.get(6)?;
    Ok((
        User {
            id: row.get(0)?,
            username: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            department: row.get(4)?,
            password_hash: row.get(5)?,
            role: Role::User,
        },
        role,
    ))
}

fn with_role((mut user, role): (User, String)) -> ChecklistResult<User> {
    user.role = role.parse()?;
    Ok(user)
}

const SELECT_USER: &str =
    "SELECT id, username, name, email, department, password_hash, role FROM users";

impl GridStore for SqliteStore {
    fn upsert_cell(
        &mut self,
        sheet: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> ChecklistResult<()> {
        let conn = self.connect()?;
        conn.execute(
            UPSERT_CELL,
            params![sheet, row as i64, col as i64, value, Utc::now()],
        )?;
        Ok(())
    }

    fn get_cells(&self, sheet: &str) -> ChecklistResult<Vec<Cell>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT row_index, col_index, value, updated_at FROM checklist_data WHERE sheet_name = ?1",
        )?;
        let cells = stmt
            .query_map(params![sheet], |row| {
                Ok(Cell {
                    sheet_name: sheet.to_string(),
                    row: row.get::<_, i64>(0)? as usize,
                    col: row.get::<_, i64>(1)? as usize,
                    value: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cells)
    }

    fn set_structure(&mut self, structure: &Structure) -> ChecklistResult<()> {
        let conn = self.connect()?;
        insert_structure(&conn, structure, Utc::now())
    }

    fn get_structure(&self, sheet: &str) -> ChecklistResult<Option<Structure>> {
        let conn = self.connect()?;
        let found = conn
            .query_row(
                "SELECT sheet_name, headers, total_rows, total_cols FROM checklist_structure WHERE sheet_name = ?1",
                params![sheet],
                structure_from_row,
            )
            .optional()?;

        match found {
            Some((sheet_name, headers, total_rows, total_cols)) => Ok(Some(Structure {
                sheet_name,
                headers: serde_json::from_str(&headers)?,
                total_rows: total_rows.max(0) as usize,
                total_cols: total_cols.max(0) as usize,
            })),
            None => Ok(None),
        }
    }

    fn list_worksheets(&self) -> ChecklistResult<Vec<Worksheet>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT sheet_name, display_order FROM worksheets ORDER BY display_order, id",
        )?;
        let sheets = stmt
            .query_map([], |row| Ok(Worksheet::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sheets)
    }

    fn register_worksheet(&mut self, worksheet: &Worksheet) -> ChecklistResult<()> {
        let conn = self.connect()?;
        insert_worksheet(&conn, worksheet, Utc::now())
    }

    fn replace_all(&mut self, sheets: &[SheetSnapshot]) -> ChecklistResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        tx.execute("DELETE FROM checklist_data", [])?;
        tx.execute("DELETE FROM checklist_structure", [])?;
        tx.execute("DELETE FROM worksheets", [])?;

        for snapshot in sheets {
            insert_worksheet(&tx, &snapshot.worksheet, now)?;
            insert_structure(&tx, &snapshot.structure, now)?;

            let mut stmt = tx.prepare_cached(UPSERT_CELL)?;
            for (row, values) in snapshot.rows.iter().enumerate() {
                for (col, value) in values.iter().enumerate() {
                    stmt.execute(params![
                        snapshot.worksheet.name,
                        row as i64,
                        col as i64,
                        value,
                        now
                    ])?;
                }
            }
            debug!(
                sheet = %snapshot.worksheet.name,
                cells = snapshot.cell_count(),
                "staged worksheet"
            );
        }

        // Dropping `tx` on an early return rolls everything back.
        tx.commit()?;
        Ok(())
    }
}

impl UserStore for SqliteStore {
    fn insert_user(&mut self, user: &NewUser, password_hash: &str) -> ChecklistResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (username, name, email, department, password_hash, role) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.username,
                user.name,
                user.email,
                user.department,
                password_hash,
                user.role.as_str()
            ],
        )
        .map_err(|e| unique_violation(e, format!("user '{}'", user.username)))?;
        Ok(conn.last_insert_rowid())
    }

    fn find_user(&self, username: &str) -> ChecklistResult<Option<User>> {
        let conn = self.connect()?;
        let found = conn
            .query_row(
                &format!("{} WHERE username = ?1", SELECT_USER),
                params![username],
                user_from_row,
            )
            .optional()?;
        found.map(with_role).transpose()
    }

    fn list_users(&self) -> ChecklistResult<Vec<User>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_USER))?;
        let rows = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(with_role).collect()
    }

    fn delete_user(&mut self, id: i64) -> ChecklistResult<bool> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("checklist.db")).unwrap();
        (dir, store)
    }

    fn snapshot(name: &str, order: u32, rows: Vec<Vec<&str>>) -> SheetSnapshot {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        SheetSnapshot {
            worksheet: Worksheet::new(name, order),
            structure: Structure::new(
                name,
                (0..cols).map(|c| format!("H{}", c)).collect(),
                rows.len(),
                cols,
            ),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    #[test]
    fn test_open_is_idempotent() {
        let (dir, _store) = open_temp();
        let again = SqliteStore::open(dir.path().join("checklist.db"));
        assert!(again.is_ok());
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let (_dir, mut store) = open_temp();
        store.upsert_cell("Checks", 0, 1, "Pending").unwrap();
        store.upsert_cell("Checks", 0, 1, "Done").unwrap();
        store.upsert_cell("Checks", 0, 1, "Done").unwrap();

        let cells = store.get_cells("Checks").unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].value, "Done");
        assert_eq!((cells[0].row, cells[0].col), (0, 1));
    }

    #[test]
    fn test_structure_roundtrip() {
        let (_dir, mut store) = open_temp();
        let structure = Structure::new("Checks", vec!["Item".into(), "Status".into()], 1, 2);
        store.set_structure(&structure).unwrap();
        assert_eq!(store.get_structure("Checks").unwrap(), Some(structure));
        assert_eq!(store.get_structure("Missing").unwrap(), None);
    }

    #[test]
    fn test_set_structure_replaces() {
        let (_dir, mut store) = open_temp();
        store
            .set_structure(&Structure::new("S", vec!["a".into()], 5, 1))
            .unwrap();
        store
            .set_structure(&Structure::new("S", vec!["a".into(), "b".into()], 2, 2))
            .unwrap();
        let s = store.get_structure("S").unwrap().unwrap();
        assert_eq!((s.total_rows, s.total_cols), (2, 2));
    }

    #[test]
    fn test_register_duplicate_worksheet() {
        let (_dir, mut store) = open_temp();
        store.register_worksheet(&Worksheet::new("Checks", 0)).unwrap();
        let err = store
            .register_worksheet(&Worksheet::new("Checks", 1))
            .unwrap_err();
        assert!(matches!(err, ChecklistError::DuplicateIdentity(_)));
    }

    #[test]
    fn test_not_null_violation_is_storage_error() {
        let (_dir, store) = open_temp();
        let conn = store.connect().unwrap();
        let err = conn
            .execute("INSERT INTO users (username) VALUES ('ghost')", [])
            .unwrap_err();

        let mapped = unique_violation(err, "user 'ghost'".to_string());
        assert!(matches!(mapped, ChecklistError::Storage(_)));
    }

    #[test]
    fn test_replace_all_writes_full_density() {
        let (_dir, mut store) = open_temp();
        store
            .replace_all(&[
                snapshot("B", 1, vec![vec!["x", ""]]),
                snapshot("A", 0, vec![vec!["1", "2"], vec!["", "4"]]),
            ])
            .unwrap();

        let names: Vec<_> = store
            .list_worksheets()
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(store.get_cells("A").unwrap().len(), 4);
        assert_eq!(store.get_cells("B").unwrap().len(), 2);
    }

    #[test]
    fn test_replace_all_rolls_back_on_duplicate() {
        let (_dir, mut store) = open_temp();
        store.replace_all(&[snapshot("Old", 0, vec![vec!["x"]])]).unwrap();

        let result = store.replace_all(&[
            snapshot("Dup", 0, vec![vec!["1"]]),
            snapshot("Dup", 1, vec![vec!["2"]]),
        ]);

        assert!(matches!(result, Err(ChecklistError::DuplicateIdentity(_))));
        assert_eq!(store.list_worksheets().unwrap(), vec![Worksheet::new("Old", 0)]);
        assert_eq!(store.get_cells("Old").unwrap()[0].value, "x");
    }

    #[test]
    fn test_users() {
        let (_dir, mut store) = open_temp();
        let new_user = NewUser {
            username: "admin".into(),
            name: "Administrator".into(),
            email: "admin@example.com".into(),
            department: "Admin".into(),
            password: String::new(),
            role: Role::Admin,
        };
        let id = store.insert_user(&new_user, "$argon2id$hash").unwrap();

        let found = store.find_user("admin").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.role, Role::Admin);
        assert_eq!(found.password_hash, "$argon2id$hash");

        let dup = store.insert_user(&new_user, "other");
        assert!(matches!(dup, Err(ChecklistError::DuplicateIdentity(_))));
        assert_eq!(store.list_users().unwrap().len(), 1);

        assert!(store.delete_user(id).unwrap());
        assert!(store.find_user("admin").unwrap().is_none());
    }
}
