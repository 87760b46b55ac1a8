use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;

use crate::auth::{self, Identity};
use crate::config::AppConfig;
use crate::error::{ChecklistError, ChecklistResult};
use crate::excel::codec::checked_cell_reference;
use crate::excel::{ExcelExporter, ExcelImporter, ExportArtifact, ImportSummary};
use crate::grid::materialize_sheet;
use crate::report::{self, OperationReport};
use crate::store::{GridStore, SqliteStore, UserStore};
use crate::types::{NewUser, Role, SheetView, User};

/// Everything a command needs besides its own arguments
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: AppConfig,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Print the raw report as JSON instead of formatted output
    pub json: bool,
}

impl CliContext {
    fn open_store(&self) -> ChecklistResult<SqliteStore> {
        SqliteStore::open(&self.config.database)
    }

    /// Load the configuration and build a context. On failure the report is
    /// printed like any other command failure and `None` is returned.
    pub fn load(
        config: Option<&Path>,
        db: Option<PathBuf>,
        user: Option<String>,
        password: Option<String>,
        json: bool,
    ) -> Option<Self> {
        let report = report::run("config", || {
            let mut config = AppConfig::load_or_default(config)?;
            if let Some(db) = db {
                config.database = db;
            }
            Ok(config)
        });
        if !report.success {
            print_report(json, report, |_| {});
            return None;
        }
        report.data.map(|config| Self {
            config,
            user,
            password,
            json,
        })
    }

    /// Authenticate the caller and check the role, once per command.
    fn identify<S: UserStore + ?Sized>(
        &self,
        store: &S,
        required: Role,
    ) -> ChecklistResult<Identity> {
        let (Some(user), Some(password)) = (self.user.as_deref(), self.password.as_deref()) else {
            return Err(ChecklistError::Auth(
                "--user and --password (or CHECKLIST_USER / CHECKLIST_PASSWORD) are required"
                    .to_string(),
            ));
        };
        let identity = auth::authenticate(store, user, password)?;
        identity.require(required)?;
        Ok(identity)
    }
}

/// Result of `init`
#[derive(Debug, Serialize)]
pub struct InitSummary {
    pub database: PathBuf,
    pub created_accounts: Vec<String>,
}

/// One line of `sheets`
#[derive(Debug, Serialize)]
pub struct SheetListing {
    pub name: String,
    pub display_order: u32,
    pub total_rows: usize,
    pub total_cols: usize,
}

/// Result of `set`
#[derive(Debug, Serialize)]
pub struct CellEdit {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
    pub value: String,
    /// Position in the exported sheet, e.g. `B2`. `None` past Excel's last row or column.
    pub reference: Option<String>,
}

/// `user add` arguments as given on the command line
#[derive(Debug, Clone)]
pub struct UserForm {
    pub username: String,
    pub password: String,
    /// Defaults to the username when empty
    pub name: String,
    pub email: String,
    pub department: String,
    /// `admin` or `user`
    pub role: String,
}

impl UserForm {
    fn to_new_user(&self) -> ChecklistResult<NewUser> {
        let name = if self.name.is_empty() {
            self.username.clone()
        } else {
            self.name.clone()
        };
        Ok(NewUser {
            username: self.username.clone(),
            name,
            email: self.email.clone(),
            department: self.department.clone(),
            password: self.password.clone(),
            role: self.role.parse()?,
        })
    }
}

/// Result of `user add`
#[derive(Debug, Serialize)]
pub struct AddedUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Print a report and return whether it succeeded
fn finish<T: Serialize>(
    ctx: &CliContext,
    report: OperationReport<T>,
    render: impl FnOnce(&T),
) -> bool {
    print_report(ctx.json, report, render)
}

fn print_report<T: Serialize>(
    json: bool,
    report: OperationReport<T>,
    render: impl FnOnce(&T),
) -> bool {
    if json {
        println!("{}", report.to_json());
        return report.success;
    }
    match &report.data {
        Some(data) if report.success => {
            render(data);
            if let Some(message) = &report.message {
                println!("{}", message.green());
            }
        }
        _ => {
            let message = report.message.as_deref().unwrap_or("operation failed");
            eprintln!("{} {}", "❌".red(), message.red());
        }
    }
    report.success
}

/// Execute the init command
pub fn init(ctx: &CliContext) -> bool {
    let report = report::run("init", || {
        let mut store = ctx.open_store()?;
        let created = auth::seed_default_accounts(&mut store, &ctx.config.default_accounts)?;
        Ok(InitSummary {
            database: store.path().to_path_buf(),
            created_accounts: created,
        })
    });

    finish(ctx, report, |summary| {
        println!("{}", "🗂  Checklist - Database ready".bold().green());
        println!("   Database: {}", summary.database.display());
        if summary.created_accounts.is_empty() {
            println!("   No new accounts");
        } else {
            println!("   Created accounts: {}", summary.created_accounts.join(", ").cyan());
        }
    })
}

/// Execute the import command
pub fn import(ctx: &CliContext, file: PathBuf) -> bool {
    let report = report::run("import", || {
        let mut store = ctx.open_store()?;
        ctx.identify(&store, Role::User)?;
        ExcelImporter::from_path(&file)?.import_into(&mut store)
    });
    let report = match report.data.as_ref().map(|s: &ImportSummary| s.worksheets.len()) {
        Some(count) => report.with_message(format!("Uploaded {} worksheets successfully", count)),
        None => report,
    };

    finish(ctx, report, |summary| {
        println!("{}", "📥 Checklist - Excel Import".bold().green());
        println!("   Input: {}", file.display());
        for sheet in &summary.worksheets {
            println!(
                "   📊 {} ({} rows, {} cols)",
                sheet.name.bright_blue(),
                sheet.total_rows,
                sheet.total_cols
            );
        }
        println!("   Cells written: {}", summary.cells_written);
    })
}

/// Execute the sheets command
pub fn sheets(ctx: &CliContext) -> bool {
    let report = report::run("sheets", || {
        let store = ctx.open_store()?;
        ctx.identify(&store, Role::User)?;
        list_sheets(&store)
    });

    finish(ctx, report, |listings| {
        if listings.is_empty() {
            println!("{}", "No worksheets imported yet".yellow());
            return;
        }
        for sheet in listings {
            println!(
                "   {:>3}  {} ({} rows, {} cols)",
                sheet.display_order,
                sheet.name.bright_blue().bold(),
                sheet.total_rows,
                sheet.total_cols
            );
        }
    })
}

fn list_sheets<S: GridStore + ?Sized>(store: &S) -> ChecklistResult<Vec<SheetListing>> {
    let mut listings = Vec::new();
    for worksheet in store.list_worksheets()? {
        let (total_rows, total_cols) = store
            .get_structure(&worksheet.name)?
            .map(|s| (s.total_rows, s.total_cols))
            .unwrap_or((0, 0));
        listings.push(SheetListing {
            name: worksheet.name,
            display_order: worksheet.display_order,
            total_rows,
            total_cols,
        });
    }
    Ok(listings)
}

/// Execute the show command. Without a sheet name, shows the first worksheet.
pub fn show(ctx: &CliContext, sheet: Option<String>) -> bool {
    let report = report::run("show", || {
        let store = ctx.open_store()?;
        ctx.identify(&store, Role::User)?;
        view_sheet(&store, sheet.as_deref())
    });

    finish(ctx, report, |view| print_sheet(view))
}

fn view_sheet<S: GridStore + ?Sized>(store: &S, sheet: Option<&str>) -> ChecklistResult<SheetView> {
    let name = match sheet {
        Some(name) => name.to_string(),
        None => match store.list_worksheets()?.into_iter().next() {
            Some(first) => first.name,
            None => {
                return Ok(SheetView {
                    name: String::new(),
                    headers: Vec::new(),
                    grid: Default::default(),
                })
            }
        },
    };
    materialize_sheet(store, &name)
}

fn print_sheet(view: &SheetView) {
    if view.name.is_empty() {
        println!("{}", "No worksheets imported yet".yellow());
        return;
    }
    println!("{}", format!("📊 {}", view.name).bold().green());
    if view.grid.is_empty() && view.headers.is_empty() {
        println!("   (no data)");
        return;
    }

    let cols = view.headers.len().max(view.grid.col_count());
    let mut widths = vec![0usize; cols];
    for (col, width) in widths.iter_mut().enumerate() {
        let header = view.headers.get(col).map(|h| h.chars().count()).unwrap_or(0);
        let cells = view
            .grid
            .rows()
            .iter()
            .map(|r| r.get(col).map(|v| v.chars().count()).unwrap_or(0))
            .max()
            .unwrap_or(0);
        *width = header.max(cells).clamp(1, 40);
    }

    let headers: Vec<&str> = (0..cols)
        .map(|c| view.headers.get(c).map(String::as_str).unwrap_or(""))
        .collect();
    println!("   {}", format_row(&headers, &widths).bold());
    for row in view.grid.rows() {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("   {}", format_row(&values, &widths));
    }
}

fn format_row(values: &[&str], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", truncate(v, *w), width = *w))
        .collect::<Vec<_>>()
        .join(" │ ")
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Execute the set command (save one cell)
pub fn set_cell(ctx: &CliContext, sheet: String, row: usize, col: usize, value: String) -> bool {
    let report = report::run("set", || {
        let mut store = ctx.open_store()?;
        ctx.identify(&store, Role::User)?;
        store.upsert_cell(&sheet, row, col, &value)?;
        Ok(CellEdit {
            // Data row 0 sits under the header row
            reference: row
                .checked_add(1)
                .and_then(|r| checked_cell_reference(r, col)),
            sheet: sheet.clone(),
            row,
            col,
            value: value.clone(),
        })
    });

    finish(ctx, report, |edit| {
        println!(
            "{} {}!{} = {:?}",
            "✅ Saved".bold().green(),
            edit.sheet.bright_blue(),
            edit
                .reference
                .clone()
                .unwrap_or_else(|| format!("R{}C{}", edit.row, edit.col)),
            edit.value
        );
    })
}

/// Execute the export command
pub fn export(ctx: &CliContext, template: Option<PathBuf>, out_dir: Option<PathBuf>) -> bool {
    let mut options = ctx.config.export_options();
    if template.is_some() {
        options.template = template;
    }
    if let Some(dir) = out_dir {
        options.output_dir = dir;
    }

    let report = report::run("export", || {
        let store = ctx.open_store()?;
        ctx.identify(&store, Role::User)?;
        ExcelExporter::new(options.clone()).export(&store)
    });

    finish(ctx, report, |artifact: &ExportArtifact| {
        println!("{}", "📤 Checklist - Excel Export".bold().green());
        if let Some(template) = &options.template {
            println!("   Template: {}", template.display());
        }
        println!("   Excel file: {}", artifact.path.display());
        println!("   Size: {} bytes", artifact.size_bytes);
    })
}

/// Execute `user add`
pub fn user_add(ctx: &CliContext, form: UserForm) -> bool {
    let report = report::run("user add", || {
        let new_user = form.to_new_user()?;
        let mut store = ctx.open_store()?;
        ctx.identify(&store, Role::Admin)?;
        let id = auth::add_user(&mut store, &new_user)?;
        Ok(AddedUser {
            id,
            username: new_user.username,
            role: new_user.role,
        })
    });

    finish(ctx, report, |added| {
        println!(
            "{} {} (#{}, {})",
            "✅ User added:".bold().green(),
            added.username.bright_blue(),
            added.id,
            added.role
        );
    })
}

/// Execute `user list`
pub fn user_list(ctx: &CliContext) -> bool {
    let report = report::run("user list", || {
        let store = ctx.open_store()?;
        ctx.identify(&store, Role::Admin)?;
        store.list_users()
    });

    finish(ctx, report, |users: &Vec<User>| {
        for user in users {
            println!(
                "   #{:<3} {:<16} {:<6} {} <{}> {}",
                user.id,
                user.username.bright_blue(),
                user.role.to_string(),
                user.name,
                user.email,
                user.department.dimmed()
            );
        }
    })
}

/// Execute `user delete`
pub fn user_delete(ctx: &CliContext, id: i64) -> bool {
    let report = report::run("user delete", || {
        let mut store = ctx.open_store()?;
        let actor = ctx.identify(&store, Role::Admin)?;
        auth::delete_user_as(&mut store, &actor, id)?;
        Ok(id)
    });

    finish(ctx, report, |id| {
        println!("{} #{}", "✅ User deleted".bold().green(), id);
    })
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
