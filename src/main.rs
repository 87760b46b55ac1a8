use std::path::PathBuf;
use std::process::ExitCode;

use checklist_editor::cli::{self, CliContext, UserForm};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "checklist")]
#[command(about = "Spreadsheet-backed checklist editor: import, edit and export worksheets.")]
#[command(long_about = "Checklist - spreadsheet-backed checklist editor

Imports an Excel workbook into a SQLite store (one row per cell), lets you
view and edit each worksheet's grid, and exports the edited grid back to .xlsx.

COMMANDS:
  init     - Create the database and default accounts
  import   - Replace all worksheets with an Excel workbook
  sheets   - List imported worksheets
  show     - Print a worksheet's grid
  set      - Save one cell value
  export   - Write the grids to a timestamped .xlsx
  user     - Manage accounts (admin only)

EXAMPLES:
  checklist init
  checklist -u admin -p admin123 import checklist.xlsx
  checklist -u user -p user123 set Checks 0 1 Done
  checklist -u user -p user123 export --template base.xlsx

Logging: set RUST_LOG (default: checklist=info).")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "CHECKLIST_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "CHECKLIST_DB")]
    db: Option<PathBuf>,

    /// Username to act as
    #[arg(short, long, global = true, env = "CHECKLIST_USER")]
    user: Option<String>,

    /// Password for --user
    #[arg(short, long, global = true, env = "CHECKLIST_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print the operation report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and default accounts
    Init,

    #[command(long_about = "Import an Excel workbook.

Every previously imported worksheet, structure and cell is discarded and
replaced by the workbook's contents. Row 1 of each worksheet becomes the
header row; every later row is data. All values are stored as text.

The replacement is atomic: if anything fails, the previous data stays.")]
    /// Replace all worksheets with an Excel workbook
    Import {
        /// Path to the .xlsx file
        file: PathBuf,
    },

    /// List imported worksheets in tab order
    Sheets,

    /// Print a worksheet's grid (first worksheet by default)
    Show {
        /// Worksheet name
        sheet: Option<String>,
    },

    /// Save one cell value (row/col are 0-based data positions)
    Set {
        /// Worksheet name
        sheet: String,

        /// Data row, 0 = first row under the headers
        row: usize,

        /// Column, 0 = column A
        col: usize,

        /// New value (use "" to clear)
        value: String,
    },

    #[command(long_about = "Export all worksheets to a timestamped .xlsx file.

With a template, its sheets and values are kept and the stored grids are
written over them starting at row 2; sheets missing from the template are
appended with their header row.")]
    /// Write the grids to a timestamped .xlsx
    Export {
        /// Template workbook (overrides the config file)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Manage accounts (admin only)
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add an account
    Add {
        /// Login name (must be unique)
        username: String,

        /// Initial password
        new_password: String,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        department: String,

        /// admin or user
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// List accounts
    List,

    /// Delete an account by id
    Delete {
        id: i64,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checklist=info,checklist_editor=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let Some(ctx) = CliContext::load(
        cli.config.as_deref(),
        cli.db,
        cli.user,
        cli.password,
        cli.json,
    ) else {
        return Ok(ExitCode::FAILURE);
    };

    let ok = match cli.command {
        Commands::Init => cli::init(&ctx),

        Commands::Import { file } => cli::import(&ctx, file),

        Commands::Sheets => cli::sheets(&ctx),

        Commands::Show { sheet } => cli::show(&ctx, sheet),

        Commands::Set {
            sheet,
            row,
            col,
            value,
        } => cli::set_cell(&ctx, sheet, row, col, value),

        Commands::Export { template, out_dir } => cli::export(&ctx, template, out_dir),

        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                new_password,
                name,
                email,
                department,
                role,
            } => cli::user_add(
                &ctx,
                UserForm {
                    username,
                    password: new_password,
                    name,
                    email,
                    department,
                    role,
                },
            ),

            UserCommands::List => cli::user_list(&ctx),

            UserCommands::Delete { id } => cli::user_delete(&ctx, id),
        },
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
