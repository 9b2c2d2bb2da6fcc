// gridtalk - read a shared workbook, change it only with confirmation

mod actions;
mod exit_codes;
mod query;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gridtalk_config::Settings;
use gridtalk_io::{ConversationError, DocumentStore, SqliteConversations, StoreError};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use exit_codes::{store_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", ",
    env!("TARGET"),
    ")"
);

#[derive(Parser)]
#[command(name = "gridtalk")]
#[command(about = "Query a workbook by reference and edit it with explicit confirmation")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Workbook file (overrides workbook.path)
    #[arg(long, global = true, env = "GRIDTALK_WORKBOOK", value_name = "PATH")]
    workbook: Option<PathBuf>,

    /// Conversation database (overrides conversations.path)
    #[arg(long, global = true, env = "GRIDTALK_CONVERSATIONS", value_name = "PATH")]
    conversations: Option<PathBuf>,

    /// Settings file; defaults apply when it does not exist
    #[arg(long, global = true, env = "GRIDTALK_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sheets with their dimensions and used range
    Sheets {
        #[arg(long)]
        json: bool,
    },

    /// Read one cell
    #[command(after_help = "\
Examples:
  gridtalk cell Sales E8
  gridtalk cell Users b2 --json")]
    Cell {
        sheet: String,
        cell: String,
        #[arg(long)]
        json: bool,
    },

    /// Show the formula stored in a cell, if any
    Formula {
        sheet: String,
        cell: String,
        #[arg(long)]
        json: bool,
    },

    /// Read a rectangular range; corners may be given in any order
    #[command(after_help = "\
Examples:
  gridtalk range Sales A1:E8
  gridtalk range Users C5:A2 --json")]
    Range {
        sheet: String,
        /// "A1" or "A1:C3"
        range: String,
        #[arg(long)]
        json: bool,
    },

    /// Read a sheet's whole used range
    Sheet {
        sheet: String,
        #[arg(long)]
        json: bool,
    },

    /// Find @Sheet!A1:B3 mentions in text
    #[command(after_help = "\
Examples:
  gridtalk mentions 'compare @Sales!E2:E7 with @Users!E2'
  gridtalk mentions 'total is @Sales!E8' --resolve --json")]
    Mentions {
        text: String,
        /// Read the data each mention points at
        #[arg(long)]
        resolve: bool,
        #[arg(long)]
        json: bool,
    },

    /// Print the mention for a sheet and range
    Mention {
        sheet: String,
        from: String,
        to: Option<String>,
    },

    /// Set a cell value (text starting with '=' is stored as a formula)
    #[command(after_help = "\
VALUE is read as JSON when it parses (5200, true, null), as text otherwise.

Examples:
  gridtalk write Users E2 5200
  gridtalk write Users F2 '=E2*12' --yes
  gridtalk write Users B3 null")]
    Write {
        sheet: String,
        cell: String,
        value: String,
        /// Confirm without prompting
        #[arg(long, short = 'y')]
        yes: bool,
        #[arg(long)]
        json: bool,
    },

    /// Delete a row (zero-based; row 0 is the header)
    DeleteRow {
        sheet: String,
        row: usize,
        #[arg(long, short = 'y')]
        yes: bool,
        #[arg(long)]
        json: bool,
    },

    /// Insert a row (zero-based index, clamped to the end of the sheet)
    #[command(after_help = "\
Sheets whose first header is ID, No or № get the next id prepended
unless the first value is already a number.

Examples:
  gridtalk add-row Users 6 Alexsandr alex@gmail.com Developer 4760")]
    AddRow {
        sheet: String,
        row: usize,
        values: Vec<String>,
        #[arg(long, short = 'y')]
        yes: bool,
        #[arg(long)]
        json: bool,
    },

    /// Propose any action by kind and JSON parameters
    #[command(after_help = "\
Kinds: updateCell, deleteRow, addRow, renameConversation,
       deleteConversation, clearConversation

Examples:
  gridtalk action deleteRow '{\"sheet\":\"Inventory\",\"rowIndex\":3}'
  gridtalk action clearConversation '{\"conversationId\":4}' --yes")]
    Action {
        kind: String,
        params: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, short = 'y')]
        yes: bool,
        #[arg(long)]
        json: bool,
    },

    /// Write the demo workbook (Users, Sales, Inventory)
    Seed {
        /// Overwrite an existing workbook
        #[arg(long)]
        force: bool,
    },

    /// Show the effective settings
    Config,
}

/// Resolved settings plus command-line overrides.
pub struct Context {
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub workbook: PathBuf,
    pub conversations: PathBuf,
}

impl Context {
    pub fn store(&self) -> DocumentStore {
        DocumentStore::new(&self.workbook)
            .with_ttl(self.settings.cache_ttl())
            .with_limits(self.settings.limits())
    }

    pub fn conversation_store(&self) -> Result<SqliteConversations, CliError> {
        SqliteConversations::open(&self.conversations).map_err(CliError::from)
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Exit with `code` after output was already printed.
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let hint = match &err {
            StoreError::Open { .. } => Some("run `gridtalk seed` to create the demo workbook".to_string()),
            _ => None,
        };
        Self { code: store_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<ConversationError> for CliError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NotFound(_) => Self { code: EXIT_ERROR, message: err.to_string(), hint: None },
            ConversationError::Sqlite(_) => Self::io(err.to_string()),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
    println!("{}", json);
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<(Settings, PathBuf), CliError> {
    match path {
        Some(p) if p.exists() => Settings::load_from(p)
            .map(|s| (s, p.to_path_buf()))
            .map_err(|e| CliError::usage(e.to_string())),
        Some(p) => Ok((Settings::default(), p.to_path_buf())),
        None => Ok((Settings::load(), Settings::config_path())),
    }
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (settings, settings_path) = load_settings(cli.config.as_deref())?;
    init_logging(&settings.log_filter);

    let ctx = Context {
        workbook: cli.workbook.unwrap_or_else(|| settings.workbook_path.clone()),
        conversations: cli.conversations.unwrap_or_else(|| settings.conversations_path.clone()),
        settings,
        settings_path,
    };

    match cli.command {
        Commands::Sheets { json } => query::cmd_sheets(&ctx, json),
        Commands::Cell { sheet, cell, json } => query::cmd_cell(&ctx, &sheet, &cell, json),
        Commands::Formula { sheet, cell, json } => query::cmd_formula(&ctx, &sheet, &cell, json),
        Commands::Range { sheet, range, json } => query::cmd_range(&ctx, &sheet, &range, json),
        Commands::Sheet { sheet, json } => query::cmd_sheet(&ctx, &sheet, json),
        Commands::Mentions { text, resolve, json } => query::cmd_mentions(&ctx, &text, resolve, json),
        Commands::Mention { sheet, from, to } => query::cmd_mention(&sheet, &from, to.as_deref()),
        Commands::Write { sheet, cell, value, yes, json } => {
            actions::cmd_write(&ctx, sheet, cell, &value, yes, json)
        }
        Commands::DeleteRow { sheet, row, yes, json } => actions::cmd_delete_row(&ctx, sheet, row, yes, json),
        Commands::AddRow { sheet, row, values, yes, json } => {
            actions::cmd_add_row(&ctx, sheet, row, &values, yes, json)
        }
        Commands::Action { kind, params, title, description, yes, json } => {
            actions::cmd_action(&ctx, &kind, &params, title, description, yes, json)
        }
        Commands::Seed { force } => actions::cmd_seed(&ctx, force),
        Commands::Config => {
            eprintln!("settings: {}", ctx.settings_path.display());
            print_json(&ctx.settings)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
