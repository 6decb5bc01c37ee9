//! rote - flashcard scheduling with mastery tracking
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rote::cli::backup_cmd::{BackupAction, BackupCommand, BackupOptions};
use rote::cli::init::{InitCommand, InitOptions};
use rote::cli::items::{ItemsAction, ItemsCommand, ItemsOptions};
use rote::cli::status::{StatusCommand, StatusOptions};
use rote::cli::study::{StudyAction, StudyCommand, StudyOptions};
use rote::config::{rote_home, state_dir, Config};
use rote::error::exit_codes;
use rote::storage::FileKvStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// rote - flashcard scheduling with mastery tracking
#[derive(Parser)]
#[command(name = "rote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, short, global = true)]
    json: bool,
    /// Suppress output
    #[arg(long, short, global = true)]
    quiet: bool,
    /// Directory holding study state (default: $ROTE_HOME/state)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// [Study] Draw the next card
    Next,
    /// [Study] Reveal the formula of the current card
    Reveal,
    /// [Study] Mark the revealed card as known
    Known,
    /// [Study] Exclude the current card from study
    Exclude,
    /// [Study] Jump to a specific item
    Show {
        /// Item ID
        id: String,
    },
    /// [Study] Print the current card
    Current,

    /// [Catalog] Add an item
    Add {
        /// Formula source, shown verbatim
        formula: String,
        /// Description shown on the question side
        #[arg(long, short, default_value = "")]
        desc: String,
    },
    /// [Catalog] Delete an item and its history
    Delete {
        /// Item ID
        id: String,
    },
    /// [Catalog] Put an excluded item back into rotation
    Include {
        /// Item ID
        id: String,
    },
    /// [Catalog] List items in rotation
    List {
        /// List excluded items instead
        #[arg(long, short)]
        excluded: bool,
    },

    /// [User] Show study progress and settings
    Status,
    /// [User] Write a backup of all study state
    Export {
        /// File to write (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// [User] Replace all study state with a backup
    Import {
        /// Backup file to read
        path: PathBuf,
    },
    /// [User] Write the project config and create the state directory
    Init {
        /// Overwrite an existing project config
        #[arg(long, short)]
        force: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    setup_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("rote error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.rote/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("rote panic: {}", info);

        if let Some(home) = rote_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Log to stderr, filtered by `ROTE_LOG` (default: warn).
fn setup_tracing() {
    let filter = EnvFilter::try_from_env("ROTE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();
    let data_dir = cli.data_dir.as_deref();
    let (json, quiet) = (cli.json, cli.quiet);

    match cli.command {
        Commands::Next => run_study(StudyAction::Next, data_dir, &config, json, quiet),
        Commands::Reveal => run_study(StudyAction::Reveal, data_dir, &config, json, quiet),
        Commands::Known => run_study(StudyAction::Known, data_dir, &config, json, quiet),
        Commands::Exclude => run_study(StudyAction::Exclude, data_dir, &config, json, quiet),
        Commands::Show { id } => run_study(StudyAction::Show(id), data_dir, &config, json, quiet),
        Commands::Current => run_study(StudyAction::Current, data_dir, &config, json, quiet),
        Commands::Add { formula, desc } => {
            let action = ItemsAction::Add {
                description: desc,
                formula,
            };
            run_items(action, data_dir, &config, json, quiet)
        }
        Commands::Delete { id } => {
            run_items(ItemsAction::Delete { id }, data_dir, &config, json, quiet)
        }
        Commands::Include { id } => {
            run_items(ItemsAction::Include { id }, data_dir, &config, json, quiet)
        }
        Commands::List { excluded } => {
            run_items(ItemsAction::List { excluded }, data_dir, &config, json, quiet)
        }
        Commands::Status => run_status(data_dir, &config, json, quiet),
        Commands::Export { output } => {
            run_backup(BackupAction::Export { output }, data_dir, &config, json, quiet)
        }
        Commands::Import { path } => {
            run_backup(BackupAction::Import { path }, data_dir, &config, json, quiet)
        }
        Commands::Init { force } => run_init(force, data_dir, config, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn open_store(data_dir: Option<&Path>) -> Result<FileKvStore, Box<dyn std::error::Error>> {
    let store = match data_dir {
        Some(dir) => FileKvStore::with_dir(dir)?,
        None => FileKvStore::new()?,
    };
    Ok(store)
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
    }
}

fn run_study(
    action: StudyAction,
    data_dir: Option<&Path>,
    config: &Config,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let mut cmd = StudyCommand::new(store, config);
    let options = StudyOptions { json, quiet };

    let output = cmd.run(&action);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_items(
    action: ItemsAction,
    data_dir: Option<&Path>,
    config: &Config,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let mut cmd = ItemsCommand::new(store, config);
    let options = ItemsOptions { json, quiet };

    let output = cmd.run(&action);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_status(
    data_dir: Option<&Path>,
    config: &Config,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let dir = store.dir().display().to_string();
    let cmd = StatusCommand::new(store, config, Some(dir));
    let options = StatusOptions { json, quiet };

    let output = cmd.run();
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_backup(
    action: BackupAction,
    data_dir: Option<&Path>,
    config: &Config,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = open_store(data_dir)?;
    let mut cmd = BackupCommand::new(store, config);
    let options = BackupOptions { json, quiet };

    let output = cmd.run(&action);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_init(
    force: bool,
    data_dir: Option<&Path>,
    config: Config,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let state = data_dir.map(Path::to_path_buf).or_else(state_dir);

    let cmd = InitCommand::new(cwd, state, config);
    let options = InitOptions { json, quiet, force };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}
