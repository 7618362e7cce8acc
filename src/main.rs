//! markwright - a rich-text markdown editor for the terminal.
//!
//! # Usage
//!
//! ```bash
//! markwright NOTES.md
//! markwright --read-only README.md
//! markwright --log-file edit.log --all-hotkeys draft.md
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use markwright::app::App;
use markwright::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};

/// A rich-text markdown editor for the terminal
#[derive(Parser, Debug)]
#[command(name = "markwright", version, about, long_about = None)]
struct Cli {
    /// Markdown file to edit (created on first save if missing)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Open the document without allowing edits
    #[arg(long)]
    read_only: bool,

    /// Hint shown while the document is empty
    #[arg(long, value_name = "TEXT")]
    placeholder: Option<String>,

    /// Run every hotkey binding that matches a key press, not just the first
    #[arg(long)]
    all_hotkeys: bool,

    /// Write logs to a file (the editor owns the terminal)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Copy through the terminal (OSC 52) instead of the system clipboard
    #[arg(long)]
    no_system_clipboard: bool,

    /// Save current command-line flags as defaults in .markwrightrc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in .markwrightrc
    #[arg(long)]
    clear: bool,
}

/// Send `tracing` output to `path`. Without a log file nothing is
/// installed, since stdout belongs to the terminal UI.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("markwright=debug")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_deref())?;
    tracing::debug!(?effective, file = %cli.file.display(), "starting");

    if cli.file.is_dir() {
        anyhow::bail!("Not a file: {}", cli.file.display());
    }

    let mut app = App::new(cli.file)
        .with_read_only(effective.read_only)
        .with_placeholder(effective.placeholder.clone())
        .with_match_mode(effective.match_mode())
        .with_system_clipboard(!effective.no_system_clipboard);

    app.run().context("Application error")
}
