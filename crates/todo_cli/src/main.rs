//! Terminal front end for the local TODO list.
//!
//! # Responsibility
//! - Resolve configuration and start logging.
//! - Wire the store, optional speech input and controller into the view.

mod view;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use todo_core::{
    core_version, detect_recognizer, init_logging, AppConfig, ResolvedConfig, TodoController,
    TodoStore,
};

#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(version)]
#[command(about = "Keep a local TODO list: add, edit, delete and dictate items")]
struct Cli {
    /// Config file (defaults to <config dir>/todo/config.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database file
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Disable voice input even when a recognizer is configured
    #[arg(long)]
    no_speech: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<ResolvedConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::load_default()?,
        };

        if let Some(db) = &self.db {
            config.database_path = Some(db.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = Some(level.clone());
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        if self.no_speech {
            config.speech.command = None;
        }

        Ok(config.resolve()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config().context("failed to load configuration")?;

    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok version={} interactive={}",
        core_version(),
        io::stdin().is_terminal()
    );

    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let recognizer = detect_recognizer(&config.speech);
    let mut controller = TodoController::new(TodoStore::open(&config.database_path))
        .with_speech(recognizer, config.speech.recognition_config());

    let stdin = io::stdin();
    view::run_session(&mut controller, stdin.lock(), io::stdout().lock())
        .context("terminal I/O failed")?;

    info!("event=cli_exit module=cli status=ok");
    Ok(())
}
