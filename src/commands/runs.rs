//! Runs command handler
//!
//! Lists and shows persisted run documents from the runs directory.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::RunsCommand;
use crate::config::Config;
use crate::error::Result;
use crate::storage::RunStore;

/// Handle `runs` subcommands.
///
/// # Errors
///
/// Fails when the runs directory cannot be read or the requested run
/// does not exist.
pub fn handle_runs(config: &Config, command: RunsCommand) -> Result<()> {
    let store = RunStore::new(PathBuf::from(&config.storage.runs_dir));
    match command {
        RunsCommand::List => {
            let runs = store.list()?;
            if runs.is_empty() {
                println!("{}", "No runs recorded yet.".yellow());
                return Ok(());
            }
            for run in runs {
                let status = if run.partial {
                    "partial".red()
                } else {
                    "complete".green()
                };
                println!(
                    "{}  {:<14} {:>3}/{:<3} {}  {}",
                    run.id.cyan(),
                    run.source,
                    run.successful,
                    run.total,
                    status,
                    run.started_at.dimmed()
                );
            }
        }
        RunsCommand::Show { id } => {
            let run = store.load(&id)?;
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
    }
    Ok(())
}
