//! Serve command handler
//!
//! Wires the OpenAI-compatible provider and the run store into the
//! chat HTTP server and blocks until the process is stopped.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::chat::{serve, AppState, OpenAiChatProvider};
use crate::config::Config;
use crate::error::Result;
use crate::storage::RunStore;

/// Start the chat endpoint.
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `bind` - Optional bind address override from the CLI
///
/// # Errors
///
/// Fails when the provider API key is missing or the address cannot be
/// bound.
pub async fn run_serve(config: Config, bind: Option<String>) -> Result<()> {
    let provider = OpenAiChatProvider::new(&config.chat)?;
    let store = RunStore::new(PathBuf::from(&config.storage.runs_dir));
    let state = AppState::new(Arc::new(provider), Arc::new(store));

    let bind = bind.unwrap_or_else(|| config.chat.bind.clone());
    println!(
        "{}",
        format!("Chat endpoint starting on http://{}", bind).cyan()
    );
    serve(&bind, state).await
}
