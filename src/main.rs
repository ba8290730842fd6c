//! Campus Scout - campus assistant CLI
//!
#![doc = "Campus Scout - campus assistant CLI"]
#![doc = "Main entry point for the Campus Scout application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use campus_scout::cli::{Cli, Commands};
use campus_scout::commands;
use campus_scout::commands::scrape::ScrapeOptions;
use campus_scout::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Scrape {
            source,
            output,
            course,
            from_run,
            targets,
            debug_screenshot,
        } => {
            tracing::info!("Starting scrape of {}", source.as_str());
            if let Some(run_id) = &from_run {
                tracing::debug!("Reusing links of run {}", run_id);
            }
            if debug_screenshot {
                tracing::debug!("Debug screenshots enabled");
            }

            commands::scrape::run_scrape(
                config,
                ScrapeOptions {
                    source,
                    output,
                    course,
                    from_run,
                    targets,
                    debug_screenshot,
                },
            )
            .await?;
            Ok(())
        }
        Commands::Serve { bind } => {
            tracing::info!("Starting chat endpoint");
            commands::serve::run_serve(config, bind).await?;
            Ok(())
        }
        Commands::Map { command } => {
            commands::map::handle_map(command)?;
            Ok(())
        }
        Commands::Runs { command } => {
            commands::runs::handle_runs(&config, command)?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "campus_scout=debug"
    } else {
        "campus_scout=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
