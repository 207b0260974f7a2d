//! myai - terminal client for the My-AI chat and image service
//!
#![doc = "myai - terminal client for the My-AI chat and image service"]
#![doc = "Main entry point for the myai application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use myai::cli::{Cli, Commands};
use myai::commands;
use myai::config::Config;

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
        Commands::Chat => {
            commands::chat::run_chat(config).await?;
        }
        Commands::Image(args) => {
            tracing::info!("Generating images");
            commands::image::run_image(config, args).await?;
        }
        Commands::Sessions { command } => {
            commands::history::handle_sessions(config, command).await?;
        }
        Commands::Images { command } => {
            commands::history::handle_images(config, command).await?;
        }
        Commands::Export { output } => {
            commands::data::export(config, output).await?;
        }
        Commands::Import { file } => {
            tracing::info!("Importing data from {}", file.display());
            commands::data::import(config, file).await?;
        }
        Commands::Clear { yes } => {
            commands::data::clear(config, yes).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "myai=debug" } else { "myai=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
