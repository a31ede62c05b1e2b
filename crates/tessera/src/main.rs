//! Tessera CLI binary.
//!
//! - Run a pipeline over a file of rows and write the results as JSON Lines
//! - Validate a pipeline configuration without calling a model

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_pipeline, validate_config};

    // Provider keys may live in a local .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tessera::init_logging(&tessera::LogConfig::new(cli.verbose).with_json_logs(cli.json_logs))?;

    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            concurrency,
        } => {
            run_pipeline(&config, &input, output.as_deref(), concurrency).await?;
        }

        Commands::Validate { config } => {
            validate_config(&config)?;
        }
    }

    Ok(())
}
