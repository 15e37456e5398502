//! Credit Default - Main Entry Point

use clap::Parser;
use credit_default::cli::{cmd_config, cmd_run, cmd_synth, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_default=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { data, config, seed, trees, json } => {
            cmd_run(&data, config.as_deref(), seed, trees, json.as_deref())?;
        }
        Commands::Synth { rows, output, seed, noise } => {
            cmd_synth(rows, &output, seed, noise)?;
        }
        Commands::Config { output } => {
            cmd_config(output.as_deref())?;
        }
    }

    Ok(())
}
