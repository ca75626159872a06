//! vision-dispatch - configuration and ranking tool for the dispatcher
//!
//! Loads the dispatcher configuration, validates it and ranks the configured
//! backend descriptors without probing them.

#![allow(missing_docs)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use vision_dispatch::config::Config;
use vision_dispatch::core::router::{SelectionCriteria, SelectionStrategy, rank_descriptors};
use vision_dispatch::utils::logging::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "vision-dispatch", version, about)]
struct Cli {
    /// Configuration file
    #[arg(
        long,
        env = "VISION_DISPATCH_CONFIG",
        default_value = "config/dispatcher.yaml"
    )]
    config: PathBuf,

    /// Ignore the configuration file and read VISION_DISPATCH_* variables only
    #[arg(long)]
    env_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration and print it as YAML
    Check,
    /// Rank the configured backends with the static scoring table
    Rank {
        #[arg(long, default_value = "balanced")]
        strategy: SelectionStrategy,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        max_cost: Option<f64>,
        #[arg(long)]
        min_accuracy: Option<f64>,
    },
    /// List supported selection strategies
    Strategies,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli).await?;
    init_tracing(&config.dispatcher.logging)?;
    debug!(environment = ?config.dispatcher.environment, "Configuration ready");

    match cli.command {
        Command::Check => {
            info!(
                backends = config.dispatcher.backends.len(),
                "Configuration is valid"
            );
            print!("{}", config.to_yaml()?);
        }
        Command::Rank {
            strategy,
            provider,
            max_cost,
            min_accuracy,
        } => {
            let mut criteria = SelectionCriteria::new(strategy);
            criteria.provider = provider;
            criteria.max_cost = max_cost;
            criteria.min_accuracy = min_accuracy;

            let ranking = rank_descriptors(
                &config.dispatcher.backends,
                &criteria,
                &config.dispatcher.selector,
            );
            println!("{}", serde_json::to_string_pretty(&ranking)?);
        }
        Command::Strategies => {
            for strategy in SelectionStrategy::ALL {
                println!("{}", strategy);
            }
        }
    }

    Ok(())
}

async fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if cli.env_only {
        return Config::from_env().context("loading configuration from the environment");
    }

    Config::from_file(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))
}
