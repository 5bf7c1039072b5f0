use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vellum_config::{ConfigLoad, ConfigLoader, ConfigWarnings};
use vellum_core::{PostgresCatalog, model::MediaAssetStatus};

#[derive(Parser)]
#[command(name = "vellumctl", about = "Vellum catalog operator tool")]
struct Cli {
    /// Path to vellum.toml (defaults to ./vellum.toml or $VELLUM_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to an env file loaded before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate configuration and optionally database connectivity
    Check {
        /// Connect to the database and run a trivial query
        #[arg(long)]
        ping: bool,
    },
    /// Apply the embedded catalog schema migrations
    Migrate,
    /// Print the effective configuration with secrets masked
    Config,
    /// List the media asset status pipeline
    Statuses,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { ping } => {
            let load = load_config(&cli.config, &cli.env_file)?;
            print_warnings(&load.warnings);
            if ping {
                let settings = load
                    .config
                    .database_settings()
                    .context("no database URL configured")?;
                let catalog = PostgresCatalog::connect(&settings).await?;
                catalog.ping().await?;
                let stats = catalog.pool_stats();
                println!(
                    "database reachable (pool size {}, idle {})",
                    stats.size, stats.idle
                );
            }
            println!("configuration OK");
        }
        Command::Migrate => {
            let load = load_config(&cli.config, &cli.env_file)?;
            print_warnings(&load.warnings);
            let Some(settings) = load.config.database_settings() else {
                bail!("no database URL configured; cannot run migrations");
            };
            let catalog = PostgresCatalog::connect(&settings).await?;
            catalog.initialize_schema().await?;
            info!("Migrations applied");
            println!("migrations applied");
        }
        Command::Config => {
            let load = load_config(&cli.config, &cli.env_file)?;
            let rendered = load
                .config
                .to_redacted_toml()
                .context("failed to render configuration")?;
            print!("{rendered}");
            if let Some(source) = load.config.metadata.database_url_source {
                println!("# database url source: {}", source.as_str());
            }
        }
        Command::Statuses => {
            for status in MediaAssetStatus::ALL {
                let next: Vec<&str> = status
                    .legal_successors()
                    .iter()
                    .map(|s| s.as_str())
                    .collect();
                if next.is_empty() {
                    println!("{status} (terminal)");
                } else {
                    println!("{status} -> {}", next.join(", "));
                }
            }
        }
    }

    Ok(())
}

fn load_config(
    config: &Option<PathBuf>,
    env_file: &Option<PathBuf>,
) -> Result<ConfigLoad> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = env_file {
        loader = loader.with_env_file(path);
    }
    loader.load().context("failed to load configuration")
}

fn print_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        eprintln!("warning: {}", warning.message);
        if let Some(hint) = &warning.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
