//! testdeck CLI - Main Entry Point
//!
//! Drives the catalog manager and instruction generator views against the
//! configured backends.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use testdeck_cli::commands::{catalog, config as config_cmd, instructions};
use testdeck_cli::config::ClientConfig;
use testdeck_cli::output;

/// testdeck - product testing dashboard client
#[derive(Parser)]
#[command(name = "testdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "TESTDECK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Catalog API base URL (overrides the config file)
    #[arg(long, env = "TESTDECK_CATALOG_URL", global = true)]
    catalog_url: Option<String>,

    /// Base URL stored images are served from (overrides the config file)
    #[arg(long, env = "TESTDECK_MEDIA_URL", global = true)]
    media_url: Option<String>,

    /// Instructions service base URL (overrides the config file)
    #[arg(long, env = "TESTDECK_INSTRUCTIONS_URL", global = true)]
    instructions_url: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects, features, images and strategies
    #[command(subcommand)]
    Catalog(catalog::CatalogCommands),

    /// Generate and improve testing instructions
    #[command(subcommand)]
    Instructions(instructions::InstructionsCommands),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),

    /// Show version information
    Version,
}

impl Cli {
    fn load_config(&self, path: &std::path::Path) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::load(path)?;
        if let Some(url) = &self.catalog_url {
            config.catalog.api_base_url = url.clone();
        }
        if let Some(url) = &self.media_url {
            config.catalog.media_base_url = url.clone();
        }
        if let Some(url) = &self.instructions_url {
            config.instructions.base_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(testdeck_common::default_config_path);

    // init must work even when the existing file is broken
    if let Commands::Config(config_cmd::ConfigCommands::Init { force }) = cli.command {
        exit_on_error(config_cmd::init(&config_path, force));
        return Ok(());
    }

    let config = match cli.load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Cannot load {}: {}", config_path.display(), e));
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Catalog(cmd) => catalog::execute(cmd, &config, cli.format).await,
        Commands::Instructions(cmd) => instructions::execute(cmd, &config, cli.format).await,
        Commands::Config(cmd) => config_cmd::execute(cmd, &config, &config_path),
        Commands::Version => {
            println!("testdeck v{}", testdeck_common::VERSION);
            Ok(())
        }
    };

    exit_on_error(result);
    Ok(())
}

fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}
