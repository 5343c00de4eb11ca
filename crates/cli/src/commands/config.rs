//! Configuration commands

use clap::Subcommand;
use std::path::Path;

use crate::config::ClientConfig;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(cmd: ConfigCommands, config: &ClientConfig, path: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigCommands::Init { force } => init(path, force)?,
    }
    Ok(())
}

/// Write the default configuration. Never reads the existing file, so
/// `--force` can replace one that no longer parses.
pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ClientConfig::default().save(path)?;
    output::print_success(&format!("Wrote {}", path.display()));
    Ok(())
}
