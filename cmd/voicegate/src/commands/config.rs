//! Configuration management commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use voicegate_cli::{Config, Paths};

use super::{get_config, output, print_success};
use crate::Cli;

/// Manage configuration.
///
/// Configuration is stored in ~/.voicegate/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// View the current configuration
    View,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;
                eprintln!("Config file: {}", cfg.path().display());
                eprintln!("Store path: {}", cfg.store_path().display());
                output(cli).write(&cfg)
            }

            ConfigSubcommand::Init { force } => {
                let path = match &cli.config {
                    Some(p) => PathBuf::from(p),
                    None => Paths::new()?.config_file(),
                };
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists, use --force to overwrite",
                        path.display()
                    );
                }
                Config::new(&path).save()?;
                print_success(&format!("Wrote {}", path.display()));
                Ok(())
            }
        }
    }
}
