//! voicegate - voice identity verification.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod server;

use commands::{
    ConfigCommand, EnrollCommand, ListCommand, RemoveCommand, ServeCommand, VerifyCommand,
};

/// voicegate - voice identity verification.
///
/// Users enroll a reference recording under a username and later sign in
/// by recording a challenge that is compared against it:
///   - serve: HTTP API and browser page for the sign-in / sign-up flow
///   - verify: compare two WAV files
///   - enroll, list, remove: manage stored identities
///
/// Configuration is stored in ~/.voicegate/config.yaml.
#[derive(Parser)]
#[command(name = "voicegate")]
#[command(about = "Voice identity verification")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.voicegate/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),
    /// Compare a challenge recording against a reference recording
    Verify(VerifyCommand),
    /// Register a username with a reference recording
    Enroll(EnrollCommand),
    /// List registered usernames
    List(ListCommand),
    /// Delete a registered identity
    Remove(RemoveCommand),
    /// Manage configuration
    Config(ConfigCommand),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Serve(cmd) => cmd.run(&cli).await?,
        Commands::Verify(cmd) => return cmd.run(&cli).await,
        Commands::Enroll(cmd) => cmd.run(&cli).await?,
        Commands::List(cmd) => cmd.run(&cli).await?,
        Commands::Remove(cmd) => cmd.run(&cli).await?,
        Commands::Config(cmd) => cmd.run(&cli).await?,
    }
    Ok(ExitCode::SUCCESS)
}
