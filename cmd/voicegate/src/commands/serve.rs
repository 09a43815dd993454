//! `voicegate serve`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use voicegate_identity::SessionConfig;

use super::{get_config, print_verbose};
use crate::Cli;
use crate::app::{build_store, build_verifier};
use crate::server::{AppState, start_server};

/// Run the HTTP server.
///
/// Flags override the `server` section of the config file.
#[derive(Args)]
pub struct ServeCommand {
    /// Listen address, e.g. ":8080" or "127.0.0.1:9000"
    #[arg(long)]
    listen: Option<String>,

    /// Serve this directory at / instead of the built-in page
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Redirect verified users here
    #[arg(long)]
    dashboard_url: Option<String>,
}

impl ServeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        print_verbose(cli, &format!("config: {}", cfg.path().display()));

        let store = build_store(&cfg)?;
        let verifier = build_verifier(&cfg.model)?;
        let session_config = SessionConfig {
            max_attempts: cfg.server.max_attempts,
            dashboard_url: self
                .dashboard_url
                .clone()
                .or_else(|| cfg.server.dashboard_url.clone()),
        };

        let listen = self.listen.as_deref().unwrap_or(&cfg.server.listen);
        let static_dir = self
            .static_dir
            .clone()
            .or_else(|| cfg.server.static_dir.as_ref().map(PathBuf::from));

        let state = AppState::new(store, verifier, session_config)
            .with_session_ttl(Duration::from_secs(cfg.server.session_ttl_secs));
        start_server(listen, state, static_dir).await
    }
}
