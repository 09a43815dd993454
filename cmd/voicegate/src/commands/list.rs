//! `voicegate list`.

use clap::Args;

use super::{get_config, output};
use crate::Cli;
use crate::app::build_store;

/// List registered usernames.
#[derive(Args)]
pub struct ListCommand {
    /// Show each identity's profile
    #[arg(short = 'l', long)]
    long: bool,
}

impl ListCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = build_store(&cfg)?;
        let names = store.list_identities()?;

        if !self.long {
            let names: Vec<_> = names.into_iter().collect();
            return output(cli).write(&names);
        }

        let mut profiles = Vec::with_capacity(names.len());
        for name in &names {
            match store.profile(name) {
                Ok(p) => profiles.push(p),
                Err(e) => tracing::warn!(username = %name, error = %e, "profile unavailable"),
            }
        }
        output(cli).write(&profiles)
    }
}
