//! `voicegate remove`.

use clap::Args;

use super::{get_config, print_success};
use crate::Cli;
use crate::app::build_store;

/// Delete a registered identity.
#[derive(Args)]
pub struct RemoveCommand {
    /// Username to delete
    username: String,
}

impl RemoveCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = build_store(&cfg)?;
        store.remove(&self.username)?;
        print_success(&format!("Removed \"{}\"", self.username));
        Ok(())
    }
}
