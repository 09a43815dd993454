//! `voicegate enroll`.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use voicegate_identity::AudioSample;

use super::{get_config, output, print_success};
use crate::Cli;
use crate::app::build_store;

/// Register a username with a reference recording.
#[derive(Args)]
pub struct EnrollCommand {
    /// Username (case-sensitive)
    username: String,

    /// Reference WAV file
    wav: PathBuf,
}

impl EnrollCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = build_store(&cfg)?;

        let sample = AudioSample::Path(self.wav.clone());
        let profile = store
            .enroll(&self.username, &sample)
            .with_context(|| format!("enroll {:?}", self.username))?;

        output(cli).write(&profile)?;
        print_success(&format!("Enrolled \"{}\"", self.username));
        Ok(())
    }
}
