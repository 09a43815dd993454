//! `voicegate verify`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use serde::Serialize;
use voicegate_cli::validate_threshold;
use voicegate_identity::AudioSample;

use super::{get_config, output, print_error, print_success};
use crate::Cli;
use crate::app::build_verifier;

/// Compare a challenge recording against a reference recording.
///
/// Exits with status 1 when the speakers do not match.
#[derive(Args)]
pub struct VerifyCommand {
    /// Reference (enrollment) WAV file
    reference: PathBuf,

    /// Challenge WAV file
    challenge: PathBuf,

    /// Override the decision threshold
    #[arg(long)]
    threshold: Option<f32>,
}

#[derive(Serialize)]
struct VerifyReport {
    model: String,
    score: f32,
    threshold: f32,
    same_speaker: bool,
    message: &'static str,
}

impl VerifyCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<ExitCode> {
        if let Some(t) = self.threshold {
            validate_threshold(t).map_err(|e| anyhow::anyhow!("--threshold: {e}"))?;
        }
        let cfg = get_config(cli)?;
        let mut verifier = build_verifier(&cfg.model)?;
        if let Some(t) = self.threshold {
            verifier = verifier.with_threshold(t);
        }

        let reference = AudioSample::Path(self.reference.clone());
        let challenge = AudioSample::Path(self.challenge.clone());
        let worker = verifier.clone();
        let result =
            tokio::task::spawn_blocking(move || worker.verify(&reference, &challenge)).await??;

        let outcome = result.outcome();
        output(cli).write(&VerifyReport {
            model: verifier.model().name().to_string(),
            score: result.score,
            threshold: result.threshold,
            same_speaker: result.same_speaker,
            message: outcome.message(),
        })?;

        if result.same_speaker {
            print_success(outcome.message());
            Ok(ExitCode::SUCCESS)
        } else {
            print_error(outcome.message());
            Ok(ExitCode::FAILURE)
        }
    }
}
