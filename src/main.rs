use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::Path;

use simscribe::cli::CliArgs;
use simscribe::reconcile::reconcile;
use simscribe::settings::{Settings, TranscriptionMode};
use simscribe::transcript::ReconciledLine;
use simscribe::transcription::backend_from_settings;
use simscribe::{run_pipeline_for_file, score_empathy, SourceTranscript};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logger(args.debug);

    let settings = build_settings(&args)?;
    let backend = backend_from_settings(&settings.transcription, &settings.language)?;

    let mut transcripts: Vec<SourceTranscript> = Vec::new();
    let mut failed = 0usize;
    for input in &args.inputs {
        match run_pipeline_for_file(input, backend.as_ref(), &settings).await {
            Ok(transcript) => {
                info!("{}: {} line(s)", input.display(), transcript.len());
                transcripts.push(transcript);
            }
            Err(e) => {
                failed += 1;
                error!("{}: {}", input.display(), e);
            }
        }
    }
    if transcripts.is_empty() && failed > 0 {
        bail!("all {} input file(s) failed", failed);
    }

    let reconciled = reconcile(&transcripts, &settings.chat)
        .await
        .context("merging the source transcripts failed")?;
    write_transcript(&args.output, &reconciled)?;
    info!(
        "Wrote {} reconciled line(s) to {}",
        reconciled.len(),
        args.output.display()
    );

    if args.score {
        let verdict = score_empathy(&reconciled, &settings.chat)
            .await
            .context("scoring failed (the merged transcript was already written)")?;
        println!("{}", verdict.as_line());
    }

    Ok(())
}

fn init_logger(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn build_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(mode) = &args.mode {
        settings.transcription.mode = match mode.as_str() {
            "cloud" => TranscriptionMode::Cloud,
            "local" => TranscriptionMode::Local,
            other => bail!("unknown transcription mode {:?} (expected cloud or local)", other),
        };
    }
    if let Some(api_key) = &args.api_key {
        settings.transcription.api_key = Some(api_key.clone());
        settings.chat.api_key = Some(api_key.clone());
    }
    if let Some(chunk_length) = args.chunk_length {
        settings.chunk_length_seconds = chunk_length;
    }
    if let Some(language) = &args.language {
        settings.language = language.clone();
    }
    Ok(settings)
}

fn write_transcript(path: &Path, reconciled: &[ReconciledLine]) -> Result<()> {
    let mut out = format!(
        "# Reconciled transcript, generated {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for line in reconciled {
        out.push_str(&line.render());
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
