use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use epicoach::{
    store_upload, ChatClient, ChatConfig, JobOrchestrator, JobStore, PipelineConfig, PollResponse,
    TranscribeConfig, WhisperTranscriber,
};

#[derive(Parser)]
#[command(name = "epicoach")]
#[command(author, version, about = "Sales conversation analysis pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a recorded sales conversation and write the coaching report
    Analyze {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// User id owning the analysis
        #[arg(short, long)]
        user: String,

        /// Job title
        #[arg(short, long, default_value = "Verkoopgesprek")]
        title: String,

        /// Output file for the analysis result (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Directory where uploads are stored during processing
        #[arg(long, default_value = "uploads")]
        upload_dir: PathBuf,

        /// Maximum concurrent technique-evaluation calls
        #[arg(long, default_value = "4")]
        max_in_flight: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            user,
            title,
            output,
            upload_dir,
            max_in_flight,
            verbose,
        } => {
            setup_logging(verbose);
            analyze(input, user, title, output, upload_dir, max_in_flight).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn analyze(
    input: PathBuf,
    user: String,
    title: String,
    output: PathBuf,
    upload_dir: PathBuf,
    max_in_flight: usize,
) -> Result<()> {
    let chat_config = ChatConfig::from_env()?;
    let transcribe_config = TranscribeConfig::from_env()?;

    let mut pipeline_config = PipelineConfig::default();
    pipeline_config.evaluator.max_in_flight = max_in_flight;

    let orchestrator = JobOrchestrator::new(
        Arc::new(JobStore::new()),
        Arc::new(ChatClient::new(chat_config)),
        Arc::new(WhisperTranscriber::new(transcribe_config)),
        pipeline_config,
    );

    info!("Storing upload from {:?}", input);
    let stored = store_upload(&upload_dir, &user, &input).context("Failed to store upload")?;

    let id = orchestrator.create(&user, &title, stored);
    info!("Created job {}", id);

    let mut last_label = "";
    let result = loop {
        match orchestrator.poll(id) {
            PollResponse::Processing { stage_label, .. } => {
                if stage_label != last_label {
                    info!("{}", stage_label);
                    last_label = stage_label;
                }
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            PollResponse::Completed(result) => break *result,
            PollResponse::Failed { error } => {
                anyhow::bail!("Analysis failed: {}", error);
            }
            PollResponse::NotFound => {
                anyhow::bail!("Job {} disappeared from the store", id);
            }
        }
    };

    info!(
        "Overall score {} with {} missed opportunities",
        result.insights.overall_score,
        result.insights.opportunities.len()
    );

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write output to {:?}", output))?;
    info!("Report written to {:?}", output);

    Ok(())
}
