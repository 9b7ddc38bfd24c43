use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::llm::{ChatCompletion, Transcribe};
use crate::models::{
    AnalysisInsights, AnalysisJob, CustomerSignal, FullAnalysisResult, JobStatus, TranscriptTurn,
    TurnEvaluation,
};
use crate::pipeline::{
    detect_opportunities, detect_signals, diarize, evaluate_turns, score_coverage,
    synthesize_report, DiarizerConfig, EvaluatorConfig, SignalConfig,
};

use super::JobStore;

/// Per-stage configuration for one pipeline execution
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub diarizer: DiarizerConfig,
    pub evaluator: EvaluatorConfig,
    pub signals: SignalConfig,
}

/// Response to a poll on a job id
#[derive(Debug)]
pub enum PollResponse {
    /// Job is still running; carries the human-readable stage label
    Processing {
        status: JobStatus,
        stage_label: &'static str,
    },
    Completed(Box<FullAnalysisResult>),
    Failed {
        error: String,
    },
    NotFound,
}

/// Sequences the pipeline stages for analysis jobs and exposes
/// create/poll to external collaborators.
///
/// Each job runs on its own spawned task; the only intra-job parallelism
/// is the evaluating stage, where technique evaluation and signal
/// detection run concurrently and join before scoring.
#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<JobStore>,
    chat: Arc<dyn ChatCompletion>,
    transcriber: Arc<dyn Transcribe>,
    config: PipelineConfig,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<JobStore>,
        chat: Arc<dyn ChatCompletion>,
        transcriber: Arc<dyn Transcribe>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            chat,
            transcriber,
            config,
        }
    }

    /// Create a job and start processing asynchronously.
    /// Returns the job id immediately.
    pub fn create(&self, user_id: &str, title: &str, audio_path: PathBuf) -> Uuid {
        let job = AnalysisJob::new(user_id, title);
        let id = job.id;
        self.store.insert(job);

        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run_job(id, audio_path).await;
        });

        id
    }

    /// Poll a job: stage label while running, the full result once
    /// completed, only the error message once failed.
    pub fn poll(&self, id: Uuid) -> PollResponse {
        let Some(job) = self.store.get(id) else {
            return PollResponse::NotFound;
        };

        match job.status {
            JobStatus::Completed => match self.store.result(id) {
                Some(result) => PollResponse::Completed(Box::new(result)),
                None => PollResponse::Failed {
                    error: "result missing for completed job".to_string(),
                },
            },
            JobStatus::Failed => PollResponse::Failed {
                error: job.error.unwrap_or_else(|| "unknown error".to_string()),
            },
            status => PollResponse::Processing {
                status,
                stage_label: status.stage_label(),
            },
        }
    }

    /// Drive one job through the state machine. Any stage error moves the
    /// job to failed with the message captured verbatim; no further stage
    /// runs and no partial results are exposed.
    async fn run_job(&self, id: Uuid, audio_path: PathBuf) {
        match self.run_stages(id, audio_path).await {
            Ok((turns, evaluations, signals, insights)) => {
                info!(job = %id, "analysis completed");
                let job = match self.store.get(id) {
                    Some(job) => job,
                    None => return,
                };
                self.store.complete(
                    id,
                    FullAnalysisResult {
                        job,
                        turns,
                        evaluations,
                        signals,
                        insights,
                    },
                );
            }
            Err(e) => {
                warn!(job = %id, "analysis failed: {}", e);
                self.store.fail(id, e.to_string());
            }
        }
    }

    async fn run_stages(
        &self,
        id: Uuid,
        audio_path: PathBuf,
    ) -> Result<
        (
            Vec<TranscriptTurn>,
            Vec<TurnEvaluation>,
            Vec<CustomerSignal>,
            AnalysisInsights,
        ),
        PipelineError,
    > {
        // transcribing
        let segments = self
            .transcriber
            .transcribe(&audio_path)
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;
        info!(job = %id, "transcribed {} segments", segments.len());

        // the upload is cleaned up only on successful transcription
        if let Err(e) = std::fs::remove_file(&audio_path) {
            warn!(job = %id, "could not remove upload {:?}: {}", audio_path, e);
        }

        // analyzing
        self.store.set_status(id, JobStatus::Analyzing);
        let turns = diarize(self.chat.as_ref(), &segments, &self.config.diarizer).await;
        if turns.is_empty() {
            return Err(PipelineError::NoSpeechDetected);
        }
        info!(job = %id, "diarized into {} turns", turns.len());

        // evaluating: technique evaluation and signal detection run
        // concurrently and join here
        self.store.set_status(id, JobStatus::Evaluating);
        let (evaluations, signals) = tokio::join!(
            evaluate_turns(Arc::clone(&self.chat), &turns, &self.config.evaluator),
            detect_signals(self.chat.as_ref(), &turns, &self.config.signals),
        );

        // generating_report
        self.store.set_status(id, JobStatus::GeneratingReport);
        let coverage = score_coverage(&evaluations, &turns);
        let opportunities =
            detect_opportunities(self.chat.as_ref(), &evaluations, &signals, &turns).await;
        let insights = synthesize_report(
            self.chat.as_ref(),
            &turns,
            &evaluations,
            &signals,
            coverage,
            opportunities,
        )
        .await;

        Ok((turns, evaluations, signals, insights))
    }
}
