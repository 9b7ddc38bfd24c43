pub mod catalog;
pub mod error;
pub mod job;
pub mod llm;
pub mod models;
pub mod pipeline;

pub use error::{LlmError, PipelineError};
pub use job::{store_upload, JobOrchestrator, JobStore, PipelineConfig, PollResponse};
pub use llm::{
    ChatClient, ChatCompletion, ChatConfig, Transcribe, TranscribeConfig, WhisperTranscriber,
};
pub use models::{
    AnalysisInsights, AnalysisJob, EpicCoverage, FullAnalysisResult, JobStatus, MissedOpportunity,
    TranscriptSegment, TranscriptTurn,
};
pub use pipeline::{
    detect_opportunities, detect_signals, diarize, evaluate_turns, score_coverage,
    synthesize_report, DiarizerConfig, EvaluatorConfig, SignalConfig,
};
