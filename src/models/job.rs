use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AnalysisInsights, CustomerSignal, TranscriptTurn, TurnEvaluation};

/// Processing state of an analysis job.
///
/// States advance in strict linear order; `Failed` is reachable from any
/// non-terminal state. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Transcribing,
    Analyzing,
    Evaluating,
    GeneratingReport,
    Completed,
    Failed,
}

impl JobStatus {
    /// Human-readable stage label shown to polling clients
    pub fn stage_label(&self) -> &'static str {
        match self {
            JobStatus::Transcribing => "Audio wordt getranscribeerd",
            JobStatus::Analyzing => "Gesprek wordt geanalyseerd",
            JobStatus::Evaluating => "Technieken worden beoordeeld",
            JobStatus::GeneratingReport => "Rapport wordt opgesteld",
            JobStatus::Completed => "Analyse afgerond",
            JobStatus::Failed => "Analyse mislukt",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position in the linear state order, used to assert monotonic progress
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Transcribing => 0,
            JobStatus::Analyzing => 1,
            JobStatus::Evaluating => 2,
            JobStatus::GeneratingReport => 3,
            JobStatus::Completed => 4,
            JobStatus::Failed => 5,
        }
    }
}

/// One analysis job. Created on upload; mutated only by its own
/// orchestrator invocation; terminal once completed or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub job_type: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisJob {
    pub fn new(user_id: &str, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            job_type: "sales_call".to_string(),
            status: JobStatus::Transcribing,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// Aggregate produced once at job completion; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysisResult {
    pub job: AnalysisJob,
    pub turns: Vec<TranscriptTurn>,
    pub evaluations: Vec<TurnEvaluation>,
    pub signals: Vec<CustomerSignal>,
    pub insights: AnalysisInsights,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ranks_are_monotonic() {
        let order = [
            JobStatus::Transcribing,
            JobStatus::Analyzing,
            JobStatus::Evaluating,
            JobStatus::GeneratingReport,
            JobStatus::Completed,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Evaluating.is_terminal());
    }

    #[test]
    fn test_new_job_starts_transcribing() {
        let job = AnalysisJob::new("user-1", "Demo call");
        assert_eq!(job.status, JobStatus::Transcribing);
        assert!(job.error.is_none());
        assert!(job.completed_at.is_none());
    }
}
