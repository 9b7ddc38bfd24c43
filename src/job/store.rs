use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{AnalysisJob, FullAnalysisResult, JobStatus};

/// Keyed repository for jobs and their results.
///
/// Callers construct one and share it via `Arc`; tests build their own
/// instance instead of relying on process-wide state. Discipline: only a
/// job's own orchestrator invocation mutates its key, so the concurrent
/// map's per-key guarantees are all the locking needed.
#[derive(Default)]
pub struct JobStore {
    jobs: DashMap<Uuid, AnalysisJob>,
    results: DashMap<Uuid, FullAnalysisResult>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: AnalysisJob) {
        self.jobs.insert(job.id, job);
    }

    pub fn get(&self, id: Uuid) -> Option<AnalysisJob> {
        self.jobs.get(&id).map(|j| j.clone())
    }

    /// Advance a non-terminal job to the next stage
    pub fn set_status(&self, id: Uuid, status: JobStatus) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            if !job.status.is_terminal() {
                job.status = status;
            }
        }
    }

    /// Move a job to the failed terminal state with the captured message
    pub fn fail(&self, id: Uuid, message: String) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.status = JobStatus::Failed;
            job.error = Some(message);
            job.completed_at = Some(Utc::now());
        }
    }

    /// Move a job to the completed terminal state and persist its result.
    /// The result is stored before the status flips, so a concurrent poller
    /// that observes `Completed` can always read the result.
    pub fn complete(&self, id: Uuid, mut result: FullAnalysisResult) {
        let Some(job) = self.get(id) else {
            return;
        };
        let mut completed = job;
        completed.status = JobStatus::Completed;
        completed.completed_at = Some(Utc::now());

        result.job = completed.clone();
        self.results.insert(id, result);
        self.jobs.insert(id, completed);
    }

    /// The full result, available only once the job completed
    pub fn result(&self, id: Uuid) -> Option<FullAnalysisResult> {
        self.results.get(&id).map(|r| r.clone())
    }
}
