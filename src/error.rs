use thiserror::Error;

/// Fatal pipeline errors. Any of these aborts the job and moves it to
/// the `failed` state with the message captured verbatim.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source file missing/unreadable or the transcription capability failed
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Diarization produced zero turns
    #[error("no speech detected")]
    NoSpeechDetected,

    /// Uncaught failure inside a pipeline stage
    #[error("{stage} stage failed: {message}")]
    Stage { stage: &'static str, message: String },
}

/// Per-call errors from the chat/transcription capabilities.
///
/// These never abort a job: every call site absorbs them into a
/// [`CallOutcome::Fallback`](crate::llm::CallOutcome) with a documented
/// safe default.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("call exceeded deadline of {0}s")]
    Timeout(u64),

    /// Malformed or schema-invalid JSON in a model response
    #[error("response failed schema validation: {0}")]
    Parse(String),

    #[error("response contained no usable content")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_speech_message() {
        let err = PipelineError::NoSpeechDetected;
        assert_eq!(err.to_string(), "no speech detected");
    }

    #[test]
    fn test_stage_message_captured_verbatim() {
        let err = PipelineError::Stage {
            stage: "evaluating",
            message: "boom".to_string(),
        };
        assert!(err.to_string().contains("evaluating"));
        assert!(err.to_string().contains("boom"));
    }
}
