use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::LlmError;
use crate::models::TranscriptSegment;

/// Configuration for the speech-to-text capability
#[derive(Debug, Clone)]
pub struct TranscribeConfig {
    pub base_url: String,
    /// API key (from TRANSCRIBE_API_KEY env var); separate from the chat key
    pub api_key: String,
    pub model: String,
    /// Per-call deadline in seconds
    pub timeout_secs: u64,
}

impl TranscribeConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TRANSCRIBE_API_KEY")
            .context("TRANSCRIBE_API_KEY environment variable not set")?;

        Ok(Self {
            base_url: std::env::var("TRANSCRIBE_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key,
            model: "whisper-1".to_string(),
            timeout_secs: 300,
        })
    }
}

/// The speech-to-text capability: audio in, ordered timestamped segments out.
#[async_trait]
pub trait Transcribe: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, LlmError>;
}

/// HTTP client for a Whisper-style transcription endpoint
pub struct WhisperTranscriber {
    client: Client,
    config: TranscribeConfig,
}

impl WhisperTranscriber {
    pub fn new(config: TranscribeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn send(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, LlmError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| LlmError::Transport(format!("failed to read {:?}: {}", audio, e)))?;

        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        let url = format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let response: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(response
            .segments
            .into_iter()
            .enumerate()
            .map(|(id, s)| TranscriptSegment {
                id,
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl Transcribe for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, LlmError> {
        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, self.send(audio)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.config.timeout_secs)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    segments: Vec<ResponseSegment>,
}

#[derive(Debug, Deserialize)]
struct ResponseSegment {
    start: f64,
    end: f64,
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_segments_map_to_ordered_ids() {
        let json = r#"{
            "text": "hallo daar",
            "segments": [
                {"start": 0.0, "end": 1.2, "text": " hallo "},
                {"start": 1.3, "end": 2.0, "text": "daar"}
            ]
        }"#;
        let response: TranscriptionResponse = serde_json::from_str(json).unwrap();
        let segments: Vec<TranscriptSegment> = response
            .segments
            .into_iter()
            .enumerate()
            .map(|(id, s)| TranscriptSegment {
                id,
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
            })
            .collect();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, 0);
        assert_eq!(segments[0].text, "hallo");
        assert_eq!(segments[1].id, 1);
    }

    #[test]
    fn test_missing_segments_defaults_empty() {
        let response: TranscriptionResponse =
            serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert!(response.segments.is_empty());
    }
}
