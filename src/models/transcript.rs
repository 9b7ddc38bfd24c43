use serde::{Deserialize, Serialize};

/// Raw timestamped unit of transcribed speech, prior to speaker attribution.
/// Immutable output of the transcriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Position in the transcription output (0-based)
    pub id: usize,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

/// Conversation role assigned during diarization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Seller,
    Customer,
}

impl Speaker {
    /// The other speaker, used for the parity fallback
    pub fn other(&self) -> Self {
        match self {
            Speaker::Seller => Speaker::Customer,
            Speaker::Customer => Speaker::Seller,
        }
    }
}

/// A maximal contiguous run of segments attributed to one speaker.
///
/// Invariants maintained by the diarizer: indices are exactly 0..N-1,
/// no two adjacent turns share a speaker, and turn texts concatenated in
/// index order reproduce the segment texts in original order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptTurn {
    /// 0-based, contiguous turn index
    pub index: usize,
    /// Start time in milliseconds (min over member segments)
    pub start_ms: u64,
    /// End time in milliseconds (max over member segments)
    pub end_ms: u64,
    pub speaker: Speaker,
    /// Space-joined member segment texts, in order
    pub text: String,
}

impl TranscriptTurn {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_other() {
        assert_eq!(Speaker::Seller.other(), Speaker::Customer);
        assert_eq!(Speaker::Customer.other(), Speaker::Seller);
    }

    #[test]
    fn test_speaker_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Speaker::Seller).unwrap(), "\"seller\"");
        let s: Speaker = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(s, Speaker::Customer);
    }

    #[test]
    fn test_turn_duration() {
        let turn = TranscriptTurn {
            index: 0,
            start_ms: 500,
            end_ms: 2300,
            speaker: Speaker::Seller,
            text: "hallo".to_string(),
        };
        assert_eq!(turn.duration_ms(), 1800);
    }
}
