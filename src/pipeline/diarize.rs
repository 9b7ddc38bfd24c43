use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm::{build_diarize_prompt, extract_json, ChatCompletion, DIARIZE_SYSTEM_PROMPT};
use crate::models::{Speaker, TranscriptSegment, TranscriptTurn};

/// Configuration for the diarizer
#[derive(Debug, Clone)]
pub struct DiarizerConfig {
    /// Segments per classification call, bounding prompt size
    pub chunk_size: usize,
    /// Labels from the previous chunk passed as continuity context
    pub context_labels: usize,
}

impl Default for DiarizerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 80,
            context_labels: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkLabels {
    #[serde(default)]
    labels: Vec<LabelEntry>,
}

#[derive(Debug, Deserialize)]
struct LabelEntry {
    index: usize,
    speaker: Speaker,
}

/// Assign a speaker to every segment and merge same-speaker runs into turns.
///
/// Chunk calls are strictly sequential: chunk N+1 receives the tail of the
/// labels assigned in chunk N as continuity context. A chunk whose response
/// is unusable falls back to alternating speakers by segment-index parity;
/// no call is retried. Zero segments yield zero turns.
pub async fn diarize(
    chat: &dyn ChatCompletion,
    segments: &[TranscriptSegment],
    config: &DiarizerConfig,
) -> Vec<TranscriptTurn> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut labels: Vec<Speaker> = Vec::with_capacity(segments.len());

    for chunk in segments.chunks(config.chunk_size) {
        let context: Vec<(usize, Speaker)> = labels
            .iter()
            .enumerate()
            .rev()
            .take(config.context_labels)
            .map(|(i, &s)| (i, s))
            .rev()
            .collect();

        let prompt = build_diarize_prompt(chunk, &context);
        let chunk_start = labels.len();

        match chat.complete(DIARIZE_SYSTEM_PROMPT, &prompt).await {
            Ok(response) => match extract_json::<ChunkLabels>(&response) {
                Ok(parsed) => {
                    apply_chunk_labels(&mut labels, chunk, chunk_start, &parsed);
                }
                Err(e) => {
                    warn!("diarization chunk at {} unparsable ({}), using parity fallback", chunk_start, e);
                    apply_parity_fallback(&mut labels, chunk_start, chunk.len());
                }
            },
            Err(e) => {
                warn!("diarization chunk at {} failed ({}), using parity fallback", chunk_start, e);
                apply_parity_fallback(&mut labels, chunk_start, chunk.len());
            }
        }
    }

    debug!("diarized {} segments into labels", labels.len());
    merge_turns(segments, &labels)
}

/// Apply a parsed chunk response. Indices the model did not resolve fall
/// back to the label of the immediately preceding index (Seller at index 0).
fn apply_chunk_labels(
    labels: &mut Vec<Speaker>,
    chunk: &[TranscriptSegment],
    chunk_start: usize,
    parsed: &ChunkLabels,
) {
    for (offset, segment) in chunk.iter().enumerate() {
        let global_index = chunk_start + offset;
        let resolved = parsed
            .labels
            .iter()
            .find(|l| l.index == segment.id || l.index == global_index)
            .map(|l| l.speaker);

        let label = match resolved {
            Some(speaker) => speaker,
            None => match global_index {
                0 => Speaker::Seller,
                i => labels[i - 1],
            },
        };
        labels.push(label);
    }
}

/// Deterministic whole-chunk fallback: even segment index Seller, odd Customer.
fn apply_parity_fallback(labels: &mut Vec<Speaker>, chunk_start: usize, chunk_len: usize) {
    for offset in 0..chunk_len {
        let global_index = chunk_start + offset;
        labels.push(if global_index % 2 == 0 {
            Speaker::Seller
        } else {
            Speaker::Customer
        });
    }
}

/// Merge adjacent same-speaker segments into turns.
///
/// Turn bounds are the min start / max end of member segments in
/// milliseconds; turn text is the space-joined member texts in order.
pub fn merge_turns(segments: &[TranscriptSegment], labels: &[Speaker]) -> Vec<TranscriptTurn> {
    let mut turns: Vec<TranscriptTurn> = Vec::new();

    for (segment, &speaker) in segments.iter().zip(labels.iter()) {
        let start_ms = (segment.start * 1000.0).round() as u64;
        let end_ms = (segment.end * 1000.0).round() as u64;

        match turns.last_mut() {
            Some(last) if last.speaker == speaker => {
                last.start_ms = last.start_ms.min(start_ms);
                last.end_ms = last.end_ms.max(end_ms);
                last.text.push(' ');
                last.text.push_str(&segment.text);
            }
            _ => {
                turns.push(TranscriptTurn {
                    index: turns.len(),
                    start_ms,
                    end_ms,
                    speaker,
                    text: segment.text.clone(),
                });
            }
        }
    }

    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::chat::testing::ScriptedChat;

    fn segment(id: usize, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id,
            start: id as f64,
            end: id as f64 + 0.9,
            text: text.to_string(),
        }
    }

    fn labels_json(pairs: &[(usize, &str)]) -> String {
        let entries: Vec<String> = pairs
            .iter()
            .map(|(i, s)| format!("{{\"index\": {}, \"speaker\": \"{}\"}}", i, s))
            .collect();
        format!("{{\"labels\": [{}]}}", entries.join(","))
    }

    #[test]
    fn test_merge_turns_invariants() {
        let segments = vec![
            segment(0, "Goedemorgen"),
            segment(1, "met Jan"),
            segment(2, "Hallo"),
            segment(3, "Zeg het maar"),
        ];
        let labels = vec![
            Speaker::Seller,
            Speaker::Seller,
            Speaker::Customer,
            Speaker::Seller,
        ];
        let turns = merge_turns(&segments, &labels);

        // indices are exactly 0..N-1
        for (i, turn) in turns.iter().enumerate() {
            assert_eq!(turn.index, i);
        }
        // no two adjacent turns share a speaker
        for pair in turns.windows(2) {
            assert_ne!(pair[0].speaker, pair[1].speaker);
        }
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].text, "Goedemorgen met Jan");
        assert_eq!(turns[0].start_ms, 0);
        assert_eq!(turns[0].end_ms, 1900);
    }

    #[test]
    fn test_merge_turns_conserves_text() {
        let segments = vec![
            segment(0, "een"),
            segment(1, "twee"),
            segment(2, "drie"),
            segment(3, "vier"),
        ];
        let labels = vec![
            Speaker::Seller,
            Speaker::Customer,
            Speaker::Customer,
            Speaker::Seller,
        ];
        let turns = merge_turns(&segments, &labels);

        let joined_turns = turns
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let joined_segments = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(joined_turns, joined_segments);
    }

    #[tokio::test]
    async fn test_diarize_empty_segments() {
        let chat = ScriptedChat::new(vec![]);
        let turns = diarize(&chat, &[], &DiarizerConfig::default()).await;
        assert!(turns.is_empty());
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_diarize_labels_from_response() {
        let segments = vec![
            segment(0, "Goedemorgen, met Jan van Acme."),
            segment(1, "Hallo, u spreekt met Piet."),
            segment(2, "Fijn dat u tijd heeft."),
        ];
        let chat = ScriptedChat::new(vec![Ok(labels_json(&[
            (0, "seller"),
            (1, "customer"),
            (2, "seller"),
        ]))]);

        let turns = diarize(&chat, &segments, &DiarizerConfig::default()).await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].speaker, Speaker::Seller);
        assert_eq!(turns[1].speaker, Speaker::Customer);
        assert_eq!(turns[2].speaker, Speaker::Seller);
    }

    #[tokio::test]
    async fn test_unresolved_index_falls_back_to_preceding_label() {
        let segments = vec![segment(0, "Hallo"), segment(1, "Dag"), segment(2, "Zo")];
        // index 1 missing from the response
        let chat = ScriptedChat::new(vec![Ok(labels_json(&[(0, "customer"), (2, "seller")]))]);

        let turns = diarize(&chat, &segments, &DiarizerConfig::default()).await;
        // segment 1 inherits customer from segment 0, then merges with it
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, Speaker::Customer);
        assert_eq!(turns[0].text, "Hallo Dag");
    }

    #[tokio::test]
    async fn test_unparsable_chunk_uses_parity_fallback() {
        let segments = vec![
            segment(0, "a"),
            segment(1, "b"),
            segment(2, "c"),
            segment(3, "d"),
        ];
        let chat = ScriptedChat::new(vec![Ok("dit is geen json".to_string())]);

        let turns = diarize(&chat, &segments, &DiarizerConfig::default()).await;
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].speaker, Speaker::Seller);
        assert_eq!(turns[1].speaker, Speaker::Customer);
        assert_eq!(turns[2].speaker, Speaker::Seller);
        assert_eq!(turns[3].speaker, Speaker::Customer);
        // no retry
        assert_eq!(chat.call_count(), 1);
    }

    #[tokio::test]
    async fn test_chunked_calls_are_sequential_with_continuity() {
        let segments: Vec<TranscriptSegment> =
            (0..5).map(|i| segment(i, "tekst")).collect();
        let config = DiarizerConfig {
            chunk_size: 3,
            context_labels: 3,
        };
        let chat = ScriptedChat::new(vec![
            Ok(labels_json(&[(0, "seller"), (1, "customer"), (2, "customer")])),
            // second chunk leaves both indices unresolved; they inherit
            // from the previous chunk's last label
            Ok(labels_json(&[])),
        ]);

        let turns = diarize(&chat, &segments, &config).await;
        assert_eq!(chat.call_count(), 2);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].speaker, Speaker::Customer);
        assert_eq!(turns[1].text, "tekst tekst tekst tekst");
    }

    #[tokio::test]
    async fn test_call_failure_uses_parity_fallback() {
        let segments = vec![segment(0, "a"), segment(1, "b")];
        let chat = ScriptedChat::new(vec![Err(LlmError::Timeout(60))]);

        let turns = diarize(&chat, &segments, &DiarizerConfig::default()).await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, Speaker::Seller);
        assert_eq!(turns[1].speaker, Speaker::Customer);
    }
}
