use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::error::LlmError;
use crate::llm::{
    build_evaluate_prompt, extract_json, CallOutcome, ChatCompletion, EVALUATE_SYSTEM_PROMPT,
};
use crate::models::{
    Speaker, TechniqueDetection, TechniqueQuality, TranscriptTurn, TurnEvaluation,
};

/// Configuration for the technique evaluator
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Maximum concurrent evaluation calls
    pub max_in_flight: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self { max_in_flight: 4 }
    }
}

/// Rationale used when a call fails or its response is unusable
const GENERIC_RATIONALE: &str = "Automatische beoordeling was niet beschikbaar voor deze beurt.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvalResponse {
    #[serde(default)]
    detections: Vec<RawDetection>,
    #[serde(default)]
    overall_quality: TechniqueQuality,
    #[serde(default)]
    rationale: String,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    #[serde(default = "unknown_id")]
    id: String,
    #[serde(default = "unknown_name")]
    name: String,
    #[serde(default)]
    quality: TechniqueQuality,
    #[serde(default)]
    steps: Option<Vec<String>>,
}

fn unknown_id() -> String {
    "0".to_string()
}

fn unknown_name() -> String {
    "Onbekend".to_string()
}

/// Evaluate every seller turn against the technique catalog.
///
/// Calls run on a bounded worker pool (`max_in_flight`); results are
/// materialized in ascending turn-index order regardless of completion
/// order. A failing call degrades only its own turn to an empty
/// detection with a generic rationale. No call is retried.
pub async fn evaluate_turns(
    chat: Arc<dyn ChatCompletion>,
    turns: &[TranscriptTurn],
    config: &EvaluatorConfig,
) -> Vec<TurnEvaluation> {
    let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let mut handles = Vec::new();

    for turn in turns.iter().filter(|t| t.speaker == Speaker::Seller) {
        let preceding = turns
            .iter()
            .take(turn.index)
            .rev()
            .find(|t| t.speaker == Speaker::Customer)
            .map(|t| t.text.clone());

        let prompt = build_evaluate_prompt(&turn.text, preceding.as_deref());
        let turn_index = turn.index;
        let chat = Arc::clone(&chat);
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire().await;
            evaluate_one(chat.as_ref(), turn_index, &prompt).await
        });
        handles.push((turn_index, handle));
    }

    let mut evaluations = Vec::with_capacity(handles.len());
    for (turn_index, handle) in handles {
        match handle.await {
            Ok(outcome) => {
                if outcome.is_fallback() {
                    warn!("evaluation call for turn {} degraded to fallback", turn_index);
                }
                evaluations.push(outcome.into_value());
            }
            Err(e) => {
                // a panicked task still yields its turn, degraded
                warn!("evaluation task for turn {} panicked: {}", turn_index, e);
                evaluations.push(empty_evaluation(turn_index));
            }
        }
    }

    evaluations.sort_by_key(|e| e.turn_index);
    evaluations
}

async fn evaluate_one(
    chat: &dyn ChatCompletion,
    turn_index: usize,
    prompt: &str,
) -> CallOutcome<TurnEvaluation> {
    let parsed: Result<EvalResponse, LlmError> = match chat
        .complete(EVALUATE_SYSTEM_PROMPT, prompt)
        .await
    {
        Ok(response) => extract_json(&response),
        Err(e) => Err(e),
    };

    match parsed {
        Ok(response) => CallOutcome::Success(build_evaluation(turn_index, response)),
        Err(cause) => CallOutcome::Fallback {
            value: empty_evaluation(turn_index),
            cause,
        },
    }
}

fn build_evaluation(turn_index: usize, response: EvalResponse) -> TurnEvaluation {
    let detections: Vec<TechniqueDetection> = response
        .detections
        .into_iter()
        .take(2)
        .map(|d| TechniqueDetection {
            score: d.quality.score(),
            technique_id: d.id,
            name: d.name,
            quality: d.quality,
            steps_followed: d.steps,
        })
        .collect();

    let rationale = if response.rationale.is_empty() {
        GENERIC_RATIONALE.to_string()
    } else {
        response.rationale
    };

    TurnEvaluation {
        turn_index,
        detections,
        overall_quality: response.overall_quality,
        rationale,
    }
}

fn empty_evaluation(turn_index: usize) -> TurnEvaluation {
    TurnEvaluation {
        turn_index,
        detections: Vec::new(),
        overall_quality: TechniqueQuality::Gemist,
        rationale: GENERIC_RATIONALE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::testing::{MatchChat, ScriptedChat};

    fn turn(index: usize, speaker: Speaker, text: &str) -> TranscriptTurn {
        TranscriptTurn {
            index,
            start_ms: index as u64 * 1000,
            end_ms: index as u64 * 1000 + 900,
            speaker,
            text: text.to_string(),
        }
    }

    const GOOD_RESPONSE: &str = r#"{
        "detections": [
            {"id": "2.1", "name": "Probleemvraag", "quality": "goed", "steps": ["open vraag"]},
            {"id": "1.2", "name": "Doorvragen op context", "quality": "bijna"},
            {"id": "1.1", "name": "Te veel", "quality": "perfect"}
        ],
        "overallQuality": "goed",
        "rationale": "Sterke probleemvraag."
    }"#;

    #[tokio::test]
    async fn test_only_seller_turns_evaluated() {
        let turns = vec![
            turn(0, Speaker::Seller, "Waar loopt u tegenaan?"),
            turn(1, Speaker::Customer, "Vooral de doorlooptijd."),
            turn(2, Speaker::Seller, "Hoeveel tijd kost dat?"),
        ];
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok(GOOD_RESPONSE.to_string()),
            Ok(GOOD_RESPONSE.to_string()),
        ]));

        let config = EvaluatorConfig { max_in_flight: 1 };
        let evaluations = evaluate_turns(chat.clone(), &turns, &config).await;

        assert_eq!(evaluations.len(), 2);
        assert_eq!(evaluations[0].turn_index, 0);
        assert_eq!(evaluations[1].turn_index, 2);
        assert_eq!(chat.call_count(), 2);
    }

    #[tokio::test]
    async fn test_detections_capped_at_two_with_scores() {
        let turns = vec![turn(0, Speaker::Seller, "Waar loopt u tegenaan?")];
        let chat = Arc::new(ScriptedChat::new(vec![Ok(GOOD_RESPONSE.to_string())]));

        let evaluations =
            evaluate_turns(chat, &turns, &EvaluatorConfig::default()).await;

        let eval = &evaluations[0];
        assert_eq!(eval.detections.len(), 2);
        assert_eq!(eval.detections[0].technique_id, "2.1");
        assert_eq!(eval.detections[0].score, 7);
        assert_eq!(eval.detections[1].score, 4);
        assert_eq!(eval.rationale, "Sterke probleemvraag.");
    }

    #[tokio::test]
    async fn test_missing_fields_get_defaults() {
        let turns = vec![turn(0, Speaker::Seller, "Zomaar iets.")];
        let response = r#"{"detections": [{}], "overallQuality": "gemist"}"#;
        let chat = Arc::new(ScriptedChat::new(vec![Ok(response.to_string())]));

        let evaluations =
            evaluate_turns(chat, &turns, &EvaluatorConfig::default()).await;

        let detection = &evaluations[0].detections[0];
        assert_eq!(detection.technique_id, "0");
        assert_eq!(detection.name, "Onbekend");
        assert_eq!(detection.quality, TechniqueQuality::Gemist);
        assert_eq!(detection.score, 0);
    }

    #[tokio::test]
    async fn test_failing_call_isolated_per_turn() {
        let turns = vec![
            turn(0, Speaker::Seller, "eerste vraag"),
            turn(1, Speaker::Customer, "antwoord"),
            turn(2, Speaker::Seller, "tweede vraag"),
        ];
        // first call fails, second succeeds; MatchChat keys on the prompt
        // so ordering stays deterministic under concurrency
        let chat = Arc::new(MatchChat::new(vec![
            ("eerste vraag", Err(LlmError::Timeout(60))),
            ("tweede vraag", Ok(GOOD_RESPONSE.to_string())),
        ]));

        let evaluations =
            evaluate_turns(chat, &turns, &EvaluatorConfig::default()).await;

        assert_eq!(evaluations.len(), 2);
        assert!(evaluations[0].detections.is_empty());
        assert_eq!(evaluations[0].overall_quality, TechniqueQuality::Gemist);
        assert_eq!(evaluations[0].rationale, GENERIC_RATIONALE);
        assert_eq!(evaluations[1].detections.len(), 2);
    }

    #[tokio::test]
    async fn test_panicking_call_still_yields_turn() {
        use async_trait::async_trait;

        struct PanickingChat;

        #[async_trait]
        impl ChatCompletion for PanickingChat {
            async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
                panic!("kapot");
            }
        }

        let turns = vec![
            turn(0, Speaker::Seller, "eerste vraag"),
            turn(1, Speaker::Customer, "antwoord"),
        ];

        let evaluations =
            evaluate_turns(Arc::new(PanickingChat), &turns, &EvaluatorConfig::default()).await;

        assert_eq!(evaluations.len(), 1);
        assert_eq!(evaluations[0].turn_index, 0);
        assert!(evaluations[0].detections.is_empty());
        assert_eq!(evaluations[0].rationale, GENERIC_RATIONALE);
    }

    #[tokio::test]
    async fn test_output_ordered_by_turn_index_under_concurrency() {
        let turns: Vec<TranscriptTurn> = (0..6)
            .map(|i| {
                let speaker = if i % 2 == 0 { Speaker::Seller } else { Speaker::Customer };
                turn(i, speaker, &format!("beurt {}", i))
            })
            .collect();
        let chat = Arc::new(MatchChat::new(vec![
            ("beurt 0", Ok(GOOD_RESPONSE.to_string())),
            ("beurt 2", Ok(GOOD_RESPONSE.to_string())),
            ("beurt 4", Ok(GOOD_RESPONSE.to_string())),
        ]));

        let config = EvaluatorConfig { max_in_flight: 3 };
        let evaluations = evaluate_turns(chat, &turns, &config).await;

        let indices: Vec<usize> = evaluations.iter().map(|e| e.turn_index).collect();
        assert_eq!(indices, vec![0, 2, 4]);
    }
}
