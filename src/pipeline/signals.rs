use serde::Deserialize;
use tracing::warn;

use crate::catalog::techniques_for_attitude;
use crate::llm::{build_signal_prompt, extract_json, ChatCompletion, SIGNAL_SYSTEM_PROMPT};
use crate::models::{CustomerAttitude, CustomerSignal, Speaker, TranscriptTurn};

/// Configuration for the signal detector
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Minimum text length before an unmatched turn escalates to the LLM
    pub escalation_min_chars: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            escalation_min_chars: 20,
        }
    }
}

/// Confidence assigned to a keyword-table match
const KEYWORD_CONFIDENCE: f64 = 0.9;
/// Confidence for short unmatched turns that never escalate
const SHORT_NEUTRAL_CONFIDENCE: f64 = 0.5;
/// Confidence for the failure default
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Keyword tables per attitude, checked in declaration order;
/// the first matching category wins ties.
const ATTITUDE_KEYWORDS: &[(CustomerAttitude, &[&str])] = &[
    (
        CustomerAttitude::Vraag,
        &["?", "hoe werkt", "wat kost", "wat bedoelt", "kunt u uitleggen"],
    ),
    (
        CustomerAttitude::Twijfel,
        &["twijfel", "weet niet", "niet zeker", "lastig te zeggen", "misschien"],
    ),
    (
        CustomerAttitude::Bezwaar,
        &["te duur", "geen budget", "werkt niet", "niet nodig", "slechte ervaring"],
    ),
    (
        CustomerAttitude::Uitstel,
        &["later", "volgend kwartaal", "kom ik op terug", "eerst intern"],
    ),
    (
        CustomerAttitude::Interesse,
        &["interessant", "vertel eens", "klinkt goed", "meer weten", "benieuwd"],
    ),
    (
        CustomerAttitude::Akkoord,
        &["akkoord", "doen we", "mee eens", "plan maar in", "prima voorstel"],
    ),
];

#[derive(Debug, Deserialize)]
struct SignalResponse {
    #[serde(default)]
    attitude: CustomerAttitude,
    #[serde(default = "fallback_confidence")]
    confidence: f64,
}

fn fallback_confidence() -> f64 {
    FALLBACK_CONFIDENCE
}

/// Detect an attitude signal on every customer turn.
///
/// Tier 1 is a deterministic keyword lookup; tier 2 escalates to one LLM
/// call only when no keyword matched and the text is long enough. Any
/// call failure defaults to neutraal with low confidence.
pub async fn detect_signals(
    chat: &dyn ChatCompletion,
    turns: &[TranscriptTurn],
    config: &SignalConfig,
) -> Vec<CustomerSignal> {
    let mut signals = Vec::new();

    for turn in turns.iter().filter(|t| t.speaker == Speaker::Customer) {
        let (attitude, confidence) = match match_keywords(&turn.text) {
            Some(attitude) => (attitude, KEYWORD_CONFIDENCE),
            None if turn.text.chars().count() > config.escalation_min_chars => {
                escalate(chat, &turn.text).await
            }
            None => (CustomerAttitude::Neutraal, SHORT_NEUTRAL_CONFIDENCE),
        };

        signals.push(CustomerSignal {
            turn_index: turn.index,
            attitude,
            confidence,
            recommended_techniques: techniques_for_attitude(attitude),
        });
    }

    signals
}

/// First matching category in table order wins.
fn match_keywords(text: &str) -> Option<CustomerAttitude> {
    let lowered = text.to_lowercase();
    ATTITUDE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(attitude, _)| *attitude)
}

async fn escalate(chat: &dyn ChatCompletion, text: &str) -> (CustomerAttitude, f64) {
    let prompt = build_signal_prompt(text);
    let parsed: Result<SignalResponse, _> = match chat.complete(SIGNAL_SYSTEM_PROMPT, &prompt).await
    {
        Ok(response) => extract_json(&response),
        Err(e) => Err(e),
    };

    match parsed {
        Ok(response) => (response.attitude, response.confidence.clamp(0.0, 1.0)),
        Err(e) => {
            warn!("signal escalation failed ({}), defaulting to neutraal", e);
            (CustomerAttitude::Neutraal, FALLBACK_CONFIDENCE)
        }
    }
}
