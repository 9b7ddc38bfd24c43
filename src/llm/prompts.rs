//! Prompt builders for every classification call in the pipeline.

use crate::catalog::{prompt_catalog, Technique};
use crate::models::{
    CustomerSignal, EpicCoverage, MissedOpportunity, Speaker, TranscriptSegment, TranscriptTurn,
    TurnEvaluation,
};

/// System prompt for diarization chunk calls
pub const DIARIZE_SYSTEM_PROMPT: &str = r#"You label utterances from a recorded sales conversation as "seller" or "customer".

Rules:
1. Decide by dialogue content: question/answer alternation, role-indicative phrasing (the seller asks discovery questions and presents; the customer answers, doubts, objects).
2. Never decide by position alone.
3. Label EVERY index you are given.
4. Output only valid JSON matching: {"labels": [{"index": <number>, "speaker": "seller"|"customer"}]}"#;

/// Build the user prompt for one diarization chunk.
///
/// `previous_labels` carries the tail of the previous chunk so speaker
/// identity stays consistent across chunk boundaries.
pub fn build_diarize_prompt(
    segments: &[TranscriptSegment],
    previous_labels: &[(usize, Speaker)],
) -> String {
    let mut prompt = String::new();

    if !previous_labels.is_empty() {
        prompt.push_str("## Labels from the previous chunk (continuity context)\n");
        for (index, speaker) in previous_labels {
            let name = match speaker {
                Speaker::Seller => "seller",
                Speaker::Customer => "customer",
            };
            prompt.push_str(&format!("- index {}: {}\n", index, name));
        }
        prompt.push('\n');
    }

    prompt.push_str("## Utterances to label\n");
    for segment in segments {
        prompt.push_str(&format!("[{}] {}\n", segment.id, segment.text));
    }

    prompt.push_str("\nLabel every index above as seller or customer.\n");
    prompt
}

/// System prompt for per-turn technique evaluation
pub const EVALUATE_SYSTEM_PROMPT: &str = r#"You are a sales coach grading one seller utterance from a Dutch discovery call against a technique catalog.

Rules:
1. Detect AT MOST 2 techniques from the catalog, ranked by fit.
2. Grade each as "perfect", "goed", "bijna" or "gemist".
3. Use only catalog ids.
4. Output only valid JSON matching:
{"detections": [{"id": "<catalog id>", "name": "<name>", "quality": "perfect"|"goed"|"bijna"|"gemist", "steps": ["..."]}], "overallQuality": "...", "rationale": "<one short sentence>"}"#;

/// Build the user prompt for evaluating one seller turn
pub fn build_evaluate_prompt(seller_text: &str, preceding_customer_text: Option<&str>) -> String {
    let mut prompt = String::new();

    prompt.push_str("## Customer said before this\n");
    match preceding_customer_text {
        Some(text) => prompt.push_str(text),
        None => prompt.push_str("[begin van het gesprek]"),
    }
    prompt.push_str("\n\n## Seller utterance to grade\n");
    prompt.push_str(seller_text);

    prompt.push_str("\n\n## Technique catalog\n");
    for technique in prompt_catalog() {
        prompt.push_str(&format_catalog_entry(technique));
    }

    prompt
}

fn format_catalog_entry(technique: &Technique) -> String {
    format!(
        "- {} {} ({:?}): {} Voorbeeld: \"{}\"\n",
        technique.id, technique.name, technique.phase, technique.definition, technique.example
    )
}

/// System prompt for the signal-escalation call
pub const SIGNAL_SYSTEM_PROMPT: &str = r#"You classify one customer utterance from a Dutch sales conversation into exactly one attitude category.

Categories (use only these): "vraag", "twijfel", "bezwaar", "uitstel", "interesse", "akkoord", "neutraal".

Output only valid JSON: {"attitude": "<category>", "confidence": <0.0-1.0>}"#;

/// Build the user prompt for the signal-escalation call
pub fn build_signal_prompt(customer_text: &str) -> String {
    format!("Customer utterance:\n{}\n\nClassify the attitude.", customer_text)
}

/// System prompt for the batched opportunity-enrichment call
pub const ENRICH_SYSTEM_PROMPT: &str = r#"You are a sales coach. For each listed missed opportunity from a Dutch sales conversation, write ONE better question the seller could have asked at that point, in Dutch.

Output only valid JSON: {"suggestions": [{"index": <number>, "question": "<Dutch question>"}]}"#;

/// Build the single batched enrichment prompt for all unenriched records
pub fn build_enrich_prompt(opportunities: &[(usize, &MissedOpportunity)]) -> String {
    let mut prompt = String::new();
    prompt.push_str("## Missed opportunities\n");
    for (index, opportunity) in opportunities {
        prompt.push_str(&format!(
            "[{}] {:?}: {}\n  Klant: \"{}\"\n  Verkoper: \"{}\"\n",
            index,
            opportunity.kind,
            opportunity.description,
            opportunity.customer_quote,
            opportunity.seller_quote
        ));
    }
    prompt.push_str("\nGive one better question per index.\n");
    prompt
}

/// System prompt for report synthesis
pub const REPORT_SYSTEM_PROMPT: &str = r#"You are a sales coach writing a coaching report for a Dutch discovery call, based on the analysis artifacts provided.

Output only valid JSON matching:
{
  "summary": "<markdown summary of the conversation>",
  "strengths": [{"text": "...", "quote": "...", "turnIndex": <number>}],
  "improvements": [{"text": "...", "quote": "...", "turnIndex": <number>, "betterApproach": "..."}],
  "experiments": ["...", "...", "..."],
  "overallScore": <integer 0-100>
}

Give exactly 3 strengths, 3 improvements and 3 micro-experiments. Write all text in Dutch."#;

/// Build the user prompt for the single report-synthesis call
pub fn build_report_prompt(
    turns: &[TranscriptTurn],
    evaluations: &[TurnEvaluation],
    signals: &[CustomerSignal],
    coverage: &EpicCoverage,
    opportunities: &[MissedOpportunity],
) -> String {
    let mut prompt = String::new();

    prompt.push_str("## Transcript\n");
    for turn in turns {
        let speaker = match turn.speaker {
            Speaker::Seller => "Verkoper",
            Speaker::Customer => "Klant",
        };
        prompt.push_str(&format!("[{}] {}: {}\n", turn.index, speaker, turn.text));
    }

    prompt.push_str("\n## Technique evaluations\n");
    for evaluation in evaluations {
        let detected: Vec<String> = evaluation
            .detections
            .iter()
            .map(|d| format!("{} ({:?})", d.name, d.quality))
            .collect();
        prompt.push_str(&format!(
            "[{}] {}: {}\n",
            evaluation.turn_index,
            if detected.is_empty() {
                "geen techniek".to_string()
            } else {
                detected.join(", ")
            },
            evaluation.rationale
        ));
    }

    prompt.push_str("\n## Customer signals\n");
    for signal in signals {
        prompt.push_str(&format!(
            "[{}] {:?} (confidence {:.2})\n",
            signal.turn_index, signal.attitude, signal.confidence
        ));
    }

    prompt.push_str(&format!(
        "\n## EPIC coverage\nExplore: {}\nProbe: {}\nImpact: {}\nCommit: {}\nOverall: {}\n",
        coverage.explore.score,
        coverage.probe.score,
        coverage.impact.score,
        coverage.commit.score,
        coverage.overall
    ));

    prompt.push_str("\n## Missed opportunities\n");
    for opportunity in opportunities {
        prompt.push_str(&format!(
            "[{}] {:?}: {}\n",
            opportunity.turn_index, opportunity.kind, opportunity.description
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Speaker;

    fn segment(id: usize, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id,
            start: id as f64,
            end: id as f64 + 0.9,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_diarize_prompt_lists_every_index() {
        let segments = vec![segment(0, "Goedemorgen"), segment(1, "Hallo")];
        let prompt = build_diarize_prompt(&segments, &[]);
        assert!(prompt.contains("[0] Goedemorgen"));
        assert!(prompt.contains("[1] Hallo"));
        assert!(!prompt.contains("continuity context"));
    }

    #[test]
    fn test_diarize_prompt_includes_continuity_context() {
        let segments = vec![segment(80, "En verder?")];
        let prompt = build_diarize_prompt(&segments, &[(79, Speaker::Customer)]);
        assert!(prompt.contains("index 79: customer"));
    }

    #[test]
    fn test_evaluate_prompt_excludes_phase_markers() {
        let prompt = build_evaluate_prompt("Hoe pakken jullie dat aan?", None);
        assert!(prompt.contains("[begin van het gesprek]"));
        assert!(prompt.contains("1.1"));
        // phase markers stay out of the catalog section
        assert!(!prompt.contains("- 1.0 "));
        assert!(!prompt.contains("- 4.0 "));
    }

    #[test]
    fn test_evaluate_prompt_includes_preceding_customer_text() {
        let prompt = build_evaluate_prompt("Dat snap ik.", Some("Het is te duur."));
        assert!(prompt.contains("Het is te duur."));
        assert!(!prompt.contains("[begin van het gesprek]"));
    }
}
