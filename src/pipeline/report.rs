use serde::Deserialize;
use tracing::warn;

use crate::llm::{build_report_prompt, extract_json, ChatCompletion, REPORT_SYSTEM_PROMPT};
use crate::models::{
    AnalysisInsights, CustomerSignal, EpicCoverage, Improvement, MissedOpportunity, Strength,
    TranscriptTurn, TurnEvaluation,
};

/// Fixed experiments used when synthesis fails or returns too few
const FALLBACK_EXPERIMENTS: [&str; 3] = [
    "Stel in het volgende gesprek minimaal drie open situatievragen voordat u iets voorstelt.",
    "Vat na elk klantantwoord samen wat u hoorde en toets of het klopt.",
    "Sluit elk gesprek af met een concrete, geplande vervolgstap.",
];

const FALLBACK_SUMMARY: &str =
    "Het rapport kon niet automatisch worden opgesteld. De coveragescores en \
     gemiste kansen hieronder geven wel een beeld van het gesprek.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    strengths: Vec<RawStrength>,
    #[serde(default)]
    improvements: Vec<RawImprovement>,
    #[serde(default)]
    experiments: Vec<String>,
    #[serde(default)]
    overall_score: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStrength {
    #[serde(default)]
    text: String,
    #[serde(default)]
    quote: String,
    #[serde(default)]
    turn_index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImprovement {
    #[serde(default)]
    text: String,
    #[serde(default)]
    quote: String,
    #[serde(default)]
    turn_index: usize,
    #[serde(default)]
    better_approach: String,
}

/// Produce the final narrative report with one classification call.
///
/// Arrays are truncated to 3 entries; experiments are padded to exactly 3
/// from the fixed list. On total failure the deterministic fallback report
/// is returned with `overall_score` taken from the coverage overall.
pub async fn synthesize_report(
    chat: &dyn ChatCompletion,
    turns: &[TranscriptTurn],
    evaluations: &[TurnEvaluation],
    signals: &[CustomerSignal],
    coverage: EpicCoverage,
    opportunities: Vec<MissedOpportunity>,
) -> AnalysisInsights {
    let prompt = build_report_prompt(turns, evaluations, signals, &coverage, &opportunities);

    let parsed: Result<ReportResponse, _> = match chat.complete(REPORT_SYSTEM_PROMPT, &prompt).await
    {
        Ok(response) => extract_json(&response),
        Err(e) => Err(e),
    };

    match parsed {
        Ok(response) => build_insights(response, coverage, opportunities),
        Err(e) => {
            warn!("report synthesis failed ({}), returning fallback report", e);
            fallback_insights(coverage, opportunities)
        }
    }
}

fn build_insights(
    response: ReportResponse,
    coverage: EpicCoverage,
    opportunities: Vec<MissedOpportunity>,
) -> AnalysisInsights {
    let strengths: Vec<Strength> = response
        .strengths
        .into_iter()
        .take(3)
        .map(|s| Strength {
            text: s.text,
            quote: s.quote,
            turn_index: s.turn_index,
        })
        .collect();

    let improvements: Vec<Improvement> = response
        .improvements
        .into_iter()
        .take(3)
        .map(|i| Improvement {
            text: i.text,
            quote: i.quote,
            turn_index: i.turn_index,
            better_approach: i.better_approach,
        })
        .collect();

    let mut experiments: Vec<String> = response.experiments.into_iter().take(3).collect();
    for fallback in FALLBACK_EXPERIMENTS {
        if experiments.len() >= 3 {
            break;
        }
        experiments.push(fallback.to_string());
    }

    let summary = if response.summary.is_empty() {
        FALLBACK_SUMMARY.to_string()
    } else {
        response.summary
    };

    AnalysisInsights {
        coverage,
        opportunities,
        summary,
        strengths,
        improvements,
        experiments,
        overall_score: response.overall_score.min(100),
    }
}

fn fallback_insights(
    coverage: EpicCoverage,
    opportunities: Vec<MissedOpportunity>,
) -> AnalysisInsights {
    let overall_score = coverage.overall;
    AnalysisInsights {
        coverage,
        opportunities,
        summary: FALLBACK_SUMMARY.to_string(),
        strengths: Vec::new(),
        improvements: Vec::new(),
        experiments: FALLBACK_EXPERIMENTS.iter().map(|s| s.to_string()).collect(),
        overall_score,
    }
}
