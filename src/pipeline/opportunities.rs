use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::{EpicPhase, BENEFIT_PHRASES, DEFENSIVE_PHRASES, VALUE_PHRASES};
use crate::llm::{build_enrich_prompt, extract_json, ChatCompletion, ENRICH_SYSTEM_PROMPT};
use crate::models::{
    CustomerAttitude, CustomerSignal, MissedOpportunity, OpportunityKind, Speaker, TranscriptTurn,
    TurnEvaluation,
};

/// Generic suggestion applied when enrichment fails or skips a record
const FALLBACK_BETTER_QUESTION: &str = "Kunt u mij daar iets meer over vertellen?";

/// Explore detections required before phase-3/4 techniques are on time
const MIN_EXPLORE_BEFORE_PROGRESSION: usize = 3;

/// How many turns after a stated benefit may still translate it into value
const BENEFIT_WINDOW_TURNS: usize = 3;

#[derive(Debug, Deserialize)]
struct EnrichResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    index: usize,
    #[serde(default)]
    question: String,
}

/// Run the fixed sequence of rule checks, then enrich all records with a
/// suggested better question in a single batched call.
///
/// Invariant: every returned record has a non-empty `better_question`.
pub async fn detect_opportunities(
    chat: &dyn ChatCompletion,
    evaluations: &[TurnEvaluation],
    signals: &[CustomerSignal],
    turns: &[TranscriptTurn],
) -> Vec<MissedOpportunity> {
    let mut opportunities = Vec::new();

    check_premature_progression(evaluations, turns, &mut opportunities);
    check_systemic_absence(evaluations, turns, &mut opportunities);
    check_reactive_gaps(evaluations, signals, turns, &mut opportunities);
    check_unrealized_benefit(turns, &mut opportunities);

    debug!("rule checks produced {} opportunities", opportunities.len());
    enrich(chat, &mut opportunities).await;

    opportunities
}

/// Rule (a): a phase-3/4 technique was used while fewer than 3
/// explore-phase techniques were detected anywhere in the conversation.
fn check_premature_progression(
    evaluations: &[TurnEvaluation],
    turns: &[TranscriptTurn],
    out: &mut Vec<MissedOpportunity>,
) {
    let explore_count = evaluations
        .iter()
        .flat_map(|e| e.detections.iter())
        .filter(|d| EpicPhase::Explore.contains_id(&d.technique_id))
        .count();

    if explore_count >= MIN_EXPLORE_BEFORE_PROGRESSION {
        return;
    }

    let premature = evaluations.iter().find(|e| {
        e.detections.iter().any(|d| {
            EpicPhase::Impact.contains_id(&d.technique_id)
                || EpicPhase::Commit.contains_id(&d.technique_id)
        })
    });

    if let Some(evaluation) = premature {
        out.push(MissedOpportunity {
            turn_index: evaluation.turn_index,
            kind: OpportunityKind::PrematureProgression,
            description: format!(
                "Er werd al op impact of commitment gestuurd terwijl de verkenning \
                 nog onvolledig was ({} explore-technieken gedetecteerd).",
                explore_count
            ),
            seller_quote: turn_text(turns, evaluation.turn_index),
            customer_quote: preceding_text(turns, evaluation.turn_index),
            better_question: String::new(),
        });
    }
}

/// Rule (b): no technique at all detected in the probe/impact/commit
/// ranges; three independent checks, up to three records.
fn check_systemic_absence(
    evaluations: &[TurnEvaluation],
    turns: &[TranscriptTurn],
    out: &mut Vec<MissedOpportunity>,
) {
    let anchor = turns
        .iter()
        .rev()
        .find(|t| t.speaker == Speaker::Seller)
        .map(|t| t.index)
        .unwrap_or(0);

    let checks = [
        (EpicPhase::Probe, OpportunityKind::MissingProbe, "probleemvragen"),
        (EpicPhase::Impact, OpportunityKind::MissingImpact, "impactvragen"),
        (EpicPhase::Commit, OpportunityKind::MissingCommit, "commitmentvragen"),
    ];

    for (phase, kind, label) in checks {
        let any = evaluations
            .iter()
            .flat_map(|e| e.detections.iter())
            .any(|d| phase.contains_id(&d.technique_id));

        if !any {
            out.push(MissedOpportunity {
                turn_index: anchor,
                kind,
                description: format!("In het hele gesprek zijn geen {} gedetecteerd.", label),
                seller_quote: String::new(),
                customer_quote: String::new(),
                better_question: String::new(),
            });
        }
    }
}

/// Rule (c): a twijfel or bezwaar signal whose next seller turn does not
/// respond adequately. Twijfel needs an impact/commit technique; bezwaar
/// must not be met with defensive phrasing.
fn check_reactive_gaps(
    evaluations: &[TurnEvaluation],
    signals: &[CustomerSignal],
    turns: &[TranscriptTurn],
    out: &mut Vec<MissedOpportunity>,
) {
    for signal in signals {
        if !matches!(
            signal.attitude,
            CustomerAttitude::Twijfel | CustomerAttitude::Bezwaar
        ) {
            continue;
        }

        let next_seller = turns
            .iter()
            .find(|t| t.index > signal.turn_index && t.speaker == Speaker::Seller);

        match signal.attitude {
            CustomerAttitude::Twijfel => {
                let answered = next_seller.is_some_and(|seller| {
                    evaluations
                        .iter()
                        .filter(|e| e.turn_index == seller.index)
                        .flat_map(|e| e.detections.iter())
                        .any(|d| {
                            EpicPhase::Impact.contains_id(&d.technique_id)
                                || EpicPhase::Commit.contains_id(&d.technique_id)
                        })
                });

                if !answered {
                    out.push(MissedOpportunity {
                        turn_index: signal.turn_index,
                        kind: OpportunityKind::UnansweredDoubt,
                        description: "Twijfel van de klant werd niet beantwoord met een \
                                      impact- of commitmentvraag."
                            .to_string(),
                        seller_quote: next_seller.map(|t| t.text.clone()).unwrap_or_default(),
                        customer_quote: turn_text(turns, signal.turn_index),
                        better_question: String::new(),
                    });
                }
            }
            CustomerAttitude::Bezwaar => {
                let defensive = match next_seller {
                    Some(seller) => {
                        let lowered = seller.text.to_lowercase();
                        DEFENSIVE_PHRASES.iter().any(|p| lowered.contains(p))
                    }
                    // objection left entirely unanswered
                    None => true,
                };

                if defensive {
                    out.push(MissedOpportunity {
                        turn_index: signal.turn_index,
                        kind: OpportunityKind::DefensiveObjectionHandling,
                        description: "Een bezwaar van de klant werd defensief beantwoord \
                                      in plaats van met empathie onderzocht."
                            .to_string(),
                        seller_quote: next_seller.map(|t| t.text.clone()).unwrap_or_default(),
                        customer_quote: turn_text(turns, signal.turn_index),
                        better_question: String::new(),
                    });
                }
            }
            _ => {}
        }
    }
}

/// Rule (d): a seller turn states a benefit that is not translated into a
/// concrete-value phrase within the next 3 turns.
fn check_unrealized_benefit(turns: &[TranscriptTurn], out: &mut Vec<MissedOpportunity>) {
    for turn in turns.iter().filter(|t| t.speaker == Speaker::Seller) {
        let lowered = turn.text.to_lowercase();
        if !BENEFIT_PHRASES.iter().any(|p| lowered.contains(p)) {
            continue;
        }

        let realized = turns
            .iter()
            .filter(|t| t.index > turn.index && t.index <= turn.index + BENEFIT_WINDOW_TURNS)
            .any(|t| {
                let text = t.text.to_lowercase();
                VALUE_PHRASES.iter().any(|p| text.contains(p))
            });

        if !realized {
            out.push(MissedOpportunity {
                turn_index: turn.index,
                kind: OpportunityKind::UnrealizedBenefit,
                description: "Een genoemd voordeel werd niet vertaald naar concrete waarde \
                              voor de klant."
                    .to_string(),
                seller_quote: turn.text.clone(),
                customer_quote: String::new(),
                better_question: String::new(),
            });
        }
    }
}

/// Fill every empty `better_question` via one batched call; on failure,
/// all unenriched records receive the same generic fallback.
async fn enrich(chat: &dyn ChatCompletion, opportunities: &mut [MissedOpportunity]) {
    let pending: Vec<(usize, &MissedOpportunity)> = opportunities
        .iter()
        .enumerate()
        .filter(|(_, o)| o.better_question.is_empty())
        .map(|(i, o)| (i, o))
        .collect();

    if pending.is_empty() {
        return;
    }

    let prompt = build_enrich_prompt(&pending);
    let parsed: Result<EnrichResponse, _> = match chat.complete(ENRICH_SYSTEM_PROMPT, &prompt).await
    {
        Ok(response) => extract_json(&response),
        Err(e) => Err(e),
    };

    match parsed {
        Ok(response) => {
            for suggestion in response.suggestions {
                if suggestion.question.is_empty() {
                    continue;
                }
                if let Some(opportunity) = opportunities.get_mut(suggestion.index) {
                    if opportunity.better_question.is_empty() {
                        opportunity.better_question = suggestion.question;
                    }
                }
            }
        }
        Err(e) => {
            warn!("opportunity enrichment failed ({}), applying generic suggestion", e);
        }
    }

    // the invariant holds regardless of what the model returned
    for opportunity in opportunities.iter_mut() {
        if opportunity.better_question.is_empty() {
            opportunity.better_question = FALLBACK_BETTER_QUESTION.to_string();
        }
    }
}

fn turn_text(turns: &[TranscriptTurn], index: usize) -> String {
    turns
        .iter()
        .find(|t| t.index == index)
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

fn preceding_text(turns: &[TranscriptTurn], index: usize) -> String {
    if index == 0 {
        return String::new();
    }
    turn_text(turns, index - 1)
}
