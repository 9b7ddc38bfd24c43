use serde::{Deserialize, Serialize};

use super::EpicCoverage;

/// Category of a detected coaching gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    /// Phase-3/4 technique used before the explore phase was worked
    PrematureProgression,
    /// No probe-range technique detected anywhere
    MissingProbe,
    /// No impact-range technique detected anywhere
    MissingImpact,
    /// No commit-range technique detected anywhere
    MissingCommit,
    /// Customer doubt not answered with an impact/commit technique
    UnansweredDoubt,
    /// Customer objection met with defensive language
    DefensiveObjectionHandling,
    /// Stated benefit never translated into concrete value
    UnrealizedBenefit,
}

/// A point in the conversation where a better response was available
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedOpportunity {
    pub turn_index: usize,
    pub kind: OpportunityKind,
    pub description: String,
    pub seller_quote: String,
    pub customer_quote: String,
    /// Suggested better question; never empty after enrichment/fallback
    pub better_question: String,
}

/// A strong moment called out in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strength {
    pub text: String,
    pub quote: String,
    pub turn_index: usize,
}

/// An improvement point called out in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    pub text: String,
    pub quote: String,
    pub turn_index: usize,
    pub better_approach: String,
}

/// The synthesized coaching report for one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInsights {
    pub coverage: EpicCoverage,
    pub opportunities: Vec<MissedOpportunity>,
    /// Markdown narrative summary
    pub summary: String,
    /// At most 3
    pub strengths: Vec<Strength>,
    /// At most 3
    pub improvements: Vec<Improvement>,
    /// Exactly 3 micro-experiments, on both the happy and fallback paths
    pub experiments: Vec<String>,
    pub overall_score: u32,
}
