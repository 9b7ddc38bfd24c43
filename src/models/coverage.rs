use serde::{Deserialize, Serialize};

/// Coverage of one EPIC phase: a 0-100 score with supporting evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCoverage {
    pub score: u32,
    /// Theme families found (explore) or empty for the binary phases
    pub themes: Vec<String>,
    /// Up to 3 truncated turn texts supporting the score
    pub examples: Vec<String>,
}

impl PhaseCoverage {
    pub fn empty() -> Self {
        Self {
            score: 0,
            themes: Vec::new(),
            examples: Vec::new(),
        }
    }
}

/// Coverage scores for the four EPIC phases plus the rounded mean
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicCoverage {
    pub explore: PhaseCoverage,
    pub probe: PhaseCoverage,
    pub impact: PhaseCoverage,
    pub commit: PhaseCoverage,
    /// round(mean(explore, probe, impact, commit))
    pub overall: u32,
}

impl EpicCoverage {
    /// Compute the overall score from the four sub-scores
    pub fn overall_of(explore: u32, probe: u32, impact: u32, commit: u32) -> u32 {
        ((explore + probe + impact + commit) as f64 / 4.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_is_rounded_mean() {
        assert_eq!(EpicCoverage::overall_of(100, 100, 100, 100), 100);
        assert_eq!(EpicCoverage::overall_of(0, 0, 0, 0), 0);
        assert_eq!(EpicCoverage::overall_of(50, 100, 0, 0), 38);
        // 33+100+0+0 = 133 / 4 = 33.25 -> 33
        assert_eq!(EpicCoverage::overall_of(33, 100, 0, 0), 33);
    }
}
