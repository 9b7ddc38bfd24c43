use serde::{Deserialize, Serialize};

/// Quality grade for a detected technique, with a fixed numeric score.
///
/// Wire values are the Dutch grades used by the coaching product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TechniqueQuality {
    Perfect,
    Goed,
    Bijna,
    #[default]
    Gemist,
}

impl TechniqueQuality {
    /// Fixed quality-to-score mapping
    pub fn score(&self) -> u32 {
        match self {
            TechniqueQuality::Perfect => 10,
            TechniqueQuality::Goed => 7,
            TechniqueQuality::Bijna => 4,
            TechniqueQuality::Gemist => 0,
        }
    }
}

/// A single technique detected in a seller turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueDetection {
    /// Catalog id ("0" when the model response was unusable)
    pub technique_id: String,
    pub name: String,
    pub quality: TechniqueQuality,
    /// Numeric score derived from the quality grade
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_followed: Option<Vec<String>>,
}

/// Evaluation of one seller turn against the technique catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEvaluation {
    /// Index of the evaluated turn; always references an existing turn
    pub turn_index: usize,
    /// At most 2 ranked detections
    pub detections: Vec<TechniqueDetection>,
    pub overall_quality: TechniqueQuality,
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_scores() {
        assert_eq!(TechniqueQuality::Perfect.score(), 10);
        assert_eq!(TechniqueQuality::Goed.score(), 7);
        assert_eq!(TechniqueQuality::Bijna.score(), 4);
        assert_eq!(TechniqueQuality::Gemist.score(), 0);
    }

    #[test]
    fn test_quality_serde_dutch_values() {
        assert_eq!(
            serde_json::to_string(&TechniqueQuality::Goed).unwrap(),
            "\"goed\""
        );
        let q: TechniqueQuality = serde_json::from_str("\"bijna\"").unwrap();
        assert_eq!(q, TechniqueQuality::Bijna);
    }

    #[test]
    fn test_quality_default_is_gemist() {
        assert_eq!(TechniqueQuality::default(), TechniqueQuality::Gemist);
    }
}
