use serde::{Deserialize, Serialize};

/// Customer attitude category, a closed enum with Dutch wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerAttitude {
    Vraag,
    Twijfel,
    Bezwaar,
    Uitstel,
    Interesse,
    Akkoord,
    #[default]
    Neutraal,
}

/// Detected attitude signal on one customer turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSignal {
    pub turn_index: usize,
    pub attitude: CustomerAttitude,
    /// Detection confidence, 0-1
    pub confidence: f64,
    /// Technique ids recommended as a response to this attitude
    pub recommended_techniques: Vec<String>,
}
