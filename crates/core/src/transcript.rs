//! Speech-to-text transcript types

use serde::{Deserialize, Serialize};

/// Transcript returned by a speech-to-text service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Best transcript
    pub text: String,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Lower-ranked hypotheses
    #[serde(default)]
    pub alternatives: Vec<TranscriptAlternative>,
}

/// Alternative recognition hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAlternative {
    pub text: String,
    pub confidence: f32,
}

impl TranscriptResult {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            alternatives: Vec::new(),
        }
    }

    pub fn with_alternative(mut self, text: impl Into<String>, confidence: f32) -> Self {
        self.alternatives.push(TranscriptAlternative {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        });
        self
    }
}
