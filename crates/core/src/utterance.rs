//! The unit of analysis: one learner turn

use serde::{Deserialize, Serialize};

use crate::{AudioClip, ProficiencyLevel, TranscriptResult};

/// Learner profile supplied by the conversation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    #[serde(default)]
    pub learner_id: Option<String>,
    #[serde(default)]
    pub level: ProficiencyLevel,
    /// ISO code of the learner's first language
    #[serde(default)]
    pub native_language: Option<String>,
}

/// Conversation context for a turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Current conversation topic, e.g. "travel"
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub learner: LearnerProfile,
}

impl ConversationContext {
    pub fn new(level: ProficiencyLevel) -> Self {
        Self {
            topic: None,
            learner: LearnerProfile {
                level,
                ..Default::default()
            },
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// One learner turn (text and optional audio)
///
/// Immutable once built; analyzers only borrow it.
#[derive(Debug, Clone)]
pub struct Utterance {
    text: String,
    audio: Option<AudioClip>,
    transcript: Option<TranscriptResult>,
    language: String,
    context: ConversationContext,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
            transcript: None,
            language: "en".to_string(),
            context: ConversationContext::default(),
        }
    }

    pub fn with_audio(mut self, audio: AudioClip) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Attach an upstream transcript (e.g. from the voice UI's STT pass)
    pub fn with_transcript(mut self, transcript: TranscriptResult) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn audio(&self) -> Option<&AudioClip> {
        self.audio.as_ref()
    }

    pub fn transcript(&self) -> Option<&TranscriptResult> {
        self.transcript.as_ref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// True when the text has no non-whitespace characters
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
