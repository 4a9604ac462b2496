//! Core types and traits for the language assessment engine
//!
//! This crate provides the foundational types shared by every other crate:
//! - Utterance, learner context and per-call analysis options
//! - Detected issues (errors, guides, suggestions) and severities
//! - Audio clip and transcript types
//! - LLM request/response types
//! - Service traits for the language model, speech-to-text and text analysis
//! - Error types

pub mod analysis;
pub mod audio;
pub mod error;
pub mod llm_types;
pub mod proficiency;
pub mod text_analysis;
pub mod traits;
pub mod transcript;
pub mod utterance;

pub use analysis::{
    AnalysisConfig, DetectedIssue, IssueKind, IssueSource, Severity, StrictnessLevel, TextSpan,
};
pub use audio::{AudioClip, Channels};
pub use error::{Error, Result};
pub use llm_types::{FinishReason, GenerateRequest, GenerateResponse, Message, Role, TokenUsage};
pub use proficiency::ProficiencyLevel;
pub use text_analysis::{Entity, KeyPhrase, PartOfSpeech, SyntaxToken};
pub use transcript::{TranscriptAlternative, TranscriptResult};
pub use utterance::{ConversationContext, LearnerProfile, Utterance};

pub use traits::{LanguageModel, SpeechToText, TextAnalysisService};
