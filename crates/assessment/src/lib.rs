//! Language assessment engine
//!
//! Three analyzers share one shape: run cheap local checks, ask the remote
//! services for richer signals concurrently, and fuse whatever came back
//! into clamped scores with a confidence that drops when a signal is
//! missing.
//!
//! ```text
//! Utterance ──► GrammarAnalyzer    ─┐
//!           ──► VocabularyAnalyzer ─┼─► TurnAssessment
//!           ──► FluencyAnalyzer    ─┘
//! ```
//!
//! Remote failures never reach the caller. The only error an analyzer
//! returns is [`AssessmentError::InvalidConfig`].

pub mod composite;
pub mod critique;
pub mod error;
pub mod feedback;
pub mod fluency;
pub mod grammar;
mod metrics;
pub mod scoring;
pub mod tokenize;
pub mod vocabulary;

pub use composite::{TurnAssessment, TurnAssessor};
pub use error::AssessmentError;
pub use feedback::EncouragementPicker;
pub use fluency::{
    FluencyAnalyzer, FluencyResult, PronunciationAnalysis, RhythmAnalysis,
};
pub use grammar::{
    GrammarAnalyzer, GrammarResult, GrammarRule, RuleCategory, RuleSet, SentenceStructure,
};
pub use scoring::AnalysisResult;
pub use vocabulary::{
    Lexicon, LexiconEntry, SuggestionKind, VocabularyAnalyzer, VocabularyResult,
    VocabularySuggestion,
};
