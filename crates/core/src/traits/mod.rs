//! Service traits consumed by the assessment engine
//!
//! Analyzers depend only on these traits, never on concrete clients:
//!
//! ```text
//! LanguageModel:        prompt -> critique text (JSON)
//! SpeechToText:         audio  -> transcript + confidence
//! TextAnalysisService:  text   -> POS tokens, entities, key phrases
//! ```
//!
//! Implementations live in `tutor-llm` and `tutor-pipeline`; tests use
//! inline mocks.

mod llm;
mod speech;
mod text_analysis;

pub use llm::LanguageModel;
pub use speech::SpeechToText;
pub use text_analysis::TextAnalysisService;
