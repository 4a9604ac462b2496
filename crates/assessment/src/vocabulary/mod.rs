//! Vocabulary assessment

mod analyzer;
mod lexicon;

pub use analyzer::{SuggestionKind, VocabularyAnalyzer, VocabularyResult, VocabularySuggestion};
pub use lexicon::{Lexicon, LexiconEntry};
