//! Grammar assessment
//!
//! Local regex rules run on every call; the syntax service and the
//! language-model critique add structure and extra errors when reachable.

mod analyzer;
mod rules;

pub use analyzer::{GrammarAnalyzer, GrammarResult, SentenceStructure};
pub use rules::{GrammarRule, Replacement, RuleCategory, RuleMatcher, RuleSet};
