//! Fluency assessment
//!
//! Text-only turns are scored on rhythm alone. With audio, pace (words per
//! minute), pronunciation (transcription confidence) and transcription
//! quality join the composite.

mod analyzer;
mod pronunciation;
mod rhythm;

pub use analyzer::{FluencyAnalyzer, FluencyResult};
pub use pronunciation::{syllables, PronunciationAnalysis};
pub use rhythm::{analyze_rhythm, RhythmAnalysis};
