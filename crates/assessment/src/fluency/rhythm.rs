//! Text rhythm: sentence-length regularity, fillers and repetitions

use serde::Serialize;

use crate::scoring::clamp_unit;
use crate::tokenize;

const FILLERS: &[&str] = &["um", "uh", "uhm", "umm", "er", "erm", "ah", "hmm", "mm"];

const FILLER_PENALTY: f32 = 0.05;
const MAX_FILLER_PENALTY: f32 = 0.3;
const REPETITION_PENALTY: f32 = 0.05;
const MAX_REPETITION_PENALTY: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RhythmAnalysis {
    pub score: f32,
    pub sentence_count: usize,
    pub mean_sentence_words: f32,
    pub filler_count: usize,
    /// Immediate word repetitions ("I I went")
    pub repetition_count: usize,
}

/// Score how evenly and smoothly `text` flows
///
/// Regular sentence lengths and sentences of reasonable length score
/// higher; fillers and stutter-like repetitions subtract.
pub fn analyze_rhythm(text: &str) -> RhythmAnalysis {
    let lengths: Vec<f32> = tokenize::sentences(text)
        .iter()
        .map(|(_, sentence)| tokenize::word_count(sentence) as f32)
        .filter(|n| *n > 0.0)
        .collect();
    let words = tokenize::words(text);

    if lengths.is_empty() || words.is_empty() {
        return RhythmAnalysis {
            score: 0.0,
            sentence_count: 0,
            mean_sentence_words: 0.0,
            filler_count: 0,
            repetition_count: 0,
        };
    }

    let count = lengths.len() as f32;
    let mean = lengths.iter().sum::<f32>() / count;
    let variance = lengths.iter().map(|n| (n - mean).powi(2)).sum::<f32>() / count;
    let variation = if mean > 0.0 { variance.sqrt() / mean } else { 0.0 };

    let regularity = 1.0 / (1.0 + variation);
    let length_factor = (0.5 + mean / 10.0).min(1.0);

    let filler_count = words.iter().filter(|w| FILLERS.contains(&w.as_str())).count();
    let repetition_count = words
        .windows(2)
        .filter(|pair| pair[0] == pair[1] && !FILLERS.contains(&pair[0].as_str()))
        .count();

    let penalty = (filler_count as f32 * FILLER_PENALTY).min(MAX_FILLER_PENALTY)
        + (repetition_count as f32 * REPETITION_PENALTY).min(MAX_REPETITION_PENALTY);

    RhythmAnalysis {
        score: clamp_unit(0.5 * regularity + 0.5 * length_factor - penalty),
        sentence_count: lengths.len(),
        mean_sentence_words: mean,
        filler_count,
        repetition_count,
    }
}
