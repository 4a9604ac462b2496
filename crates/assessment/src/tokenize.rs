//! Word and sentence segmentation
//!
//! Words are Unicode word segments, lower-cased, with surrounding
//! punctuation removed; contractions such as "don't" stay whole.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;

/// Closed-class English words excluded from content-word measures
static FUNCTION_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "if", "so", "because", "as", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "then", "once", "here", "there", "when", "where", "why", "how", "all",
        "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor",
        "not", "only", "own", "same", "than", "too", "very", "can", "will", "just", "should",
        "would", "could", "might", "must", "shall", "may", "i", "me", "my", "mine", "we", "us",
        "our", "ours", "you", "your", "yours", "he", "him", "his", "she", "her", "hers", "it",
        "its", "they", "them", "their", "theirs", "what", "which", "who", "whom", "this",
        "that", "these", "those", "am", "is", "are", "was", "were", "be", "been", "being",
        "have", "has", "had", "having", "do", "does", "did", "doing", "don't", "doesn't",
        "didn't", "isn't", "aren't", "wasn't", "weren't", "can't", "won't", "i'm", "it's",
        "i've", "you're", "they're", "we're", "also", "yes", "ok", "okay",
    ]
    .into_iter()
    .collect()
});

/// Normalise typographic apostrophes so "don’t" and "don't" compare equal
fn normalise(word: &str) -> String {
    word.replace('\u{2019}', "'").to_lowercase()
}

/// Lower-cased words in order of appearance
pub fn words(text: &str) -> Vec<String> {
    text.unicode_words().map(normalise).collect()
}

/// Words with their byte offsets into `text`
pub fn word_indices(text: &str) -> Vec<(usize, &str)> {
    text.split_word_bound_indices()
        .filter(|(_, w)| w.chars().any(char::is_alphanumeric))
        .collect()
}

/// Non-blank sentences with their byte offsets, whitespace trimmed
pub fn sentences(text: &str) -> Vec<(usize, &str)> {
    text.split_sentence_bound_indices()
        .filter_map(|(start, sentence)| {
            let trimmed = sentence.trim_end();
            let leading = trimmed.len() - trimmed.trim_start().len();
            let trimmed = trimmed.trim_start();
            trimmed
                .unicode_words()
                .next()
                .map(|_| (start + leading, trimmed))
        })
        .collect()
}

pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

pub fn is_function_word(word: &str) -> bool {
    FUNCTION_WORDS.contains(word)
}

/// Content word: not a function word and longer than two characters
pub fn is_content_word(word: &str) -> bool {
    word.chars().count() > 2 && !is_function_word(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_strip_punctuation_and_lowercase() {
        assert_eq!(words("He don't like it!"), vec!["he", "don't", "like", "it"]);
        assert_eq!(words("Don\u{2019}t, STOP."), vec!["don't", "stop"]);
        assert!(words("  ...  ").is_empty());
    }

    #[test]
    fn test_sentences_with_offsets() {
        let text = "I like tea. You like coffee!  ";
        let sentences = sentences(text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], (0, "I like tea."));
        assert_eq!(sentences[1].1, "You like coffee!");
        assert_eq!(&text[sentences[1].0..sentences[1].0 + 3], "You");
    }

    #[test]
    fn test_word_indices_skip_whitespace() {
        let indices = word_indices("the the cat");
        assert_eq!(indices, vec![(0, "the"), (4, "the"), (8, "cat")]);
    }

    #[test]
    fn test_content_words() {
        assert!(is_content_word("travel"));
        assert!(!is_content_word("the"));
        assert!(!is_content_word("go"));
        assert!(!is_content_word("because"));
    }
}
