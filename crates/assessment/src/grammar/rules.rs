//! Local grammar rules
//!
//! Rules are compiled once and run against every utterance. Each match
//! becomes a [`DetectedIssue`] with a byte span, severity and (usually) a
//! suggested replacement.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use tutor_core::{DetectedIssue, Severity, TextSpan};

use crate::tokenize;

/// Rule grouping; focus areas select rules by category name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Agreement,
    Articles,
    Negation,
    Structure,
    Style,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Agreement => "agreement",
            RuleCategory::Articles => "articles",
            RuleCategory::Negation => "negation",
            RuleCategory::Structure => "structure",
            RuleCategory::Style => "style",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "agreement" | "subject_verb_agreement" | "subject-verb agreement" => {
                Ok(RuleCategory::Agreement)
            },
            "articles" | "article" => Ok(RuleCategory::Articles),
            "negation" | "negatives" => Ok(RuleCategory::Negation),
            "structure" | "sentence_structure" => Ok(RuleCategory::Structure),
            "style" | "capitalization" | "punctuation" => Ok(RuleCategory::Style),
            other => Err(format!("unknown rule category: {}", other)),
        }
    }
}

/// How a rule finds its matches
#[derive(Debug, Clone)]
pub enum RuleMatcher {
    /// Regex; capture group 1 (when present) is the reported span
    Pattern(Regex),
    /// Sentences longer than `max_words`
    SentenceLength { max_words: usize },
    /// The same word twice in a row
    RepeatedWord { allowed: &'static [&'static str] },
}

/// Suggested fix for a match
#[derive(Debug, Clone)]
pub enum Replacement {
    None,
    Fixed(&'static str),
    /// Lookup on the lowercased matched text
    Map(&'static [(&'static str, &'static str)]),
    Computed(fn(&str) -> String),
}

impl Replacement {
    fn resolve(&self, matched: &str) -> Option<String> {
        let replacement = match self {
            Replacement::None => return None,
            Replacement::Fixed(r) => r.to_string(),
            Replacement::Map(table) => {
                let key = matched.to_lowercase().replace('’', "'");
                table
                    .iter()
                    .find(|(from, _)| *from == key)
                    .map(|(_, to)| to.to_string())?
            },
            Replacement::Computed(f) => f(matched),
        };
        Some(match_case(matched, &replacement))
    }
}

/// Capitalize the replacement when the matched text starts uppercase
fn match_case(matched: &str, replacement: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    // "I" -> "am" stays lowercase
    if !starts_upper || matched == "I" {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A single compiled rule
#[derive(Debug, Clone)]
pub struct GrammarRule {
    pub id: String,
    pub category: RuleCategory,
    pub matcher: RuleMatcher,
    pub severity: Severity,
    pub message: String,
    pub replacement: Replacement,
    pub confidence: f32,
    /// Skip a match when the word right before it is one of these
    pub skip_after: &'static [&'static str],
}

impl GrammarRule {
    /// Run the rule against `text`
    pub fn check(&self, text: &str) -> Vec<DetectedIssue> {
        match &self.matcher {
            RuleMatcher::Pattern(regex) => regex
                .captures_iter(text)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    if self.preceded_by_skip_word(text, whole.start()) {
                        return None;
                    }
                    let target = caps.get(1).unwrap_or(whole);
                    Some(self.issue(text, target.start(), target.end()))
                })
                .collect(),
            RuleMatcher::SentenceLength { max_words } => tokenize::sentences(text)
                .into_iter()
                .filter(|(_, sentence)| tokenize::word_count(sentence) > *max_words)
                .map(|(start, sentence)| self.issue(text, start, start + sentence.len()))
                .collect(),
            RuleMatcher::RepeatedWord { allowed } => {
                let words = tokenize::word_indices(text);
                words
                    .windows(2)
                    .filter(|pair| {
                        let (a, b) = (pair[0].1, pair[1].1);
                        a.eq_ignore_ascii_case(b)
                            && !allowed.iter().any(|w| w.eq_ignore_ascii_case(a))
                            && only_whitespace_between(text, pair[0].0 + a.len(), pair[1].0)
                    })
                    .map(|pair| self.issue(text, pair[1].0, pair[1].0 + pair[1].1.len()))
                    .collect()
            },
        }
    }

    fn preceded_by_skip_word(&self, text: &str, start: usize) -> bool {
        if self.skip_after.is_empty() {
            return false;
        }
        let before = text[..start].trim_end();
        let previous = before
            .rsplit(|c: char| !c.is_alphanumeric() && c != '\'')
            .next()
            .unwrap_or("")
            .to_lowercase();
        self.skip_after.contains(&previous.as_str())
    }

    /// `start`/`end` are byte offsets; the issue span is in characters
    fn issue(&self, text: &str, start: usize, end: usize) -> DetectedIssue {
        let span = TextSpan::from_byte_range(text, start, end);
        let mut issue = DetectedIssue::grammar(self.id.clone(), self.message.clone(), self.severity)
            .with_span(span)
            .with_confidence(self.confidence);
        if let Some(replacement) = self.replacement.resolve(&text[start..end]) {
            issue = issue.with_replacement(replacement);
        }
        issue
    }
}

fn only_whitespace_between(text: &str, from: usize, to: usize) -> bool {
    from <= to && text[from..to].chars().all(char::is_whitespace)
}

const AUXILIARY_LEADERS: &[&str] = &[
    "did", "does", "do", "would", "could", "should", "will", "can", "may", "might", "must", "to",
    "let", "make", "made", "help", "helped",
];

const PLURAL_SUBJECT_FIXES: &[(&str, &str)] = &[
    ("is", "are"),
    ("was", "were"),
    ("has", "have"),
    ("does", "do"),
];

const NEGATIVE_FIXES: &[(&str, &str)] = &[
    ("nothing", "anything"),
    ("nobody", "anybody"),
    ("nowhere", "anywhere"),
    ("none", "any"),
    ("no one", "anyone"),
];

fn drop_more(matched: &str) -> String {
    matched.split_whitespace().last().unwrap_or(matched).to_string()
}

/// Declarative rule source before compilation
struct RuleDef {
    id: &'static str,
    category: RuleCategory,
    pattern: &'static str,
    severity: Severity,
    message: &'static str,
    replacement: Replacement,
    confidence: f32,
    skip_after: &'static [&'static str],
}

fn pattern_rules() -> Vec<RuleDef> {
    vec![
        RuleDef {
            id: "SVA_THIRD_PERSON_DONT",
            category: RuleCategory::Agreement,
            pattern: r"(?i)\b(?:he|she|it)\s+(don['’]?t)\b",
            severity: Severity::High,
            message: "Subject-verb agreement: use \"doesn't\" with he, she or it",
            replacement: Replacement::Fixed("doesn't"),
            confidence: 0.9,
            skip_after: &[],
        },
        RuleDef {
            id: "SVA_THIRD_PERSON_HAVE",
            category: RuleCategory::Agreement,
            pattern: r"(?i)\b(?:he|she|it)\s+(have)\b",
            severity: Severity::High,
            message: "Subject-verb agreement: use \"has\" with he, she or it",
            replacement: Replacement::Fixed("has"),
            confidence: 0.85,
            skip_after: AUXILIARY_LEADERS,
        },
        RuleDef {
            id: "SVA_FIRST_PERSON_BE",
            category: RuleCategory::Agreement,
            pattern: r"\bI\s+(is|are)\b",
            severity: Severity::High,
            message: "Subject-verb agreement: use \"am\" after \"I\"",
            replacement: Replacement::Fixed("am"),
            confidence: 0.9,
            skip_after: &[],
        },
        RuleDef {
            id: "SVA_PLURAL_SUBJECT",
            category: RuleCategory::Agreement,
            pattern: r"(?i)\b(?:they|we|you)\s+(is|was|has|does)\b",
            severity: Severity::High,
            message: "Subject-verb agreement: plural subjects take the plural verb form",
            replacement: Replacement::Map(PLURAL_SUBJECT_FIXES),
            confidence: 0.85,
            skip_after: AUXILIARY_LEADERS,
        },
        RuleDef {
            id: "ARTICLE_A_BEFORE_VOWEL",
            category: RuleCategory::Articles,
            pattern: r"(?i)\b(a)\s+(?:a|e[^u]|i|o[^n]|un[^i])\w*",
            severity: Severity::Medium,
            message: "Article: use \"an\" before a vowel sound",
            replacement: Replacement::Fixed("an"),
            confidence: 0.7,
            skip_after: &[],
        },
        RuleDef {
            id: "ARTICLE_AN_BEFORE_CONSONANT",
            category: RuleCategory::Articles,
            pattern: r"(?i)\b(an)\s+[bcdfgjklmnpqrstvwxyz]\w*",
            severity: Severity::Medium,
            message: "Article: use \"a\" before a consonant sound",
            replacement: Replacement::Fixed("a"),
            confidence: 0.7,
            skip_after: &[],
        },
        RuleDef {
            id: "DOUBLE_NEGATIVE",
            category: RuleCategory::Negation,
            pattern: r"(?i)\b(?:don['’]?t|doesn['’]?t|didn['’]?t|can['’]?t|won['’]?t|isn['’]?t|aren['’]?t|wasn['’]?t|never)\s+(?:\w+\s+)?(nothing|nobody|nowhere|none|no one)\b",
            severity: Severity::Medium,
            message: "Double negative: use a positive word after a negative verb",
            replacement: Replacement::Map(NEGATIVE_FIXES),
            confidence: 0.8,
            skip_after: &[],
        },
        RuleDef {
            id: "DOUBLE_COMPARATIVE",
            category: RuleCategory::Structure,
            pattern: r"(?i)\b(more\s+(?:better|worse|bigger|smaller|easier|harder|faster|slower|older|younger|cheaper|happier))\b",
            severity: Severity::Medium,
            message: "Double comparative: drop \"more\" before a comparative adjective",
            replacement: Replacement::Computed(drop_more),
            confidence: 0.85,
            skip_after: &[],
        },
        RuleDef {
            id: "MODAL_OF",
            category: RuleCategory::Structure,
            pattern: r"(?i)\b(?:could|should|would|must|might)\s+(of)\b",
            severity: Severity::Medium,
            message: "Use \"have\" after a modal verb, not \"of\"",
            replacement: Replacement::Fixed("have"),
            confidence: 0.9,
            skip_after: &[],
        },
        RuleDef {
            id: "LOWERCASE_I",
            category: RuleCategory::Style,
            pattern: r"(?:^|\s)(i)(?:\s|'|’|$)",
            severity: Severity::Low,
            message: "Capitalization: the pronoun \"I\" is always capitalized",
            replacement: Replacement::Fixed("I"),
            confidence: 0.8,
            skip_after: &[],
        },
    ]
}

/// A set of compiled rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<GrammarRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<GrammarRule>) -> Self {
        Self { rules }
    }

    /// Built-in English rules
    ///
    /// Patterns that fail to compile are logged and skipped.
    pub fn builtin(run_on_max_words: usize) -> Self {
        let mut rules: Vec<GrammarRule> = pattern_rules()
            .into_iter()
            .filter_map(|def| match Regex::new(def.pattern) {
                Ok(regex) => Some(GrammarRule {
                    id: def.id.to_string(),
                    category: def.category,
                    matcher: RuleMatcher::Pattern(regex),
                    severity: def.severity,
                    message: def.message.to_string(),
                    replacement: def.replacement,
                    confidence: def.confidence,
                    skip_after: def.skip_after,
                }),
                Err(e) => {
                    tracing::error!(rule = def.id, error = %e, "Failed to compile grammar rule");
                    None
                },
            })
            .collect();

        rules.push(GrammarRule {
            id: "RUN_ON_SENTENCE".to_string(),
            category: RuleCategory::Structure,
            matcher: RuleMatcher::SentenceLength {
                max_words: run_on_max_words,
            },
            severity: Severity::Low,
            message: format!(
                "Long sentence: consider splitting sentences over {} words",
                run_on_max_words
            ),
            replacement: Replacement::None,
            confidence: 0.6,
            skip_after: &[],
        });
        rules.push(GrammarRule {
            id: "REPEATED_WORD".to_string(),
            category: RuleCategory::Style,
            matcher: RuleMatcher::RepeatedWord {
                allowed: &["had", "that"],
            },
            severity: Severity::Low,
            message: "Repeated word".to_string(),
            replacement: Replacement::None,
            confidence: 0.75,
            skip_after: &[],
        });

        Self { rules }
    }

    /// Restrict to the categories named in `focus_areas`
    ///
    /// Focus areas that are not rule categories are ignored; when none of
    /// them names a category every rule stays active.
    pub fn filtered(&self, focus_areas: &[String]) -> Vec<&GrammarRule> {
        let categories: Vec<RuleCategory> = focus_areas
            .iter()
            .filter_map(|area| area.parse().ok())
            .collect();
        self.rules
            .iter()
            .filter(|rule| categories.is_empty() || categories.contains(&rule.category))
            .collect()
    }

    /// Run every active rule
    pub fn check(&self, text: &str, focus_areas: &[String]) -> Vec<DetectedIssue> {
        self.filtered(focus_areas)
            .into_iter()
            .flat_map(|rule| rule.check(text))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
