//! Language-model critiques
//!
//! Prompts ask for a single JSON object. Replies are parsed into strict
//! schemas; anything that does not fit (no JSON, missing required fields,
//! scores outside [0, 1]) is treated the same as a failed call so the
//! analyzer falls back to its documented default.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize};
use tutor_core::{ConversationContext, GenerateRequest, LanguageModel, ProficiencyLevel};

const MAX_CRITIQUE_TOKENS: u32 = 512;
const CRITIQUE_TEMPERATURE: f32 = 0.1;

/// One error reported by the model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CritiqueError {
    #[serde(alias = "message")]
    pub description: String,
    #[serde(default)]
    pub severity: Option<String>,
    /// Offending text as it appears in the utterance
    #[serde(default, alias = "text")]
    pub original: Option<String>,
    #[serde(default, alias = "correction")]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Grammar critique reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarCritique {
    pub errors: Vec<CritiqueError>,
    #[serde(alias = "fluency_score")]
    pub fluency_score: f32,
    #[serde(alias = "vocabulary_score")]
    pub vocabulary_score: f32,
    #[serde(default, alias = "contextual_feedback")]
    pub contextual_feedback: Vec<String>,
}

/// One word-level suggestion reported by the model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CritiqueSuggestion {
    pub word: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Vocabulary critique reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyCritique {
    #[serde(alias = "vocabulary_score")]
    pub vocabulary_score: f32,
    #[serde(default)]
    pub suggestions: Vec<CritiqueSuggestion>,
    #[serde(default, alias = "contextual_feedback")]
    pub feedback: Vec<String>,
}

/// Fluency critique reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluencyCritique {
    #[serde(alias = "fluency_score")]
    pub fluency_score: f32,
    #[serde(default, alias = "contextual_feedback")]
    pub feedback: Vec<String>,
}

/// A reply schema with range checks beyond what serde enforces
pub trait Critique: DeserializeOwned {
    fn validate(&self) -> Result<(), String>;
}

fn check_score(name: &str, value: f32) -> Result<(), String> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} out of range: {}", name, value))
    }
}

fn check_optional(name: &str, value: Option<f32>) -> Result<(), String> {
    value.map_or(Ok(()), |v| check_score(name, v))
}

impl Critique for GrammarCritique {
    fn validate(&self) -> Result<(), String> {
        check_score("fluencyScore", self.fluency_score)?;
        check_score("vocabularyScore", self.vocabulary_score)?;
        for error in &self.errors {
            check_optional("errors[].confidence", error.confidence)?;
        }
        Ok(())
    }
}

impl Critique for VocabularyCritique {
    fn validate(&self) -> Result<(), String> {
        check_score("vocabularyScore", self.vocabulary_score)?;
        for suggestion in &self.suggestions {
            check_optional("suggestions[].confidence", suggestion.confidence)?;
        }
        Ok(())
    }
}

impl Critique for FluencyCritique {
    fn validate(&self) -> Result<(), String> {
        check_score("fluencyScore", self.fluency_score)
    }
}

/// Why a critique could not be used
#[derive(Debug, Clone, PartialEq)]
pub enum CritiqueFailure {
    /// The model call itself failed
    Service(String),
    /// The reply did not match the schema
    Malformed(String),
}

impl fmt::Display for CritiqueFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CritiqueFailure::Service(e) => write!(f, "service error: {}", e),
            CritiqueFailure::Malformed(e) => write!(f, "malformed critique: {}", e),
        }
    }
}

/// First balanced `{...}` object in `text`, skipping braces inside strings
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {},
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            },
            _ => {},
        }
    }
    None
}

/// Parse and validate a reply, failing closed
pub fn parse_critique<T: Critique>(text: &str) -> Result<T, CritiqueFailure> {
    let json = extract_json_object(text)
        .ok_or_else(|| CritiqueFailure::Malformed("no JSON object in reply".to_string()))?;
    let critique: T =
        serde_json::from_str(json).map_err(|e| CritiqueFailure::Malformed(e.to_string()))?;
    critique.validate().map_err(CritiqueFailure::Malformed)?;
    Ok(critique)
}

/// Send a critique prompt and parse the reply
pub async fn request_critique<T: Critique>(
    llm: &dyn LanguageModel,
    request: GenerateRequest,
) -> Result<T, CritiqueFailure> {
    let response = llm
        .generate(request)
        .await
        .map_err(|e| CritiqueFailure::Service(e.to_string()))?;
    parse_critique(&response.text)
}

fn learner_line(context: &ConversationContext, level: ProficiencyLevel) -> String {
    match &context.topic {
        Some(topic) => format!("Learner level: {}. Conversation topic: {}.", level, topic),
        None => format!("Learner level: {}.", level),
    }
}

fn build_request(system: &str, user: String) -> GenerateRequest {
    GenerateRequest::new(system)
        .with_user_message(user)
        .with_max_tokens(MAX_CRITIQUE_TOKENS)
        .with_temperature(CRITIQUE_TEMPERATURE)
        .with_json_output()
}

const GRAMMAR_SYSTEM: &str = "You are a patient English tutor assessing one learner utterance. \
Reply with a single JSON object and nothing else, shaped as \
{\"errors\":[{\"description\":string,\"severity\":\"high\"|\"medium\"|\"low\",\
\"original\":string,\"suggestion\":string,\"confidence\":number}],\
\"fluencyScore\":number,\"vocabularyScore\":number,\"contextualFeedback\":[string]}. \
All scores and confidences are between 0 and 1. Only report real errors.";

const VOCABULARY_SYSTEM: &str = "You are an English vocabulary coach. \
Reply with a single JSON object and nothing else, shaped as \
{\"vocabularyScore\":number,\"suggestions\":[{\"word\":string,\"alternatives\":[string],\
\"explanation\":string,\"confidence\":number}],\"feedback\":[string]}. \
Scores and confidences are between 0 and 1. Suggest words suited to the learner's level.";

const FLUENCY_SYSTEM: &str = "You are an English speaking coach judging how natural and fluent \
an utterance reads. Reply with a single JSON object and nothing else, shaped as \
{\"fluencyScore\":number,\"feedback\":[string]}. The score is between 0 and 1.";

/// Grammar prompt including the issues the local rules already found
pub fn grammar_request(
    text: &str,
    context: &ConversationContext,
    level: ProficiencyLevel,
    local_findings: &[String],
) -> GenerateRequest {
    let mut user = format!("{}\nUtterance: \"{}\"", learner_line(context, level), text);
    if !local_findings.is_empty() {
        user.push_str("\nAlready detected by rules (do not repeat):");
        for finding in local_findings {
            user.push_str("\n- ");
            user.push_str(finding);
        }
    }
    build_request(GRAMMAR_SYSTEM, user)
}

pub fn vocabulary_request(
    text: &str,
    context: &ConversationContext,
    level: ProficiencyLevel,
    off_level_words: &[String],
) -> GenerateRequest {
    let mut user = format!("{}\nUtterance: \"{}\"", learner_line(context, level), text);
    if !off_level_words.is_empty() {
        user.push_str(&format!(
            "\nWords outside the learner's level: {}",
            off_level_words.join(", ")
        ));
    }
    build_request(VOCABULARY_SYSTEM, user)
}

pub fn fluency_request(
    text: &str,
    context: &ConversationContext,
    level: ProficiencyLevel,
    words_per_minute: Option<f32>,
) -> GenerateRequest {
    let mut user = format!("{}\nUtterance: \"{}\"", learner_line(context, level), text);
    if let Some(wpm) = words_per_minute {
        user.push_str(&format!("\nSpeaking rate: {:.0} words per minute", wpm));
    }
    build_request(FLUENCY_SYSTEM, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_code_fence() {
        let reply = "Sure!\n```json\n{\"fluencyScore\": 0.8, \"feedback\": [\"ok {fine}\"]}\n```";
        let json = extract_json_object(reply).unwrap();
        assert!(json.starts_with('{') && json.ends_with('}'));

        let critique: FluencyCritique = parse_critique(reply).unwrap();
        assert!((critique.fluency_score - 0.8).abs() < 1e-6);
        assert_eq!(critique.feedback, vec!["ok {fine}"]);
    }

    #[test]
    fn test_grammar_critique_camel_and_snake_case() {
        let camel = r#"{"errors":[{"description":"Use doesn't","severity":"high","original":"don't"}],
            "fluencyScore":0.6,"vocabularyScore":0.5,"contextualFeedback":["Nice"]}"#;
        let critique: GrammarCritique = parse_critique(camel).unwrap();
        assert_eq!(critique.errors.len(), 1);
        assert_eq!(critique.errors[0].original.as_deref(), Some("don't"));

        let snake = r#"{"errors":[],"fluency_score":0.6,"vocabulary_score":0.5}"#;
        let critique: GrammarCritique = parse_critique(snake).unwrap();
        assert!(critique.contextual_feedback.is_empty());
    }

    #[test]
    fn test_fails_closed() {
        assert!(matches!(
            parse_critique::<FluencyCritique>("I think it's fine"),
            Err(CritiqueFailure::Malformed(_))
        ));
        assert!(parse_critique::<FluencyCritique>(r#"{"fluencyScore": 7}"#).is_err());
        assert!(parse_critique::<GrammarCritique>(r#"{"errors": []}"#).is_err());
        assert!(parse_critique::<FluencyCritique>(r#"{"fluencyScore": "high"}"#).is_err());
        assert!(parse_critique::<FluencyCritique>(r#"{"fluencyScore": 0.5"#).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let reply = r#"{"vocabularyScore":0.5,"suggestions":[{"word":"big","confidence":3.0}]}"#;
        assert!(parse_critique::<VocabularyCritique>(reply).is_err());
    }

    #[test]
    fn test_grammar_prompt_lists_local_findings() {
        let context = ConversationContext::new(ProficiencyLevel::Beginner).with_topic("travel");
        let request = grammar_request(
            "He don't like it.",
            &context,
            ProficiencyLevel::Beginner,
            &["Subject-verb agreement".to_string()],
        );
        assert!(request.json_output);
        let user = &request.messages[1].content;
        assert!(user.contains("travel"));
        assert!(user.contains("beginner"));
        assert!(user.contains("Subject-verb agreement"));
    }
}
