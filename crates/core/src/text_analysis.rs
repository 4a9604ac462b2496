//! Syntactic / entity / key-phrase analysis types
//!
//! Mirrors the response shape of the external text-analysis service.
//! Offsets are character offsets into the analyzed text.

use serde::{Deserialize, Serialize};

/// Universal part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Noun,
    Propn,
    Verb,
    Aux,
    Adj,
    Adv,
    Pron,
    Det,
    Adp,
    Cconj,
    Sconj,
    Num,
    Part,
    Punct,
    #[serde(other)]
    Other,
}

impl PartOfSpeech {
    pub fn is_verb(&self) -> bool {
        matches!(self, PartOfSpeech::Verb | PartOfSpeech::Aux)
    }

    pub fn is_noun(&self) -> bool {
        matches!(self, PartOfSpeech::Noun | PartOfSpeech::Propn | PartOfSpeech::Pron)
    }
}

/// One tagged token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxToken {
    pub text: String,
    pub part_of_speech: PartOfSpeech,
    pub begin_offset: usize,
    #[serde(default)]
    pub lemma: Option<String>,
}

/// Detected named entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    /// Service-defined type, e.g. PERSON, LOCATION
    #[serde(rename = "type")]
    pub entity_type: String,
    pub confidence: f32,
    pub begin_offset: usize,
    pub end_offset: usize,
}

/// Detected key phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPhrase {
    pub text: String,
    pub confidence: f32,
    pub begin_offset: usize,
    pub end_offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_maps_to_other() {
        let token: SyntaxToken = serde_json::from_str(
            r#"{"text":"x","part_of_speech":"INTJ","begin_offset":0}"#,
        )
        .unwrap();
        assert_eq!(token.part_of_speech, PartOfSpeech::Other);
    }

    #[test]
    fn test_entity_type_field_name() {
        let entity: Entity = serde_json::from_str(
            r#"{"text":"Paris","type":"LOCATION","confidence":0.98,"begin_offset":10,"end_offset":15}"#,
        )
        .unwrap();
        assert_eq!(entity.entity_type, "LOCATION");
    }
}
