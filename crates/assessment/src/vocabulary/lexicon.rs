//! Lexical reference table
//!
//! Maps words to a proficiency tier plus synonyms, simpler and more
//! advanced alternatives, and topics to related words. Built once and
//! shared read-only (`Arc<Lexicon>`) by every analyzer instance.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tutor_core::ProficiencyLevel::{self, Advanced, Beginner, Intermediate, Proficient};

use crate::error::AssessmentError;

/// One graded word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub level: ProficiencyLevel,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub simpler: Vec<String>,
    #[serde(default)]
    pub advanced: Vec<String>,
}

/// Read-only word and topic table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    words: HashMap<String, LexiconEntry>,
    #[serde(default)]
    topics: HashMap<String, Vec<String>>,
}

type Row = (
    &'static str,
    ProficiencyLevel,
    &'static [&'static str],
    &'static [&'static str],
    &'static [&'static str],
);

// (word, level, synonyms, simpler, advanced)
const WORDS: &[Row] = &[
    ("good", Beginner, &["fine", "nice"], &[], &["excellent", "outstanding"]),
    ("bad", Beginner, &["poor"], &[], &["dreadful", "inadequate"]),
    ("big", Beginner, &["large"], &[], &["enormous", "substantial"]),
    ("small", Beginner, &["little"], &[], &["tiny", "minuscule"]),
    ("happy", Beginner, &["glad"], &[], &["delighted", "content"]),
    ("sad", Beginner, &["unhappy"], &[], &["miserable", "melancholy"]),
    ("nice", Beginner, &["kind", "pleasant"], &[], &["delightful", "charming"]),
    ("very", Beginner, &["really"], &[], &["extremely", "remarkably"]),
    ("get", Beginner, &["receive"], &[], &["obtain", "acquire"]),
    ("go", Beginner, &["move"], &[], &["proceed", "travel"]),
    ("see", Beginner, &["look"], &[], &["observe", "notice"]),
    ("say", Beginner, &["tell"], &[], &["state", "mention"]),
    ("eat", Beginner, &["have"], &[], &["dine", "consume"]),
    ("walk", Beginner, &["stroll"], &[], &["wander", "stride"]),
    ("buy", Beginner, &["get"], &[], &["purchase", "acquire"]),
    ("make", Beginner, &["build"], &[], &["create", "construct"]),
    ("thing", Beginner, &["item"], &[], &["object", "element"]),
    ("place", Beginner, &["spot"], &[], &["location", "venue"]),
    ("food", Beginner, &["meal"], &[], &["cuisine", "fare"]),
    ("house", Beginner, &["home"], &[], &["residence", "dwelling"]),
    ("job", Beginner, &["work"], &[], &["occupation", "profession"]),
    ("friend", Beginner, &["pal"], &[], &["companion", "acquaintance"]),
    ("city", Beginner, &["town"], &[], &["metropolis", "municipality"]),
    ("trip", Beginner, &["journey"], &[], &["excursion", "expedition"]),
    ("like", Beginner, &["enjoy"], &[], &["appreciate", "relish"]),
    ("want", Beginner, &["wish"], &[], &["desire", "prefer"]),
    ("help", Beginner, &["aid"], &[], &["assist", "support"]),
    ("start", Beginner, &["begin"], &[], &["commence", "initiate"]),
    ("delicious", Intermediate, &["tasty"], &["good"], &["exquisite", "delectable"]),
    ("comfortable", Intermediate, &["cozy"], &["nice"], &["luxurious"]),
    ("expensive", Intermediate, &["costly", "pricey"], &["dear"], &["exorbitant"]),
    ("interesting", Intermediate, &["engaging"], &["fun"], &["fascinating", "captivating"]),
    ("journey", Intermediate, &["trip"], &["trip"], &["expedition", "odyssey"]),
    ("restaurant", Intermediate, &["diner", "eatery"], &["cafe"], &[]),
    ("colleague", Intermediate, &["coworker"], &["workmate"], &["associate"]),
    ("experience", Intermediate, &["event"], &["time"], &["encounter"]),
    ("important", Intermediate, &["key", "major"], &["big"], &["crucial", "essential"]),
    ("difficult", Intermediate, &["hard", "tough"], &["hard"], &["challenging", "arduous"]),
    ("beautiful", Intermediate, &["lovely", "pretty"], &["nice"], &["stunning", "exquisite"]),
    ("tourist", Intermediate, &["visitor", "traveler"], &["visitor"], &[]),
    ("decide", Intermediate, &["choose"], &["pick"], &["determine", "resolve"]),
    ("explain", Intermediate, &["describe"], &["tell"], &["clarify", "elaborate"]),
    ("improve", Intermediate, &["better"], &["fix"], &["enhance", "refine"]),
    ("extraordinary", Advanced, &["remarkable", "exceptional"], &["amazing", "unusual"], &[]),
    ("establishment", Advanced, &["business", "venue"], &["place", "shop"], &[]),
    ("magnificent", Advanced, &["splendid", "superb"], &["beautiful", "great"], &[]),
    ("accommodation", Advanced, &["lodging"], &["room", "hotel"], &[]),
    ("itinerary", Advanced, &["schedule", "route"], &["plan"], &[]),
    ("cuisine", Advanced, &["cooking"], &["food"], &["gastronomy"]),
    ("consequently", Advanced, &["therefore", "hence"], &["so"], &[]),
    ("substantial", Advanced, &["considerable"], &["big", "large"], &[]),
    ("remarkable", Advanced, &["notable", "striking"], &["amazing"], &[]),
    ("negotiate", Advanced, &["bargain"], &["talk", "agree"], &[]),
    ("sophisticated", Advanced, &["refined", "complex"], &["smart", "fancy"], &[]),
    ("enormous", Advanced, &["huge", "immense"], &["big"], &[]),
    ("delighted", Advanced, &["thrilled"], &["happy"], &[]),
    ("fascinating", Advanced, &["captivating"], &["interesting"], &[]),
    ("purchase", Advanced, &["acquire"], &["buy"], &[]),
    ("quintessential", Proficient, &["archetypal"], &["typical", "classic"], &[]),
    ("ubiquitous", Proficient, &["pervasive"], &["common", "everywhere"], &[]),
    ("serendipitous", Proficient, &["fortuitous"], &["lucky"], &[]),
    ("meticulous", Proficient, &["scrupulous"], &["careful"], &[]),
    ("ephemeral", Proficient, &["fleeting", "transient"], &["short"], &[]),
    ("gastronomic", Proficient, &["culinary"], &["food"], &[]),
    ("exorbitant", Proficient, &["extortionate"], &["expensive"], &[]),
    ("juxtaposition", Proficient, &["contrast"], &["comparison"], &[]),
];

const TOPICS: &[(&str, &[&str])] = &[
    (
        "travel",
        &[
            "trip", "journey", "flight", "hotel", "airport", "passport", "luggage", "tourist",
            "itinerary", "accommodation", "ticket", "beach", "museum", "visit", "travel",
        ],
    ),
    (
        "food",
        &[
            "food", "meal", "restaurant", "cuisine", "delicious", "dinner", "lunch",
            "breakfast", "cook", "recipe", "taste", "menu", "dish", "eat",
        ],
    ),
    (
        "work",
        &[
            "job", "office", "colleague", "meeting", "project", "manager", "salary", "career",
            "deadline", "work", "company", "interview", "profession",
        ],
    ),
    (
        "family",
        &[
            "family", "mother", "father", "sister", "brother", "parents", "children",
            "grandmother", "cousin", "wedding", "home",
        ],
    ),
    (
        "school",
        &[
            "school", "teacher", "student", "class", "homework", "exam", "lesson",
            "university", "study", "learn", "grade",
        ],
    ),
    (
        "health",
        &[
            "health", "doctor", "hospital", "exercise", "medicine", "sleep", "healthy",
            "diet", "sick", "appointment",
        ],
    ),
    (
        "shopping",
        &[
            "shop", "store", "price", "expensive", "cheap", "purchase", "discount", "market",
            "clothes", "money", "buy",
        ],
    ),
    (
        "weather",
        &[
            "weather", "rain", "sunny", "cloudy", "snow", "temperature", "forecast", "storm",
            "wind", "cold", "warm",
        ],
    ),
    (
        "hobbies",
        &[
            "hobby", "music", "sport", "football", "reading", "painting", "guitar", "movie",
            "game", "hiking", "photography",
        ],
    ),
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Lexicon {
    /// Embedded English table
    pub fn builtin() -> Self {
        let words = WORDS
            .iter()
            .map(|(word, level, synonyms, simpler, advanced)| {
                (
                    word.to_string(),
                    LexiconEntry {
                        level: *level,
                        synonyms: owned(synonyms),
                        simpler: owned(simpler),
                        advanced: owned(advanced),
                    },
                )
            })
            .collect();
        let topics = TOPICS
            .iter()
            .map(|(topic, terms)| (topic.to_string(), owned(terms)))
            .collect();
        Self { words, topics }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, AssessmentError> {
        let parsed: Lexicon =
            serde_yaml::from_str(yaml).map_err(|e| AssessmentError::Lexicon(e.to_string()))?;
        Ok(parsed.normalized())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, AssessmentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AssessmentError::Lexicon(format!("failed to read {}: {}", path.display(), e))
        })?;
        let lexicon = Self::from_yaml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            words = lexicon.words.len(),
            topics = lexicon.topics.len(),
            "Loaded lexicon"
        );
        Ok(lexicon)
    }

    /// Lowercase keys and topic terms so lookups match tokenized words
    fn normalized(self) -> Self {
        Self {
            words: self
                .words
                .into_iter()
                .map(|(word, entry)| (word.trim().to_lowercase(), entry))
                .collect(),
            topics: self
                .topics
                .into_iter()
                .map(|(topic, terms)| {
                    (
                        topic.trim().to_lowercase(),
                        terms.into_iter().map(|t| t.trim().to_lowercase()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn entry(&self, word: &str) -> Option<&LexiconEntry> {
        self.words.get(word)
    }

    /// Tier of `word`, falling back to length buckets for unknown words
    pub fn level_of(&self, word: &str) -> ProficiencyLevel {
        if let Some(entry) = self.words.get(word) {
            return entry.level;
        }
        match word.chars().count() {
            0..=4 => Beginner,
            5..=7 => Intermediate,
            8..=10 => Advanced,
            _ => Proficient,
        }
    }

    /// Words related to `topic`; empty for unknown topics
    pub fn topic_terms(&self, topic: &str) -> &[String] {
        self.topics
            .get(topic.trim().to_lowercase().as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_grades_known_words() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.level_of("good"), Beginner);
        assert_eq!(lexicon.level_of("extraordinary"), Advanced);
        assert!(!lexicon.entry("magnificent").unwrap().simpler.is_empty());
        assert!(!lexicon.entry("big").unwrap().advanced.is_empty());
    }

    #[test]
    fn test_unknown_words_use_length_buckets() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.level_of("cat"), Beginner);
        assert_eq!(lexicon.level_of("garden"), Intermediate);
        assert_eq!(lexicon.level_of("generator"), Advanced);
        assert_eq!(lexicon.level_of("incomprehensible"), Proficient);
    }

    #[test]
    fn test_topic_terms() {
        let lexicon = Lexicon::builtin();
        assert!(lexicon.topic_terms("Travel").contains(&"hotel".to_string()));
        assert!(lexicon.topic_terms("astronomy").is_empty());
    }

    #[test]
    fn test_yaml_file_is_normalized() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "words:\n  Huge:\n    level: intermediate\n    simpler: [big]\ntopics:\n  Space: [Rocket, planet]"
        )
        .unwrap();

        let lexicon = Lexicon::from_yaml_file(file.path()).unwrap();
        assert_eq!(lexicon.len(), 1);
        assert_eq!(lexicon.entry("huge").unwrap().simpler, vec!["big"]);
        assert_eq!(lexicon.topic_terms("space"), &["rocket".to_string(), "planet".to_string()]);
    }

    #[test]
    fn test_bad_yaml_is_a_lexicon_error() {
        let err = Lexicon::from_yaml_str("words: [not, a, map]").unwrap_err();
        assert!(matches!(err, AssessmentError::Lexicon(_)));

        let err = Lexicon::from_yaml_file("/nonexistent/lexicon.yaml").unwrap_err();
        assert!(matches!(err, AssessmentError::Lexicon(_)));
    }
}
