//! Learner proficiency tiers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Ordinal learner skill classification
///
/// Also used for word complexity: a word's tier is the lowest learner tier
/// expected to use it comfortably.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Proficient,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 4] = [
        ProficiencyLevel::Beginner,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Advanced,
        ProficiencyLevel::Proficient,
    ];

    /// Numeric tier weight, 1 (beginner) to 4 (proficient)
    pub fn weight(&self) -> f32 {
        match self {
            ProficiencyLevel::Beginner => 1.0,
            ProficiencyLevel::Intermediate => 2.0,
            ProficiencyLevel::Advanced => 3.0,
            ProficiencyLevel::Proficient => 4.0,
        }
    }

    /// Distance between the lowest and highest tier weights
    pub fn weight_range() -> f32 {
        ProficiencyLevel::Proficient.weight() - ProficiencyLevel::Beginner.weight()
    }

    /// Nearest tier for a (possibly fractional) weight
    pub fn from_weight(weight: f32) -> Self {
        if !weight.is_finite() || weight < 1.5 {
            ProficiencyLevel::Beginner
        } else if weight < 2.5 {
            ProficiencyLevel::Intermediate
        } else if weight < 3.5 {
            ProficiencyLevel::Advanced
        } else {
            ProficiencyLevel::Proficient
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "beginner",
            ProficiencyLevel::Intermediate => "intermediate",
            ProficiencyLevel::Advanced => "advanced",
            ProficiencyLevel::Proficient => "proficient",
        }
    }

    /// Advanced and proficient learners get pushed toward richer vocabulary
    pub fn wants_advanced_vocabulary(&self) -> bool {
        *self >= ProficiencyLevel::Advanced
    }
}

impl std::fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = Error;

    /// Accepts tier names plus common CEFR labels
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "elementary" | "a1" | "a2" => Ok(ProficiencyLevel::Beginner),
            "intermediate" | "upper_intermediate" | "upper-intermediate" | "b1" | "b2" => {
                Ok(ProficiencyLevel::Intermediate)
            },
            "advanced" | "c1" => Ok(ProficiencyLevel::Advanced),
            "proficient" | "expert" | "native" | "c2" => Ok(ProficiencyLevel::Proficient),
            other => Err(Error::InvalidConfig(format!(
                "unknown proficiency level '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_and_weights() {
        assert!(ProficiencyLevel::Beginner < ProficiencyLevel::Advanced);
        assert_eq!(ProficiencyLevel::weight_range(), 3.0);
        assert_eq!(ProficiencyLevel::from_weight(2.4), ProficiencyLevel::Intermediate);
        assert_eq!(ProficiencyLevel::from_weight(f32::NAN), ProficiencyLevel::Beginner);
    }

    #[test]
    fn test_parse_cefr() {
        assert_eq!("B2".parse::<ProficiencyLevel>().unwrap(), ProficiencyLevel::Intermediate);
        assert_eq!("c2".parse::<ProficiencyLevel>().unwrap(), ProficiencyLevel::Proficient);
        assert!("wizard".parse::<ProficiencyLevel>().is_err());
    }
}
