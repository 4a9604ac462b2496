//! Encouragement phrasing
//!
//! Presentation only: picks a phrase for a score that has already been
//! computed. Nothing in the scoring path calls this, so the randomness
//! never reaches a number.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tutor_core::{DetectedIssue, IssueKind, IssueSource};

const EXCELLENT: &[&str] = &[
    "Excellent work! That sounded very natural.",
    "Fantastic! You're expressing yourself really well.",
    "Superb answer, keep it up!",
];

const GOOD: &[&str] = &[
    "Good job! You're making real progress.",
    "Nice work, that was clear and easy to follow.",
    "Well done! Just a few small things to polish.",
];

const DEVELOPING: &[&str] = &[
    "Good effort! Let's look at a couple of things together.",
    "You're getting there. Practice makes progress!",
    "Nice try! Small steps add up quickly.",
];

const STARTING: &[&str] = &[
    "Thanks for trying! Every sentence helps you learn.",
    "Don't worry about mistakes, they're how we learn.",
    "Keep going! Let's practice this one again.",
];

fn band(score: f32) -> &'static [&'static str] {
    match score {
        s if s >= 0.85 => EXCELLENT,
        s if s >= 0.65 => GOOD,
        s if s >= 0.4 => DEVELOPING,
        _ => STARTING,
    }
}

pub struct EncouragementPicker {
    rng: Mutex<StdRng>,
}

impl Default for EncouragementPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl EncouragementPicker {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible phrasing, for tests and demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn pick(&self, score: f32) -> &'static str {
        let phrases = band(score);
        let mut rng = self.rng.lock();
        phrases.choose(&mut *rng).copied().unwrap_or(phrases[0])
    }

    pub fn encouragement_issue(&self, score: f32) -> DetectedIssue {
        DetectedIssue::new(IssueKind::Encouragement, self.pick(score), IssueSource::Heuristic)
            .with_confidence(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_uses_score_band() {
        let picker = EncouragementPicker::new();
        assert!(EXCELLENT.contains(&picker.pick(0.95)));
        assert!(GOOD.contains(&picker.pick(0.7)));
        assert!(DEVELOPING.contains(&picker.pick(0.5)));
        assert!(STARTING.contains(&picker.pick(0.1)));
        assert!(STARTING.contains(&picker.pick(f32::NAN)));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = EncouragementPicker::seeded(7);
        let b = EncouragementPicker::seeded(7);
        let first: Vec<_> = (0..5).map(|_| a.pick(0.9)).collect();
        let second: Vec<_> = (0..5).map(|_| b.pick(0.9)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encouragement_issue_kind() {
        let issue = EncouragementPicker::seeded(1).encouragement_issue(0.8);
        assert_eq!(issue.kind, IssueKind::Encouragement);
        assert!(GOOD.contains(&issue.description.as_str()));
    }
}
