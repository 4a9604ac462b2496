//! Shared scoring helpers
//!
//! Every analyzer funnels its numbers through [`clamp_unit`] and its lists
//! through [`rank_and_truncate`], which keeps the [0, 1] and ordering
//! guarantees in one place.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tutor_core::DetectedIssue;

/// Clamp to [0, 1]; NaN and infinities collapse to 0
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Weighted mean of `(weight, value)` pairs, clamped; 0 when weights sum to 0
pub fn weighted_mean(parts: &[(f32, f32)]) -> f32 {
    let total: f32 = parts.iter().map(|(w, _)| w).sum();
    if total <= 0.0 {
        return 0.0;
    }
    clamp_unit(parts.iter().map(|(w, v)| w * v).sum::<f32>() / total)
}

/// Deterministic issue ordering: confidence desc, severity desc, span start, description
pub fn compare_issues(a: &DetectedIssue, b: &DetectedIssue) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.severity.cmp(&a.severity))
        .then_with(|| {
            let start = |i: &DetectedIssue| i.span.map(|s| s.start).unwrap_or(usize::MAX);
            start(a).cmp(&start(b))
        })
        .then_with(|| a.description.cmp(&b.description))
}

/// Sort then keep at most `max`; returns the kept list and how many were dropped
pub fn rank_and_truncate(mut issues: Vec<DetectedIssue>, max: usize) -> (Vec<DetectedIssue>, usize) {
    issues.sort_by(compare_issues);
    let suppressed = issues.len().saturating_sub(max);
    issues.truncate(max);
    (issues, suppressed)
}

/// Running analyzer confidence
///
/// Starts from a baseline, moves up for each remote signal that arrived and
/// down for each that failed, and never drops below `floor`.
#[derive(Debug, Clone, Copy)]
pub struct Confidence {
    value: f32,
    floor: f32,
}

impl Confidence {
    pub fn new(baseline: f32, floor: f32) -> Self {
        Self {
            value: baseline,
            floor,
        }
    }

    pub fn raise(&mut self, by: f32) {
        self.value += by;
    }

    pub fn lower(&mut self, by: f32) {
        self.value -= by;
    }

    /// Apply a remote outcome; `None` means the call was not made
    pub fn remote(&mut self, outcome: Option<bool>, bonus: f32, penalty: f32) {
        match outcome {
            Some(true) => self.raise(bonus),
            Some(false) => self.lower(penalty),
            None => {},
        }
    }

    pub fn value(&self) -> f32 {
        clamp_unit(self.value.max(self.floor))
    }
}

/// Result of one remote call as seen by an analyzer
#[derive(Debug)]
pub(crate) enum Remote<T> {
    /// Service not configured or contextual analysis disabled
    Skipped,
    Ok(T),
    Failed,
}

impl<T> Remote<T> {
    /// Log and count a failed call, returning [`Remote::Failed`]
    pub(crate) fn failed(
        analyzer: &'static str,
        service: &'static str,
        error: impl std::fmt::Display,
    ) -> Self {
        tracing::warn!(analyzer, service, error = %error, "Remote signal unavailable, using fallback");
        crate::metrics::record_fallback(analyzer, service);
        Remote::Failed
    }

    /// `Some(true)` on success, `Some(false)` on failure, `None` when skipped
    pub(crate) fn outcome(&self) -> Option<bool> {
        match self {
            Remote::Skipped => None,
            Remote::Ok(_) => Some(true),
            Remote::Failed => Some(false),
        }
    }

    pub(crate) fn ok(self) -> Option<T> {
        match self {
            Remote::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn as_ok(&self) -> Option<&T> {
        match self {
            Remote::Ok(value) => Some(value),
            _ => None,
        }
    }
}

/// Common view over analyzer outputs
pub trait AnalysisResult {
    /// Named scores, each in [0, 1]
    fn scores(&self) -> Vec<(&'static str, f32)>;

    fn confidence(&self) -> f32;

    fn timestamp(&self) -> DateTime<Utc>;

    /// Remote services that failed while producing this result
    fn degraded_services(&self) -> &[String];

    fn is_degraded(&self) -> bool {
        !self.degraded_services().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::{Severity, TextSpan};

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.4), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(f32::INFINITY), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
    }

    #[test]
    fn test_weighted_mean() {
        assert!((weighted_mean(&[(0.5, 1.0), (0.5, 0.0)]) - 0.5).abs() < 1e-6);
        assert_eq!(weighted_mean(&[(0.0, 1.0)]), 0.0);
        assert_eq!(weighted_mean(&[]), 0.0);
    }

    #[test]
    fn test_rank_orders_by_confidence_then_severity() {
        let issues = vec![
            DetectedIssue::grammar("a", "low conf", Severity::High).with_confidence(0.5),
            DetectedIssue::grammar("b", "tie low sev", Severity::Low).with_confidence(0.9),
            DetectedIssue::grammar("c", "tie high sev", Severity::High).with_confidence(0.9),
        ];

        let (ranked, suppressed) = rank_and_truncate(issues, 2);
        assert_eq!(suppressed, 1);
        assert_eq!(ranked[0].rule_id.as_deref(), Some("c"));
        assert_eq!(ranked[1].rule_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_rank_is_deterministic_on_full_ties() {
        let make = |start: usize, desc: &str| {
            DetectedIssue::grammar("r", desc, Severity::Low)
                .with_confidence(0.7)
                .with_span(TextSpan::new(start, start + 1))
        };
        let forward = vec![make(5, "x"), make(1, "y"), make(1, "a")];
        let mut reversed = forward.clone();
        reversed.reverse();

        let (a, _) = rank_and_truncate(forward, 10);
        let (b, _) = rank_and_truncate(reversed, 10);
        assert_eq!(a, b);
        assert_eq!(a[0].description, "a");
        assert_eq!(a[2].span.map(|s| s.start), Some(5));
    }

    #[test]
    fn test_confidence_floor_and_ceiling() {
        let mut confidence = Confidence::new(0.7, 0.3);
        confidence.remote(Some(false), 0.1, 0.5);
        assert_eq!(confidence.value(), 0.3);

        let mut confidence = Confidence::new(0.7, 0.3);
        confidence.remote(Some(true), 0.2, 0.1);
        confidence.remote(Some(true), 0.2, 0.1);
        assert_eq!(confidence.value(), 1.0);

        let mut confidence = Confidence::new(0.7, 0.3);
        confidence.remote(None, 0.2, 0.1);
        assert!((confidence.value() - 0.7).abs() < 1e-6);
    }
}
