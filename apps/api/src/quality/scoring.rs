use serde::Serialize;

use crate::llm_client::StructuredResponse;

/// Minimum passing score for every domain and for the overall score.
pub const QUALITY_THRESHOLD: f64 = 75.0;

/// Pass mark for a single validation sub-check (format, keywords, content).
pub const SUBCHECK_PASS_SCORE: f64 = 70.0;

/// Dimension score at or above which strengths are reported; below it,
/// improvement items are reported instead. Independent of `QUALITY_THRESHOLD`.
pub const STRENGTH_CUTOFF: f64 = 80.0;

/// Score below which a failing CV/letter domain is escalated to high priority.
pub const HIGH_PRIORITY_CUTOFF: f64 = 60.0;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the given sub-scores, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mean of the named numeric fields of one completion, clamped to 0..=100.
/// Unrounded: cutoffs are checked against this value and only the stored
/// dimension score goes through `round2`.
pub fn field_mean(llm: &StructuredResponse, fields: &[&str]) -> f64 {
    let values: Vec<f64> = fields.iter().map(|f| llm.number(f)).collect();
    mean(&values).clamp(0.0, 100.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Score record
// ────────────────────────────────────────────────────────────────────────────

/// Result of one validation or evaluation sub-step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub score: f64,
    pub issues: Vec<String>,
    pub passes: bool,
}

impl ScoreRecord {
    /// `passes` is always derived from `threshold`, never set directly.
    pub fn new(score: f64, issues: Vec<String>, threshold: f64) -> Self {
        let score = score.clamp(0.0, 100.0);
        Self {
            score,
            issues,
            passes: score >= threshold,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Weight tables
// ────────────────────────────────────────────────────────────────────────────

/// Fixed, named weights for one aggregation context. Scores are passed in
/// table order, so the component count is checked at compile time.
#[derive(Debug, Clone, Copy)]
pub struct WeightTable<const N: usize> {
    pub entries: [(&'static str, f64); N],
}

impl<const N: usize> WeightTable<N> {
    pub const fn new(entries: [(&'static str, f64); N]) -> Self {
        Self { entries }
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn weight(&self, component: &str) -> f64 {
        self.entries
            .iter()
            .find(|(name, _)| *name == component)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// `(component, weight × score)` in table order.
    pub fn weighted(&self, scores: [f64; N]) -> [(&'static str, f64); N] {
        let mut out = self.entries;
        for (slot, score) in out.iter_mut().zip(scores) {
            slot.1 *= score;
        }
        out
    }

    /// Σ(weight × score) at full precision.
    pub fn total(&self, scores: [f64; N]) -> f64 {
        self.weighted(scores).iter().map(|(_, v)| v).sum()
    }

    /// Σ(weight × score), rounded to two decimals.
    pub fn combine(&self, scores: [f64; N]) -> f64 {
        round2(self.total(scores))
    }
}

/// Per-component weights used by `QualityMetrics`.
pub const METRICS_CV_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("content_relevance", 0.3),
    ("skills_match", 0.25),
    ("experience_quality", 0.25),
    ("format_compliance", 0.2),
]);

pub const METRICS_LETTER_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("customization", 0.3),
    ("content_relevance", 0.3),
    ("professional_tone", 0.2),
    ("formatting", 0.2),
]);

pub const METRICS_ATS_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("keyword_optimization", 0.3),
    ("format_compliance", 0.3),
    ("section_structure", 0.2),
    ("content_clarity", 0.2),
]);

/// Overall application score used by `QualityMetrics`.
pub const METRICS_OVERALL_WEIGHTS: WeightTable<3> =
    WeightTable::new([("cv", 0.4), ("letter", 0.3), ("ats", 0.3)]);

/// Overall application score used by the `Coordinator`. Deliberately distinct
/// from `METRICS_OVERALL_WEIGHTS`.
pub const COORDINATOR_WEIGHTS: WeightTable<3> = WeightTable::new([
    ("ats_compliance", 0.4),
    ("cv_quality", 0.4),
    ("letter_quality", 0.2),
]);

pub const ATS_VALIDATION_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("format_compliance", 0.3),
    ("keyword_optimization", 0.3),
    ("section_structure", 0.2),
    ("content_clarity", 0.2),
]);

pub const CV_EVALUATION_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("content_quality", 0.3),
    ("achievements", 0.25),
    ("experience_presentation", 0.25),
    ("skills_presentation", 0.2),
]);

pub const LETTER_EVALUATION_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("content_relevance", 0.25),
    ("professional_tone", 0.25),
    ("customization", 0.25),
    ("structure_format", 0.25),
]);

/// Drops repeated strings, keeping the first occurrence.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
