use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::quality::scoring::{
    round2, WeightTable, METRICS_ATS_WEIGHTS, METRICS_CV_WEIGHTS, METRICS_LETTER_WEIGHTS,
    METRICS_OVERALL_WEIGHTS, QUALITY_THRESHOLD,
};

/// Raw 0–100 metrics keyed by the weight-table names. Missing keys count as 0.
pub type MetricMap = HashMap<String, f64>;

/// Short component names used in the weighted breakdown and the priority
/// strings, in weight-table order.
const CV_COMPONENTS: [&str; 4] = ["content", "skills", "experience", "format"];
const LETTER_COMPONENTS: [&str; 4] = ["customization", "content", "tone", "format"];
const ATS_COMPONENTS: [&str; 4] = ["keyword", "format", "structure", "clarity"];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentScore {
    pub component: &'static str,
    /// weight × raw metric
    pub weighted_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    pub total_score: f64,
    pub component_scores: Vec<ComponentScore>,
    pub meets_threshold: bool,
}

impl DomainScore {
    /// Lowest weighted component; the first one wins a tie.
    pub fn weakest_component(&self) -> Option<&'static str> {
        self.component_scores
            .iter()
            .fold(None::<&ComponentScore>, |lowest, c| match lowest {
                Some(l) if l.weighted_score <= c.weighted_score => Some(l),
                _ => Some(c),
            })
            .map(|c| c.component)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallComponents {
    pub cv_score: f64,
    pub letter_score: f64,
    pub ats_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallQuality {
    pub overall_score: f64,
    pub component_weights: HashMap<&'static str, f64>,
    pub meets_threshold: bool,
    pub component_scores: OverallComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub overall_quality: OverallQuality,
    pub cv_assessment: DomainScore,
    pub letter_assessment: DomainScore,
    pub ats_assessment: DomainScore,
    pub meets_all_thresholds: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Metrics
// ────────────────────────────────────────────────────────────────────────────

/// Stateless scorer over caller-supplied metric maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityMetrics;

impl QualityMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_cv_score(&self, metrics: &MetricMap) -> Result<DomainScore, AppError> {
        domain_score("cv", metrics, &METRICS_CV_WEIGHTS, CV_COMPONENTS)
    }

    pub fn calculate_letter_score(&self, metrics: &MetricMap) -> Result<DomainScore, AppError> {
        domain_score("letter", metrics, &METRICS_LETTER_WEIGHTS, LETTER_COMPONENTS)
    }

    pub fn calculate_ats_score(&self, metrics: &MetricMap) -> Result<DomainScore, AppError> {
        domain_score("ats", metrics, &METRICS_ATS_WEIGHTS, ATS_COMPONENTS)
    }

    /// cv × 0.4 + letter × 0.3 + ats × 0.3.
    pub fn calculate_overall_quality(
        &self,
        cv_score: f64,
        letter_score: f64,
        ats_score: f64,
    ) -> Result<OverallQuality, AppError> {
        for (name, score) in [("cv", cv_score), ("letter", letter_score), ("ats", ats_score)] {
            check_range(name, score)?;
        }
        let total = METRICS_OVERALL_WEIGHTS.total([cv_score, letter_score, ats_score]);

        Ok(OverallQuality {
            overall_score: round2(total),
            component_weights: METRICS_OVERALL_WEIGHTS.entries.into_iter().collect(),
            meets_threshold: total >= QUALITY_THRESHOLD,
            component_scores: OverallComponents {
                cv_score,
                letter_score,
                ats_score,
            },
        })
    }

    pub fn get_quality_assessment(
        &self,
        cv_metrics: &MetricMap,
        letter_metrics: &MetricMap,
        ats_metrics: &MetricMap,
    ) -> Result<QualityAssessment, AppError> {
        let cv = self.calculate_cv_score(cv_metrics)?;
        let letter = self.calculate_letter_score(letter_metrics)?;
        let ats = self.calculate_ats_score(ats_metrics)?;
        let overall =
            self.calculate_overall_quality(cv.total_score, letter.total_score, ats.total_score)?;

        let meets_all_thresholds = cv.meets_threshold
            && letter.meets_threshold
            && ats.meets_threshold
            && overall.meets_threshold;
        info!(
            overall_score = overall.overall_score,
            meets_all_thresholds, "Quality assessment computed"
        );

        Ok(QualityAssessment {
            overall_quality: overall,
            cv_assessment: cv,
            letter_assessment: letter,
            ats_assessment: ats,
            meets_all_thresholds,
        })
    }

    /// One entry per failing domain naming its weakest component.
    pub fn get_improvement_priorities(&self, assessment: &QualityAssessment) -> Vec<String> {
        [
            ("CV", &assessment.cv_assessment),
            ("letter", &assessment.letter_assessment),
            ("ATS", &assessment.ats_assessment),
        ]
        .into_iter()
        .filter(|(_, domain)| !domain.meets_threshold)
        .filter_map(|(label, domain)| {
            domain
                .weakest_component()
                .map(|component| format!("Improve {label} {component}"))
        })
        .collect()
    }
}

fn check_range(name: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(AppError::Scoring(format!(
            "{name} must be between 0 and 100, got {value}"
        )))
    }
}

fn domain_score(
    domain: &str,
    metrics: &MetricMap,
    weights: &WeightTable<4>,
    components: [&'static str; 4],
) -> Result<DomainScore, AppError> {
    let mut raw = [0.0; 4];
    for (slot, (metric, _)) in raw.iter_mut().zip(weights.entries) {
        let value = metrics.get(metric).copied().unwrap_or(0.0);
        check_range(&format!("{domain}.{metric}"), value)?;
        *slot = value;
    }

    let weighted = weights.weighted(raw);
    let total: f64 = weighted.iter().map(|(_, v)| v).sum();
    debug!(domain, total, "Domain score computed");

    Ok(DomainScore {
        total_score: round2(total),
        component_scores: components
            .into_iter()
            .zip(weighted)
            .map(|(component, (_, weighted_score))| ComponentScore {
                component,
                weighted_score,
            })
            .collect(),
        meets_threshold: total >= QUALITY_THRESHOLD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pairs: &[(&str, f64)]) -> MetricMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn strong_cv() -> MetricMap {
        metrics(&[
            ("content_relevance", 90.0),
            ("skills_match", 80.0),
            ("experience_quality", 80.0),
            ("format_compliance", 90.0),
        ])
    }

    #[test]
    fn test_cv_score_weights_components() {
        let score = QualityMetrics::new().calculate_cv_score(&strong_cv()).unwrap();

        // 27 + 20 + 20 + 18
        assert_eq!(score.total_score, 85.0);
        assert!(score.meets_threshold);
        assert_eq!(score.component_scores[0].component, "content");
        assert!((score.component_scores[0].weighted_score - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_metrics_count_as_zero() {
        let score = QualityMetrics::new()
            .calculate_letter_score(&metrics(&[("customization", 100.0)]))
            .unwrap();

        assert_eq!(score.total_score, 30.0);
        assert!(!score.meets_threshold);
    }

    #[test]
    fn test_out_of_range_metric_is_rejected() {
        let qm = QualityMetrics::new();

        let err = qm
            .calculate_ats_score(&metrics(&[("keyword_optimization", 120.0)]))
            .unwrap_err();
        assert!(matches!(err, AppError::Scoring(_)));
        assert!(qm
            .calculate_ats_score(&metrics(&[("content_clarity", f64::NAN)]))
            .is_err());
    }

    #[test]
    fn test_overall_quality_uses_forty_thirty_thirty() {
        let overall = QualityMetrics::new()
            .calculate_overall_quality(80.0, 70.0, 90.0)
            .unwrap();

        // 32 + 21 + 27
        assert_eq!(overall.overall_score, 80.0);
        assert!(overall.meets_threshold);
        assert_eq!(overall.component_weights["letter"], 0.3);
    }

    #[test]
    fn test_assessment_requires_every_threshold() {
        let qm = QualityMetrics::new();
        let ats = metrics(&[
            ("keyword_optimization", 90.0),
            ("format_compliance", 90.0),
            ("section_structure", 90.0),
            ("content_clarity", 90.0),
        ]);
        let weak_letter = metrics(&[
            ("customization", 50.0),
            ("content_relevance", 80.0),
            ("professional_tone", 80.0),
            ("formatting", 80.0),
        ]);

        let assessment = qm.get_quality_assessment(&strong_cv(), &weak_letter, &ats).unwrap();

        // letter: 15 + 24 + 16 + 16 = 71
        assert_eq!(assessment.letter_assessment.total_score, 71.0);
        // overall: 0.4*85 + 0.3*71 + 0.3*90 = 82.3
        assert_eq!(assessment.overall_quality.overall_score, 82.3);
        assert!(assessment.overall_quality.meets_threshold);
        assert!(!assessment.meets_all_thresholds);
    }

    #[test]
    fn test_priorities_name_weakest_component_of_failing_domains() {
        let qm = QualityMetrics::new();
        let weak_letter = metrics(&[
            ("customization", 50.0),
            ("content_relevance", 80.0),
            ("professional_tone", 80.0),
            ("formatting", 80.0),
        ]);
        let weak_ats = metrics(&[
            ("keyword_optimization", 60.0),
            ("format_compliance", 60.0),
            ("section_structure", 60.0),
            ("content_clarity", 60.0),
        ]);

        let assessment = qm.get_quality_assessment(&strong_cv(), &weak_letter, &weak_ats).unwrap();
        let priorities = qm.get_improvement_priorities(&assessment);

        // letter weighted: 15, 24, 16, 16; ats weighted: 18, 18, 12, 12 (tie → structure)
        assert_eq!(priorities, vec!["Improve letter customization", "Improve ATS structure"]);
    }

    #[test]
    fn test_weakest_component_first_wins_ties() {
        let domain = DomainScore {
            total_score: 0.0,
            component_scores: vec![
                ComponentScore { component: "keyword", weighted_score: 0.0 },
                ComponentScore { component: "format", weighted_score: 0.0 },
            ],
            meets_threshold: false,
        };
        assert_eq!(domain.weakest_component(), Some("keyword"));
    }

    #[test]
    fn test_threshold_is_checked_before_rounding() {
        let metrics_engine = QualityMetrics::new();
        let near = metrics(&[
            ("content_relevance", 74.996),
            ("skills_match", 74.996),
            ("experience_quality", 74.996),
            ("format_compliance", 74.996),
        ]);

        let cv = metrics_engine.calculate_cv_score(&near).unwrap();
        assert_eq!(cv.total_score, 75.0);
        assert!(!cv.meets_threshold);

        let overall = metrics_engine
            .calculate_overall_quality(74.996, 74.996, 74.996)
            .unwrap();
        assert_eq!(overall.overall_score, 75.0);
        assert!(!overall.meets_threshold);
    }
}
