use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway};
use crate::quality::ats_validator::{AtsValidation, AtsValidator};
use crate::quality::cv_evaluator::{CvEvaluation, CvEvaluator};
use crate::quality::letter_evaluator::{LetterEvaluation, LetterEvaluator};
use crate::quality::scoring::{COORDINATOR_WEIGHTS, HIGH_PRIORITY_CUTOFF, QUALITY_THRESHOLD};
use crate::rules::AtsRules;

/// Items per section quoted in the text summary.
const SUMMARY_ITEMS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    pub ats_score: f64,
    pub cv_score: f64,
    pub letter_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandardsResults {
    pub ats_compliance: bool,
    pub cv_quality: bool,
    pub letter_quality: bool,
    pub overall_quality: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityStandards {
    pub meets_all_standards: bool,
    pub standards_results: StandardsResults,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedAssessment {
    pub ats_compliance: AtsValidation,
    pub cv_quality: CvEvaluation,
    pub letter_quality: LetterEvaluation,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CriticalIssues {
    pub ats_issues: Vec<String>,
    pub cv_issues: Vec<String>,
    pub letter_issues: Vec<String>,
}

impl CriticalIssues {
    pub fn is_empty(&self) -> bool {
        self.ats_issues.is_empty() && self.cv_issues.is_empty() && self.letter_issues.is_empty()
    }

    fn groups(&self) -> [&[String]; 3] {
        [&self.ats_issues, &self.cv_issues, &self.letter_issues]
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Recommendations {
    pub high_priority: Vec<String>,
    pub medium_priority: Vec<String>,
    pub low_priority: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub overall_quality_score: f64,
    pub meets_quality_standards: QualityStandards,
    pub detailed_assessment: DetailedAssessment,
    pub critical_issues: CriticalIssues,
    pub improvement_recommendations: Recommendations,
    pub component_scores: ComponentScores,
    pub data_quality: DataQuality,
}

// ────────────────────────────────────────────────────────────────────────────
// Coordinator
// ────────────────────────────────────────────────────────────────────────────

/// End-to-end quality gate. Weighs ATS 0.4, CV 0.4 and letter 0.2, which is
/// not the `QualityMetrics` overall weighting.
pub struct Coordinator {
    ats_validator: AtsValidator,
    cv_evaluator: CvEvaluator,
    letter_evaluator: LetterEvaluator,
}

impl Coordinator {
    pub fn new(gateway: Arc<ModelGateway>, rules: Arc<AtsRules>) -> Self {
        Self {
            ats_validator: AtsValidator::new(gateway.clone(), rules),
            cv_evaluator: CvEvaluator::new(gateway.clone()),
            letter_evaluator: LetterEvaluator::new(gateway),
        }
    }

    pub async fn assess_application_quality(
        &self,
        cv_text: &str,
        letter_text: Option<&str>,
        job_description: &str,
        company_name: &str,
        industry: Option<&str>,
    ) -> Result<QualityReport, AppError> {
        info!(company_name, "Starting application quality assessment");

        let ats = self.ats_validator.validate_cv(cv_text, job_description).await?;
        let cv = self.cv_evaluator.evaluate_cv(cv_text, industry).await?;
        let letter = self
            .letter_evaluator
            .evaluate_letter(letter_text, job_description, company_name)
            .await?;

        let component_scores = ComponentScores {
            ats_score: ats.overall_score,
            cv_score: cv.overall_score,
            letter_score: letter.overall_score,
        };
        let overall_quality_score = COORDINATOR_WEIGHTS.combine([
            component_scores.ats_score,
            component_scores.cv_score,
            component_scores.letter_score,
        ]);
        let data_quality = ats
            .data_quality
            .merge(cv.data_quality)
            .merge(letter.data_quality);
        if data_quality.is_degraded() {
            warn!(overall_quality_score, "Quality report built on degraded evaluations");
        }

        let report = QualityReport {
            overall_quality_score,
            meets_quality_standards: check_standards(&component_scores, overall_quality_score),
            critical_issues: CriticalIssues {
                ats_issues: ats.critical_issues.clone(),
                cv_issues: cv.improvement_areas.clone(),
                letter_issues: letter.improvement_needed.clone(),
            },
            improvement_recommendations: recommendations(&ats, &cv, &letter),
            component_scores,
            detailed_assessment: DetailedAssessment {
                ats_compliance: ats,
                cv_quality: cv,
                letter_quality: letter,
            },
            data_quality,
        };
        info!(overall_quality_score, "Quality assessment completed");
        Ok(report)
    }

    pub fn get_quality_summary(&self, report: &QualityReport) -> String {
        let scores = &report.component_scores;
        let mut lines = vec![
            "Application Quality Assessment Summary:".to_string(),
            format!("Overall Quality Score: {}/100", report.overall_quality_score),
            String::new(),
            "Component Scores:".to_string(),
            format!("- ATS Compliance: {}/100", scores.ats_score),
            format!("- CV Quality: {}/100", scores.cv_score),
            format!("- Cover Letter Quality: {}/100", scores.letter_score),
            String::new(),
            "Quality Standards:".to_string(),
            format!(
                "Meets All Standards: {}",
                yes_no(report.meets_quality_standards.meets_all_standards)
            ),
        ];

        if !report.critical_issues.is_empty() {
            lines.push(String::new());
            lines.push("Critical Issues to Address:".to_string());
            for group in report.critical_issues.groups() {
                lines.extend(group.iter().take(SUMMARY_ITEMS).map(|i| format!("- {i}")));
            }
        }

        let high = &report.improvement_recommendations.high_priority;
        if !high.is_empty() {
            lines.push(String::new());
            lines.push("Top Priority Improvements:".to_string());
            lines.extend(high.iter().take(SUMMARY_ITEMS).map(|r| format!("- {r}")));
        }

        lines.join("\n")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn check_standards(scores: &ComponentScores, overall: f64) -> QualityStandards {
    let results = StandardsResults {
        ats_compliance: scores.ats_score >= QUALITY_THRESHOLD,
        cv_quality: scores.cv_score >= QUALITY_THRESHOLD,
        letter_quality: scores.letter_score >= QUALITY_THRESHOLD,
        overall_quality: overall >= QUALITY_THRESHOLD,
    };
    QualityStandards {
        meets_all_standards: results.ats_compliance
            && results.cv_quality
            && results.letter_quality
            && results.overall_quality,
        standards_results: results,
    }
}

/// Failing ATS is always high priority. A failing CV or letter is high
/// below 60, otherwise medium.
fn recommendations(ats: &AtsValidation, cv: &CvEvaluation, letter: &LetterEvaluation) -> Recommendations {
    let mut out = Recommendations::default();

    if ats.overall_score < QUALITY_THRESHOLD {
        out.high_priority.extend(ats.improvement_suggestions.iter().cloned());
    }
    for (score, items) in [
        (cv.overall_score, &cv.improvement_areas),
        (letter.overall_score, &letter.improvement_needed),
    ] {
        if score >= QUALITY_THRESHOLD {
            continue;
        }
        let bucket = if score < HIGH_PRIORITY_CUTOFF {
            &mut out.high_priority
        } else {
            &mut out.medium_priority
        };
        bucket.extend(items.iter().cloned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::{self, CV_TEXT, JOB_TEXT, LETTER_TEXT};
    use crate::llm_client::testing::{failing_gateway, gateway_with};

    fn coordinator(gateway: Arc<ModelGateway>) -> Coordinator {
        Coordinator::new(gateway, Arc::new(AtsRules::new()))
    }

    #[tokio::test]
    async fn test_assess_application_quality_weighting() {
        let coordinator = coordinator(gateway_with(fixtures::canned_reply));

        let report = coordinator
            .assess_application_quality(CV_TEXT, Some(LETTER_TEXT), JOB_TEXT, "Globex", None)
            .await
            .unwrap();

        assert_eq!(
            report.component_scores,
            ComponentScores { ats_score: 85.5, cv_score: 80.0, letter_score: 77.5 }
        );
        // 0.4*85.5 + 0.4*80 + 0.2*77.5
        assert_eq!(report.overall_quality_score, 81.7);
        assert!(report.meets_quality_standards.meets_all_standards);
        assert_eq!(report.data_quality, DataQuality::Complete);
    }

    #[tokio::test]
    async fn test_critical_issues_grouped_by_domain() {
        let coordinator = coordinator(gateway_with(fixtures::canned_reply));

        let report = coordinator
            .assess_application_quality(CV_TEXT, Some(LETTER_TEXT), JOB_TEXT, "Globex", None)
            .await
            .unwrap();

        assert!(report.critical_issues.ats_issues.is_empty());
        assert_eq!(report.critical_issues.cv_issues, vec!["Strengthen achievement: Led migration"]);
        assert_eq!(report.critical_issues.letter_issues.len(), 2);
        // every domain passes, so nothing is escalated
        assert!(report.improvement_recommendations.high_priority.is_empty());
        assert!(report.improvement_recommendations.medium_priority.is_empty());
    }

    #[tokio::test]
    async fn test_missing_letter_escalates_to_high_priority() {
        let coordinator = coordinator(gateway_with(fixtures::canned_reply));

        let report = coordinator
            .assess_application_quality(CV_TEXT, None, JOB_TEXT, "Globex", None)
            .await
            .unwrap();

        assert_eq!(report.component_scores.letter_score, 0.0);
        assert!(!report.meets_quality_standards.standards_results.letter_quality);
        assert_eq!(
            report.improvement_recommendations.high_priority,
            vec!["No cover letter provided"]
        );
        // 0.4*85.5 + 0.4*80
        assert_eq!(report.overall_quality_score, 66.2);
    }

    #[tokio::test]
    async fn test_degraded_report_uses_ats_suggestions() {
        let coordinator = coordinator(failing_gateway());

        let report = coordinator
            .assess_application_quality(CV_TEXT, Some(LETTER_TEXT), JOB_TEXT, "Globex", None)
            .await
            .unwrap();

        assert_eq!(report.data_quality, DataQuality::Degraded);
        let high = &report.improvement_recommendations.high_priority;
        assert!(high.contains(&"Improve CV formatting for better ATS readability".to_string()));
        assert!(!report.meets_quality_standards.meets_all_standards);
    }

    #[tokio::test]
    async fn test_quality_summary_lists_top_items() {
        let coordinator = coordinator(gateway_with(fixtures::canned_reply));
        let report = coordinator
            .assess_application_quality(CV_TEXT, None, JOB_TEXT, "Globex", None)
            .await
            .unwrap();

        let summary = coordinator.get_quality_summary(&report);

        assert!(summary.starts_with("Application Quality Assessment Summary:"));
        assert!(summary.contains("- ATS Compliance: 85.5/100"));
        assert!(summary.contains("Meets All Standards: No"));
        assert!(summary.contains("Critical Issues to Address:\n- Strengthen achievement: Led migration"));
        assert!(summary.ends_with("Top Priority Improvements:\n- No cover letter provided"));
    }
}
