use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::prompts::{CV_ANALYSIS_PROMPT, CV_ANALYSIS_SYSTEM};
use crate::agents::{first_integer, require_text};
use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway, OutputSchema, TaskType};
use crate::quality::scoring::WeightTable;
use crate::rules::{AtsRules, DocumentFacts, OptimizationGuidelines};
use crate::signals;

/// Weights for the standalone CV score.
pub const CV_SCORE_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("skills", 0.3),
    ("experience", 0.3),
    ("ats", 0.2),
    ("content", 0.2),
]);

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillsProfile {
    /// Vocabulary hits from the CV text.
    pub technical_skills: Vec<String>,
    /// Skills reported by the model.
    pub soft_skills: Vec<String>,
    /// Important elements the model found missing. Reported only, not scored.
    pub missing_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExperienceProfile {
    pub years: u32,
    pub key_achievements: Vec<String>,
    pub highlighted_positions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AtsCompliance {
    pub is_compliant: bool,
    pub issues: Vec<String>,
    /// 100 when the file format is valid, otherwise 50.
    pub format_score: f64,
    pub guidelines: OptimizationGuidelines,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CvImprovements {
    pub suggestions: Vec<String>,
    pub content_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CvAnalysis {
    pub skills: SkillsProfile,
    pub experience: ExperienceProfile,
    pub education: String,
    pub ats_compliance: AtsCompliance,
    pub improvements: CvImprovements,
    pub data_quality: DataQuality,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct CvAnalyzer {
    gateway: Arc<ModelGateway>,
    rules: Arc<AtsRules>,
}

impl CvAnalyzer {
    pub fn new(gateway: Arc<ModelGateway>, rules: Arc<AtsRules>) -> Self {
        Self { gateway, rules }
    }

    pub fn rules(&self) -> &AtsRules {
        &self.rules
    }

    fn schema() -> OutputSchema {
        OutputSchema::new()
            .list("skills", "list of skills")
            .scalar("experience_years", "number")
            .scalar("education", "highest education, e.g. 'BSc Computer Science'")
            .list("key_achievements", "list of achievements")
            .list("missing_elements", "list of missing important elements")
            .list("improvement_suggestions", "list of suggestions")
    }

    /// One structured completion plus keyword extraction and ATS checks.
    /// `document` is the uploaded file; `None` when the CV arrived as text.
    pub async fn analyze_cv(
        &self,
        cv_text: &str,
        document: Option<&DocumentFacts>,
    ) -> Result<CvAnalysis, AppError> {
        require_text("CV text", cv_text)?;
        info!("Starting CV analysis");

        let prompt = CV_ANALYSIS_PROMPT.replace("{cv_text}", cv_text);
        let llm = self
            .gateway
            .get_structured_completion(
                &prompt,
                &Self::schema(),
                Some(TaskType::CvAnalysis),
                Some(CV_ANALYSIS_SYSTEM),
            )
            .await;
        if llm.is_degraded() {
            warn!("CV analysis completion degraded; model-derived fields are empty");
        }

        let keywords = signals::extract_keywords(cv_text);
        let ats_compliance = self.validate_ats_compliance(cv_text, document);

        let suggestions = llm.list("improvement_suggestions");
        let key_achievements = llm.list("key_achievements");
        let content_recommendations = content_recommendations(
            !keywords.technical_terms.is_empty(),
            key_achievements.is_empty(),
            ats_compliance.is_compliant,
        );

        let analysis = CvAnalysis {
            skills: SkillsProfile {
                technical_skills: keywords.technical_terms,
                soft_skills: llm.list("skills"),
                missing_elements: llm.list("missing_elements"),
            },
            experience: ExperienceProfile {
                years: first_integer(&llm.text("experience_years")),
                key_achievements,
                highlighted_positions: keywords.nouns,
            },
            education: llm.text("education"),
            ats_compliance,
            improvements: CvImprovements {
                suggestions,
                content_recommendations,
            },
            data_quality: llm.quality(),
        };

        info!(
            years = analysis.experience.years,
            compliant = analysis.ats_compliance.is_compliant,
            "CV analysis completed"
        );
        Ok(analysis)
    }

    /// Structure of the detected sections plus the file format, when known.
    pub fn validate_ats_compliance(
        &self,
        cv_text: &str,
        document: Option<&DocumentFacts>,
    ) -> AtsCompliance {
        let sections = signals::section_names(cv_text);
        let structure = self.rules.validate_structure(&sections);

        let (format_valid, format_issues) = match document {
            Some(facts) => {
                let outcome = self.rules.validate_document(facts);
                (outcome.valid, outcome.issues)
            }
            None => (true, Vec::new()),
        };

        let mut issues = structure.issues;
        issues.extend(format_issues);

        AtsCompliance {
            is_compliant: structure.valid && format_valid,
            issues,
            format_score: if format_valid { 100.0 } else { 50.0 },
            guidelines: self.rules.get_optimization_guidelines(),
        }
    }

    /// skills 0.3 + experience 0.3 + ats 0.2 + content 0.2, rounded to 2 dp.
    pub fn get_cv_score(&self, analysis: &CvAnalysis) -> f64 {
        CV_SCORE_WEIGHTS.combine([
            skills_score(&analysis.skills),
            experience_score(&analysis.experience),
            analysis.ats_compliance.format_score,
            content_score(&analysis.improvements),
        ])
    }
}

fn content_recommendations(has_terms: bool, no_achievements: bool, compliant: bool) -> Vec<String> {
    let mut out = Vec::new();
    if has_terms {
        out.push("Consider adding more industry-specific keywords throughout your CV".to_string());
    }
    if no_achievements {
        out.push("Add specific, quantifiable achievements for each role".to_string());
    }
    if !compliant {
        out.push("Update CV format to improve ATS compatibility".to_string());
    }
    out
}

/// Ten points per skill, capped at 100. Missing elements are advisory and
/// never lower the score.
fn skills_score(skills: &SkillsProfile) -> f64 {
    ((skills.technical_skills.len() + skills.soft_skills.len()) as f64 * 10.0).min(100.0)
}

fn experience_score(experience: &ExperienceProfile) -> f64 {
    let years = (experience.years as f64 * 10.0).min(50.0);
    let achievements = (experience.key_achievements.len() as f64 * 10.0).min(50.0);
    years + achievements
}

fn content_score(improvements: &CvImprovements) -> f64 {
    (100.0 - improvements.suggestions.len() as f64 * 10.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::{self, CV_TEXT};
    use crate::llm_client::testing::{failing_gateway, gateway_with};

    fn analyzer(gateway: Arc<ModelGateway>) -> CvAnalyzer {
        CvAnalyzer::new(gateway, Arc::new(AtsRules::new()))
    }

    #[test]
    fn test_cv_score_weights_sum_to_one() {
        assert!((CV_SCORE_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analyze_cv_combines_llm_and_lexical_signals() {
        let analyzer = analyzer(gateway_with(fixtures::canned_reply));
        let facts = DocumentFacts::new("cv.pdf", 200_000);

        let analysis = analyzer.analyze_cv(CV_TEXT, Some(&facts)).await.unwrap();

        assert_eq!(
            analysis.skills.technical_skills,
            vec!["docker", "kubernetes", "postgresql", "python", "sql"]
        );
        assert_eq!(analysis.experience.years, 5);
        assert!(analysis.education.contains("Bachelor"));
        assert!(analysis.ats_compliance.is_compliant, "{:?}", analysis.ats_compliance.issues);
        assert_eq!(analysis.ats_compliance.format_score, 100.0);
        assert_eq!(analysis.data_quality, DataQuality::Complete);
        assert_eq!(
            analysis.improvements.content_recommendations,
            vec!["Consider adding more industry-specific keywords throughout your CV"]
        );
    }

    #[tokio::test]
    async fn test_bad_format_halves_format_score() {
        let analyzer = analyzer(gateway_with(fixtures::canned_reply));
        let facts = DocumentFacts::new("cv.png", 200_000);

        let analysis = analyzer.analyze_cv(CV_TEXT, Some(&facts)).await.unwrap();

        assert!(!analysis.ats_compliance.is_compliant);
        assert_eq!(analysis.ats_compliance.format_score, 50.0);
        assert!(analysis
            .improvements
            .content_recommendations
            .contains(&"Update CV format to improve ATS compatibility".to_string()));
    }

    #[tokio::test]
    async fn test_degraded_completion_keeps_lexical_results() {
        let analyzer = analyzer(failing_gateway());

        let analysis = analyzer.analyze_cv(CV_TEXT, None).await.unwrap();

        assert_eq!(analysis.data_quality, DataQuality::Degraded);
        assert_eq!(analysis.experience.years, 0);
        assert!(analysis.skills.soft_skills.is_empty());
        assert!(!analysis.skills.technical_skills.is_empty());
    }

    #[tokio::test]
    async fn test_empty_cv_is_rejected() {
        let analyzer = analyzer(failing_gateway());
        assert!(matches!(
            analyzer.analyze_cv("   ", None).await,
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_cv_score_formula() {
        let analyzer = analyzer(failing_gateway());
        let analysis = CvAnalysis {
            skills: SkillsProfile {
                technical_skills: vec!["python".into(), "sql".into()],
                soft_skills: vec!["communication".into()],
                missing_elements: vec!["summary".into()],
            },
            experience: ExperienceProfile {
                years: 3,
                key_achievements: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into(), "f".into()],
                highlighted_positions: vec![],
            },
            ats_compliance: AtsCompliance {
                format_score: 100.0,
                ..Default::default()
            },
            improvements: CvImprovements {
                suggestions: vec!["x".into(), "y".into()],
                content_recommendations: vec![],
            },
            ..Default::default()
        };
        // skills 30, experience 30+50=80, ats 100, content 80
        // 0.3*30 + 0.3*80 + 0.2*100 + 0.2*80 = 9 + 24 + 20 + 16
        assert_eq!(analyzer.get_cv_score(&analysis), 69.0);
    }

    #[test]
    fn test_missing_elements_do_not_lower_skills_score() {
        let with_gaps = SkillsProfile {
            technical_skills: vec!["python".into()],
            soft_skills: vec!["communication".into()],
            missing_elements: vec!["summary".into(), "certifications".into(), "projects".into()],
        };
        let without_gaps = SkillsProfile {
            missing_elements: vec![],
            ..with_gaps.clone()
        };

        assert_eq!(skills_score(&with_gaps), 20.0);
        assert_eq!(skills_score(&with_gaps), skills_score(&without_gaps));
    }
}
