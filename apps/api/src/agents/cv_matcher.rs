use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::cv_analyzer::{CvAnalysis, CvAnalyzer};
use crate::agents::first_integer;
use crate::agents::job_analyzer::{JobAnalysis, JobAnalyzer};
use crate::errors::AppError;
use crate::llm_client::DataQuality;
use crate::quality::scoring::{round2, WeightTable};
use crate::rules::DocumentFacts;

/// Declared matching weights. The `soft_skills` entry is intentionally unused:
/// only the first three are applied, so the overall score tops out at 90.
pub const MATCH_WEIGHTS: WeightTable<4> = WeightTable::new([
    ("required_skills", 0.4),
    ("experience", 0.3),
    ("education", 0.2),
    ("soft_skills", 0.1),
]);

const REQUIRED_SKILL_SHARE: f64 = 0.7;
const PREFERRED_SKILL_SHARE: f64 = 0.3;

/// Format score below which a layout recommendation is emitted.
const FORMAT_RECOMMENDATION_CUTOFF: f64 = 80.0;

/// Ordinal per education keyword; the highest keyword found wins.
const EDUCATION_LEVELS: &[(&str, u8)] = &[
    ("phd", 4),
    ("doctorate", 4),
    ("master", 3),
    ("bachelor", 2),
    ("associate", 1),
    ("high school", 0),
];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchLevel {
    #[serde(rename = "Excellent Match")]
    Excellent,
    #[serde(rename = "Strong Match")]
    Strong,
    #[serde(rename = "Good Match")]
    Good,
    #[serde(rename = "Partial Match")]
    Partial,
    #[serde(rename = "Low Match")]
    Low,
}

impl MatchLevel {
    /// Step function; each band includes its lower bound.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            MatchLevel::Excellent
        } else if score >= 75.0 {
            MatchLevel::Strong
        } else if score >= 60.0 {
            MatchLevel::Good
        } else if score >= 40.0 {
            MatchLevel::Partial
        } else {
            MatchLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchLevel::Excellent => "Excellent Match",
            MatchLevel::Strong => "Strong Match",
            MatchLevel::Good => "Good Match",
            MatchLevel::Partial => "Partial Match",
            MatchLevel::Low => "Low Match",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallMatch {
    pub score: f64,
    pub confidence: f64,
    pub match_level: MatchLevel,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillsMatch {
    pub score: f64,
    pub matched_required: Vec<String>,
    pub matched_preferred: Vec<String>,
    pub missing_required: Vec<String>,
    pub missing_preferred: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExperienceMatch {
    pub score: f64,
    pub cv_years: u32,
    pub required_years: u32,
    pub meets_requirement: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EducationMatch {
    pub score: f64,
    pub cv_level: u8,
    pub required_level: u8,
    pub meets_requirement: bool,
    pub cv_education: String,
    pub required_education: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub overall_match: OverallMatch,
    pub skills_match: SkillsMatch,
    pub experience_match: ExperienceMatch,
    pub education_match: EducationMatch,
    pub recommendations: Vec<String>,
    pub data_quality: DataQuality,
}

impl MatchResult {
    pub fn score(&self) -> f64 {
        self.overall_match.score
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Matcher
// ────────────────────────────────────────────────────────────────────────────

pub struct CvMatcher {
    cv_analyzer: Arc<CvAnalyzer>,
    job_analyzer: Arc<JobAnalyzer>,
}

impl CvMatcher {
    pub fn new(cv_analyzer: Arc<CvAnalyzer>, job_analyzer: Arc<JobAnalyzer>) -> Self {
        Self {
            cv_analyzer,
            job_analyzer,
        }
    }

    pub fn cv_analyzer(&self) -> &CvAnalyzer {
        &self.cv_analyzer
    }

    pub fn job_analyzer(&self) -> &JobAnalyzer {
        &self.job_analyzer
    }

    /// Runs both analyses, then matches them.
    pub async fn match_cv_to_job(
        &self,
        cv_text: &str,
        job_description: &str,
        document: Option<&DocumentFacts>,
    ) -> Result<MatchResult, AppError> {
        info!("Starting CV matching process");
        let cv_analysis = self.cv_analyzer.analyze_cv(cv_text, document).await?;
        let job_analysis = self.job_analyzer.analyze_job(job_description).await?;
        Ok(self.match_analyses(&cv_analysis, &job_analysis))
    }

    /// Pure scoring over two finished analyses.
    pub fn match_analyses(&self, cv: &CvAnalysis, job: &JobAnalysis) -> MatchResult {
        let skills_match = skills_match(cv, job);
        let experience_match = experience_match(cv, job);
        let education_match = education_match(cv, job);

        let score = round2(
            skills_match.score * MATCH_WEIGHTS.weight("required_skills")
                + experience_match.score * MATCH_WEIGHTS.weight("experience")
                + education_match.score * MATCH_WEIGHTS.weight("education"),
        );

        let data_quality = cv.data_quality.merge(job.data_quality);
        if data_quality.is_degraded() {
            warn!(score, "Match computed over degraded analyses; score is skewed low");
        }

        let recommendations = recommendations(cv, &skills_match, &experience_match);
        let result = MatchResult {
            overall_match: OverallMatch {
                score,
                confidence: confidence(cv, job),
                match_level: MatchLevel::from_score(score),
            },
            skills_match,
            experience_match,
            education_match,
            recommendations,
            data_quality,
        };

        info!(score, level = result.overall_match.match_level.label(), "Match analysis completed");
        result
    }
}

fn contains_ignore_case(set: &HashSet<String>, skill: &str) -> bool {
    set.contains(&skill.to_lowercase())
}

/// Job skills de-duplicated case-insensitively, job casing and order kept.
fn unique_skills(skills: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .filter(|s| seen.insert(s.to_lowercase()))
        .cloned()
        .collect()
}

/// Recall in percent; an empty requirement set is trivially satisfied.
fn recall(matched: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        matched as f64 / total as f64 * 100.0
    }
}

/// Requirements are checked against the CV's technical skills only.
fn skills_match(cv: &CvAnalysis, job: &JobAnalysis) -> SkillsMatch {
    let cv_skills: HashSet<String> = cv
        .skills
        .technical_skills
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    let required = unique_skills(&job.requirements.required_skills);
    let preferred = unique_skills(&job.requirements.preferred_skills);

    let (matched_required, missing_required): (Vec<String>, Vec<String>) = required
        .iter()
        .cloned()
        .partition(|s| contains_ignore_case(&cv_skills, s));
    let (matched_preferred, missing_preferred): (Vec<String>, Vec<String>) = preferred
        .iter()
        .cloned()
        .partition(|s| contains_ignore_case(&cv_skills, s));

    let required_score = recall(matched_required.len(), required.len());
    let preferred_score = recall(matched_preferred.len(), preferred.len());

    SkillsMatch {
        score: round2(required_score * REQUIRED_SKILL_SHARE + preferred_score * PREFERRED_SKILL_SHARE),
        matched_required,
        matched_preferred,
        missing_required,
        missing_preferred,
    }
}

fn experience_match(cv: &CvAnalysis, job: &JobAnalysis) -> ExperienceMatch {
    let cv_years = cv.experience.years;
    let required_years = first_integer(&job.requirements.experience);

    let score = if required_years == 0 || cv_years >= required_years {
        100.0
    } else {
        cv_years as f64 / required_years as f64 * 100.0
    };

    ExperienceMatch {
        score: round2(score),
        cv_years,
        required_years,
        meets_requirement: cv_years >= required_years,
    }
}

fn education_level(text: &str) -> u8 {
    EDUCATION_LEVELS
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, level)| *level)
        .max()
        .unwrap_or(0)
}

fn education_match(cv: &CvAnalysis, job: &JobAnalysis) -> EducationMatch {
    let required_education = job.requirements.education.to_lowercase();
    let cv_education = cv.education.to_lowercase();
    let required_level = education_level(&required_education);
    let cv_level = education_level(&cv_education);

    let score = if required_level == 0 || cv_level >= required_level {
        100.0
    } else {
        f64::from(cv_level) / f64::from(required_level) * 100.0
    };

    EducationMatch {
        score: round2(score),
        cv_level,
        required_level,
        meets_requirement: cv_level >= required_level,
        cv_education,
        required_education,
    }
}

/// Share of four truthy signals, in percent.
fn confidence(cv: &CvAnalysis, job: &JobAnalysis) -> f64 {
    let factors = [
        cv.ats_compliance.format_score > 0.0,
        !cv.skills.technical_skills.is_empty(),
        !job.requirements.required_skills.is_empty(),
        cv.experience.years > 0,
    ];
    let truthy = factors.iter().filter(|f| **f).count();
    round2(truthy as f64 / factors.len() as f64 * 100.0)
}

fn recommendations(
    cv: &CvAnalysis,
    skills: &SkillsMatch,
    experience: &ExperienceMatch,
) -> Vec<String> {
    let mut out = Vec::new();
    if !skills.missing_required.is_empty() {
        out.push(format!("Add experience with: {}", skills.missing_required.join(", ")));
    }
    if !skills.missing_preferred.is_empty() {
        out.push(format!(
            "Consider adding experience with: {}",
            skills.missing_preferred.join(", ")
        ));
    }
    if experience.cv_years < experience.required_years {
        out.push("Highlight more relevant work experience".to_string());
    }
    if cv.ats_compliance.format_score < FORMAT_RECOMMENDATION_CUTOFF {
        out.push("Improve CV format for better ATS compatibility".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::cv_analyzer::{AtsCompliance, ExperienceProfile, SkillsProfile};
    use crate::agents::fixtures::{self, CV_TEXT, JOB_TEXT};
    use crate::agents::job_analyzer::JobRequirements;
    use crate::llm_client::testing::{failing_gateway, gateway_with};
    use crate::llm_client::ModelGateway;
    use crate::rules::AtsRules;

    fn matcher(gateway: Arc<ModelGateway>) -> CvMatcher {
        CvMatcher::new(
            Arc::new(CvAnalyzer::new(gateway.clone(), Arc::new(AtsRules::new()))),
            Arc::new(JobAnalyzer::new(gateway)),
        )
    }

    fn cv(technical: &[&str], years: u32, education: &str) -> CvAnalysis {
        CvAnalysis {
            skills: SkillsProfile {
                technical_skills: technical.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            experience: ExperienceProfile {
                years,
                ..Default::default()
            },
            education: education.to_string(),
            ats_compliance: AtsCompliance {
                format_score: 100.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn job(required: &[&str], preferred: &[&str], experience: &str, education: &str) -> JobAnalysis {
        JobAnalysis {
            requirements: JobRequirements {
                required_skills: required.iter().map(|s| s.to_string()).collect(),
                preferred_skills: preferred.iter().map(|s| s.to_string()).collect(),
                experience: experience.to_string(),
                education: education.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_applied_weights_sum_to_point_nine() {
        let applied = MATCH_WEIGHTS.weight("required_skills")
            + MATCH_WEIGHTS.weight("experience")
            + MATCH_WEIGHTS.weight("education");
        assert!((applied - 0.9).abs() < 1e-9);
        assert!((MATCH_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_level_boundaries() {
        let cases = [
            (90.0, MatchLevel::Excellent),
            (89.999, MatchLevel::Strong),
            (75.0, MatchLevel::Strong),
            (74.999, MatchLevel::Good),
            (60.0, MatchLevel::Good),
            (40.0, MatchLevel::Partial),
            (39.999, MatchLevel::Low),
        ];
        for (score, level) in cases {
            assert_eq!(MatchLevel::from_score(score), level, "score {score}");
        }
        assert_eq!(MatchLevel::Excellent.label(), "Excellent Match");
    }

    #[test]
    fn test_perfect_input_scores_ninety() {
        let matcher = matcher(failing_gateway());
        let result = matcher.match_analyses(&cv(&["Python", "SQL"], 4, ""), &job(&["Python"], &[], "", ""));

        assert_eq!(result.skills_match.score, 100.0);
        assert_eq!(result.experience_match.score, 100.0);
        assert_eq!(result.education_match.score, 100.0);
        assert_eq!(result.score(), 90.0);
        assert_eq!(result.overall_match.match_level, MatchLevel::Excellent);
    }

    #[test]
    fn test_skills_compare_case_insensitively() {
        let matcher = matcher(failing_gateway());
        let result = matcher.match_analyses(
            &cv(&["python"], 2, ""),
            &job(&["Python", "Go"], &["Docker"], "", ""),
        );

        assert_eq!(result.skills_match.matched_required, vec!["Python"]);
        assert_eq!(result.skills_match.missing_required, vec!["Go"]);
        assert_eq!(result.skills_match.missing_preferred, vec!["Docker"]);
        // 50 * 0.7 + 0 * 0.3
        assert_eq!(result.skills_match.score, 35.0);
        assert_eq!(
            result.recommendations,
            vec![
                "Add experience with: Go".to_string(),
                "Consider adding experience with: Docker".to_string(),
            ]
        );
    }

    #[test]
    fn test_model_reported_skills_do_not_satisfy_requirements() {
        let matcher = matcher(failing_gateway());
        let mut candidate = cv(&[], 4, "");
        candidate.skills.soft_skills = vec!["Communication".to_string()];

        let result = matcher.match_analyses(&candidate, &job(&["Communication"], &[], "", ""));

        assert!(result.skills_match.matched_required.is_empty());
        assert_eq!(result.skills_match.missing_required, vec!["Communication"]);
        // 0 * 0.7 + 100 * 0.3
        assert_eq!(result.skills_match.score, 30.0);
    }

    #[test]
    fn test_experience_and_education_ratios() {
        let matcher = matcher(failing_gateway());
        let result = matcher.match_analyses(
            &cv(&[], 2, "Associate degree"),
            &job(&[], &[], "4-6 years", "Master's or PhD"),
        );

        assert_eq!(result.experience_match.required_years, 4);
        assert_eq!(result.experience_match.score, 50.0);
        assert!(!result.experience_match.meets_requirement);
        assert_eq!(result.education_match.required_level, 4);
        assert_eq!(result.education_match.cv_level, 1);
        assert_eq!(result.education_match.score, 25.0);
        assert!(result
            .recommendations
            .contains(&"Highlight more relevant work experience".to_string()));
    }

    #[test]
    fn test_confidence_counts_truthy_factors() {
        let matcher = matcher(failing_gateway());
        let mut analysis = cv(&[], 0, "");
        analysis.ats_compliance.format_score = 50.0;

        let result = matcher.match_analyses(&analysis, &job(&[], &[], "", ""));

        assert_eq!(result.overall_match.confidence, 25.0);
        assert!(result
            .recommendations
            .contains(&"Improve CV format for better ATS compatibility".to_string()));
    }

    #[tokio::test]
    async fn test_match_cv_to_job_end_to_end() {
        let matcher = matcher(gateway_with(fixtures::canned_reply));

        let result = matcher.match_cv_to_job(CV_TEXT, JOB_TEXT, None).await.unwrap();

        assert_eq!(result.score(), 90.0);
        assert_eq!(result.overall_match.match_level, MatchLevel::Excellent);
        assert_eq!(result.overall_match.confidence, 100.0);
        assert!(result.recommendations.is_empty());
        assert_eq!(result.data_quality, DataQuality::Complete);
    }

    #[tokio::test]
    async fn test_degraded_analyses_are_flagged() {
        let matcher = matcher(failing_gateway());

        let result = matcher.match_cv_to_job(CV_TEXT, JOB_TEXT, None).await.unwrap();

        assert_eq!(result.data_quality, DataQuality::Degraded);
    }
}
