use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::prompts::JOB_ANALYSIS_PROMPT;
use crate::agents::require_text;
use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway, OutputSchema, TaskType};
use crate::signals;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct JobRequirements {
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    /// Vocabulary hits from the description text.
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    /// Free-text experience requirement ("3+ years").
    pub experience: String,
    /// Free-text education requirement.
    pub education: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JobDetails {
    pub responsibilities: Vec<String>,
    pub seniority_level: String,
    pub key_terms: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompanyCulture {
    pub indicators: Vec<String>,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JobAnalysis {
    pub requirements: JobRequirements,
    pub job_details: JobDetails,
    pub company_culture: CompanyCulture,
    pub complexity_score: u32,
    pub data_quality: DataQuality,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct JobAnalyzer {
    gateway: Arc<ModelGateway>,
}

impl JobAnalyzer {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }

    fn schema() -> OutputSchema {
        OutputSchema::new()
            .list("required_skills", "list of required technical and professional skills")
            .list("preferred_skills", "list of preferred additional skills")
            .scalar("experience_level", "detailed experience requirements")
            .scalar("education_requirements", "education requirements")
            .list("key_responsibilities", "list of main job duties")
            .list("culture_indicators", "list of company culture aspects")
            .list("benefits_and_perks", "list of offered benefits")
            .scalar("seniority_level", "job level (e.g., Entry, Mid, Senior)")
            .list("soft_skills", "list of required soft skills")
    }

    pub async fn analyze_job(&self, job_description: &str) -> Result<JobAnalysis, AppError> {
        require_text("Job description", job_description)?;
        info!("Starting job description analysis");

        let keywords = signals::extract_keywords(job_description);
        let prompt = JOB_ANALYSIS_PROMPT.replace("{job_description}", job_description);
        let llm = self
            .gateway
            .get_structured_completion(&prompt, &Self::schema(), Some(TaskType::JobAnalysis), None)
            .await;
        if llm.is_degraded() {
            warn!("Job analysis completion degraded; requirements are empty");
        }

        let seniority = llm.text("seniority_level");
        let mut analysis = JobAnalysis {
            requirements: JobRequirements {
                required_skills: llm.list("required_skills"),
                preferred_skills: llm.list("preferred_skills"),
                technical_skills: keywords.technical_terms,
                soft_skills: llm.list("soft_skills"),
                experience: llm.text("experience_level"),
                education: llm.text("education_requirements"),
            },
            job_details: JobDetails {
                responsibilities: llm.list("key_responsibilities"),
                seniority_level: if seniority.is_empty() {
                    "Not specified".to_string()
                } else {
                    seniority
                },
                key_terms: keywords.action_verbs,
            },
            company_culture: CompanyCulture {
                indicators: llm.list("culture_indicators"),
                benefits: llm.list("benefits_and_perks"),
            },
            complexity_score: 0,
            data_quality: llm.quality(),
        };
        analysis.complexity_score = complexity_score(&analysis.requirements);

        info!(complexity = analysis.complexity_score, "Job analysis completed");
        Ok(analysis)
    }

    /// Analyzes the description and returns its essential keywords.
    pub async fn get_required_keywords(&self, job_description: &str) -> Result<Vec<String>, AppError> {
        let analysis = self.analyze_job(job_description).await?;
        Ok(required_keywords(&analysis))
    }
}

/// Technical terms (max 40) + experience band + education band, capped at 100.
pub fn complexity_score(requirements: &JobRequirements) -> u32 {
    let technical = (requirements.technical_skills.len() as u32 * 10).min(40);

    let experience = requirements.experience.to_lowercase();
    let experience_band = if experience.contains("senior") || experience.contains("lead") {
        30
    } else if experience.contains("mid") || experience.contains('3') {
        20
    } else {
        10
    };

    let education = requirements.education.to_lowercase();
    let education_band = if education.contains("phd") || education.contains("doctorate") {
        30
    } else if education.contains("master") || education.contains("msc") {
        20
    } else if education.contains("bachelor") || education.contains("bsc") {
        10
    } else {
        0
    };

    (technical + experience_band + education_band).min(100)
}

/// Required skills, technical terms and responsibility words longer than
/// three characters; sorted and de-duplicated.
pub fn required_keywords(analysis: &JobAnalysis) -> Vec<String> {
    let mut keywords: BTreeSet<String> = BTreeSet::new();
    keywords.extend(analysis.requirements.required_skills.iter().cloned());
    keywords.extend(analysis.requirements.technical_skills.iter().cloned());
    for responsibility in &analysis.job_details.responsibilities {
        keywords.extend(
            responsibility
                .split_whitespace()
                .filter(|w| w.chars().count() > 3)
                .map(str::to_lowercase),
        );
    }
    keywords.into_iter().collect()
}
