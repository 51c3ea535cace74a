use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::require_text;
use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway, OutputSchema, StructuredResponse, TaskType};
use crate::quality::prompts::{
    CV_ACHIEVEMENTS_PROMPT, CV_CONTENT_PROMPT, CV_EXPERIENCE_PROMPT, CV_INDUSTRY_PROMPT,
    CV_SKILLS_PROMPT,
};
use crate::quality::scoring::{
    dedup_preserving_order, field_mean, round2, CV_EVALUATION_WEIGHTS, STRENGTH_CUTOFF,
};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentQuality {
    pub score: f64,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AchievementsImpact {
    pub score: f64,
    pub weak_points: Vec<String>,
    pub strong_points: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExperiencePresentation {
    pub score: f64,
    pub improvements: Vec<String>,
    pub effective_aspects: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillsRelevance {
    pub score: f64,
    pub missing_skills: Vec<String>,
    pub strong_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndustryAlignment {
    pub alignment_score: f64,
    pub industry_strengths: Vec<String>,
    pub industry_gaps: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CvEvaluationSummary {
    pub content_quality: ContentQuality,
    pub achievements_impact: AchievementsImpact,
    pub experience_presentation: ExperiencePresentation,
    pub skills_relevance: SkillsRelevance,
}

#[derive(Debug, Clone, Serialize)]
pub struct CvEvaluation {
    pub overall_score: f64,
    pub evaluation_summary: CvEvaluationSummary,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub industry_alignment: Option<IndustryAlignment>,
    pub data_quality: DataQuality,
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluator
// ────────────────────────────────────────────────────────────────────────────

pub struct CvEvaluator {
    gateway: Arc<ModelGateway>,
}

impl CvEvaluator {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }

    async fn complete(&self, prompt: &str, schema: &OutputSchema, task: TaskType) -> StructuredResponse {
        self.gateway
            .get_structured_completion(prompt, schema, Some(task), None)
            .await
    }

    /// Four dimension completions, plus a fifth for industry alignment when
    /// an industry is given.
    pub async fn evaluate_cv(
        &self,
        cv_text: &str,
        industry: Option<&str>,
    ) -> Result<CvEvaluation, AppError> {
        require_text("CV text", cv_text)?;
        let industry = industry.map(str::trim).filter(|i| !i.is_empty());
        info!(industry, "Starting CV evaluation");

        let mut quality = DataQuality::Complete;

        let llm = self
            .complete(
                &CV_CONTENT_PROMPT.replace("{cv_text}", cv_text),
                &OutputSchema::new()
                    .scalar("clarity_score", "number between 0 and 100")
                    .scalar("conciseness_score", "number between 0 and 100")
                    .scalar("professionalism_score", "number between 0 and 100")
                    .list("content_issues", "list of issues")
                    .list("strong_points", "list of strong points"),
                TaskType::CvEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let content_mean = field_mean(&llm, &["clarity_score", "conciseness_score", "professionalism_score"]);
        let content = ContentQuality {
            score: round2(content_mean),
            issues: llm.list("content_issues"),
            strengths: llm.list("strong_points"),
        };

        let llm = self
            .complete(
                &CV_ACHIEVEMENTS_PROMPT.replace("{cv_text}", cv_text),
                &OutputSchema::new()
                    .scalar("quantification_score", "number between 0 and 100")
                    .scalar("impact_score", "number between 0 and 100")
                    .scalar("relevance_score", "number between 0 and 100")
                    .list("weak_achievements", "list of weak achievements")
                    .list("strong_achievements", "list of strong achievements"),
                TaskType::AchievementsEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let achievements_mean = field_mean(&llm, &["quantification_score", "impact_score", "relevance_score"]);
        let achievements = AchievementsImpact {
            score: round2(achievements_mean),
            weak_points: llm.list("weak_achievements"),
            strong_points: llm.list("strong_achievements"),
        };

        let llm = self
            .complete(
                &CV_EXPERIENCE_PROMPT.replace("{cv_text}", cv_text),
                &OutputSchema::new()
                    .scalar("progression_clarity", "number between 0 and 100")
                    .scalar("role_description_quality", "number between 0 and 100")
                    .scalar("responsibility_clarity", "number between 0 and 100")
                    .list("improvement_areas", "list of areas to improve")
                    .list("effective_points", "list of effective points"),
                TaskType::ExperienceEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let experience_mean = field_mean(
            &llm,
            &["progression_clarity", "role_description_quality", "responsibility_clarity"],
        );
        let experience = ExperiencePresentation {
            score: round2(experience_mean),
            improvements: llm.list("improvement_areas"),
            effective_aspects: llm.list("effective_points"),
        };

        let llm = self
            .complete(
                &CV_SKILLS_PROMPT
                    .replace("{cv_text}", cv_text)
                    .replace("{industry}", industry.unwrap_or("Not specified")),
                &OutputSchema::new()
                    .scalar("organization_score", "number between 0 and 100")
                    .scalar("relevance_score", "number between 0 and 100")
                    .scalar("specificity_score", "number between 0 and 100")
                    .list("missing_key_skills", "list of missing skills")
                    .list("well_presented_skills", "list of well-presented skills"),
                TaskType::SkillsEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let skills_mean = field_mean(&llm, &["organization_score", "relevance_score", "specificity_score"]);
        let skills = SkillsRelevance {
            score: round2(skills_mean),
            missing_skills: llm.list("missing_key_skills"),
            strong_skills: llm.list("well_presented_skills"),
        };

        let industry_alignment = match industry {
            Some(industry) => {
                let (alignment, alignment_quality) = self.evaluate_industry_alignment(cv_text, industry).await;
                quality = quality.merge(alignment_quality);
                Some(alignment)
            }
            None => None,
        };

        let means = DimensionMeans {
            content: content_mean,
            achievements: achievements_mean,
            experience: experience_mean,
            skills: skills_mean,
        };
        let overall_score = CV_EVALUATION_WEIGHTS.combine([
            means.content,
            means.achievements,
            means.experience,
            means.skills,
        ]);
        if quality.is_degraded() {
            warn!(overall_score, "CV evaluation ran on degraded completions; score is skewed low");
        }

        let summary = CvEvaluationSummary {
            content_quality: content,
            achievements_impact: achievements,
            experience_presentation: experience,
            skills_relevance: skills,
        };
        let strengths = strengths(&summary, &means);
        let improvement_areas = improvements(&summary, &means);

        info!(overall_score, "CV evaluation completed");
        Ok(CvEvaluation {
            overall_score,
            evaluation_summary: summary,
            strengths,
            improvement_areas,
            industry_alignment,
            data_quality: quality,
        })
    }

    async fn evaluate_industry_alignment(
        &self,
        cv_text: &str,
        industry: &str,
    ) -> (IndustryAlignment, DataQuality) {
        let llm = self
            .complete(
                &CV_INDUSTRY_PROMPT
                    .replace("{industry}", industry)
                    .replace("{cv_text}", cv_text),
                &OutputSchema::new()
                    .scalar("alignment_score", "number between 0 and 100")
                    .list("industry_specific_strengths", "list of strengths")
                    .list("industry_gaps", "list of gaps")
                    .list("industry_recommendations", "list of recommendations"),
                TaskType::IndustryAlignment,
            )
            .await;

        let alignment = IndustryAlignment {
            alignment_score: llm.number("alignment_score").clamp(0.0, 100.0),
            industry_strengths: llm.list("industry_specific_strengths"),
            industry_gaps: llm.list("industry_gaps"),
            recommendations: llm.list("industry_recommendations"),
        };
        (alignment, llm.quality())
    }
}

/// Unrounded dimension means, in weight-table order.
struct DimensionMeans {
    content: f64,
    achievements: f64,
    experience: f64,
    skills: f64,
}

fn strengths(summary: &CvEvaluationSummary, means: &DimensionMeans) -> Vec<String> {
    let mut out = Vec::new();
    if means.content >= STRENGTH_CUTOFF {
        out.extend(summary.content_quality.strengths.iter().cloned());
    }
    if means.achievements >= STRENGTH_CUTOFF {
        out.extend(summary.achievements_impact.strong_points.iter().cloned());
    }
    if means.experience >= STRENGTH_CUTOFF {
        out.extend(summary.experience_presentation.effective_aspects.iter().cloned());
    }
    if means.skills >= STRENGTH_CUTOFF {
        out.extend(
            summary
                .skills_relevance
                .strong_skills
                .iter()
                .map(|skill| format!("Strong presentation of {skill}")),
        );
    }
    dedup_preserving_order(out)
}

fn improvements(summary: &CvEvaluationSummary, means: &DimensionMeans) -> Vec<String> {
    let mut out = Vec::new();
    if means.content < STRENGTH_CUTOFF {
        out.extend(summary.content_quality.issues.iter().cloned());
    }
    if means.achievements < STRENGTH_CUTOFF {
        out.extend(
            summary
                .achievements_impact
                .weak_points
                .iter()
                .map(|a| format!("Strengthen achievement: {a}")),
        );
    }
    if means.experience < STRENGTH_CUTOFF {
        out.extend(summary.experience_presentation.improvements.iter().cloned());
    }
    if means.skills < STRENGTH_CUTOFF {
        out.extend(
            summary
                .skills_relevance
                .missing_skills
                .iter()
                .map(|skill| format!("Add missing skill: {skill}")),
        );
    }
    dedup_preserving_order(out)
}
