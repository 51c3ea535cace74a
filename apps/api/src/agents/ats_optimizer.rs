use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::cv_analyzer::CvAnalysis;
use crate::agents::cv_matcher::{CvMatcher, MatchResult};
use crate::agents::job_analyzer::JobAnalysis;
use crate::agents::prompts::{CV_OPTIMIZATION_PROMPT, CV_OPTIMIZATION_SYSTEM};
use crate::agents::require_text;
use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway, OutputSchema, TaskType};
use crate::quality::scoring::{round2, QUALITY_THRESHOLD};
use crate::rules::AtsRules;
use crate::signals;

/// Score gain above which an optimization counts as significant.
const SIGNIFICANT_IMPROVEMENT: f64 = 10.0;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Improvements {
    pub score_improvement: f64,
    pub changes_made: usize,
    pub format_improvements: usize,
    pub has_significant_improvement: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationDetails {
    pub initial_score: f64,
    pub final_score: f64,
    pub changes_made: Vec<String>,
    pub format_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub optimized_cv: String,
    pub improvements: Improvements,
    pub optimization_details: OptimizationDetails,
    pub recommendations: Vec<String>,
    pub final_match: MatchResult,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationValidation {
    pub is_ats_compliant: bool,
    pub match_score: f64,
    pub compliance_issues: Vec<String>,
    pub successful_optimization: bool,
    pub data_quality: DataQuality,
}

struct Rewrite {
    text: String,
    changes: Vec<String>,
    format_suggestions: Vec<String>,
    recommendations: Vec<String>,
    data_quality: DataQuality,
}

// ────────────────────────────────────────────────────────────────────────────
// Optimizer
// ────────────────────────────────────────────────────────────────────────────

pub struct AtsOptimizer {
    gateway: Arc<ModelGateway>,
    rules: Arc<AtsRules>,
    matcher: Arc<CvMatcher>,
}

impl AtsOptimizer {
    pub fn new(gateway: Arc<ModelGateway>, rules: Arc<AtsRules>, matcher: Arc<CvMatcher>) -> Self {
        Self {
            gateway,
            rules,
            matcher,
        }
    }

    pub async fn optimize_cv(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<OptimizationResult, AppError> {
        let cv_analysis = self.matcher.cv_analyzer().analyze_cv(cv_text, None).await?;
        let job_analysis = self.matcher.job_analyzer().analyze_job(job_description).await?;
        self.optimize(cv_text, job_description, &cv_analysis, &job_analysis)
            .await
    }

    /// Rewrites the CV against the job and rescores the rewrite. Only the
    /// rewritten CV is reanalyzed; the job analysis is reused.
    pub async fn optimize(
        &self,
        cv_text: &str,
        job_description: &str,
        cv_analysis: &CvAnalysis,
        job_analysis: &JobAnalysis,
    ) -> Result<OptimizationResult, AppError> {
        info!("Starting CV optimization");
        let initial_match = self.matcher.match_analyses(cv_analysis, job_analysis);
        let initial_score = initial_match.score();

        let rewrite = self.rewrite(cv_text, job_description, initial_score).await;

        let (optimized_cv, final_match, data_quality) = if rewrite.text.is_empty() {
            warn!("Optimization returned no text; keeping the original CV");
            (cv_text.to_string(), initial_match, DataQuality::Degraded)
        } else {
            let final_analysis = self
                .matcher
                .cv_analyzer()
                .analyze_cv(&rewrite.text, None)
                .await?;
            let final_match = self.matcher.match_analyses(&final_analysis, job_analysis);
            let quality = rewrite.data_quality.merge(final_match.data_quality);
            (rewrite.text, final_match, quality)
        };
        let final_score = final_match.score();

        let delta = final_score - initial_score;
        let improvements = Improvements {
            score_improvement: round2(delta),
            changes_made: rewrite.changes.len(),
            format_improvements: rewrite.format_suggestions.len(),
            has_significant_improvement: delta > SIGNIFICANT_IMPROVEMENT,
        };
        info!(initial_score, final_score, "CV optimization completed");

        Ok(OptimizationResult {
            optimized_cv,
            improvements,
            optimization_details: OptimizationDetails {
                initial_score,
                final_score,
                changes_made: rewrite.changes,
                format_suggestions: rewrite.format_suggestions,
            },
            recommendations: rewrite.recommendations,
            final_match,
            data_quality,
        })
    }

    async fn rewrite(&self, cv_text: &str, job_description: &str, initial_score: f64) -> Rewrite {
        let guidelines = self.rules.get_optimization_guidelines().to_prompt_text();
        let prompt = CV_OPTIMIZATION_PROMPT
            .replace("{initial_score}", &initial_score.to_string())
            .replace("{job_description}", job_description)
            .replace("{guidelines}", &guidelines)
            .replace("{cv_text}", cv_text);
        let schema = OutputSchema::new()
            .scalar("optimized_text", "string")
            .list("changes", "list of changes made")
            .list("format_suggestions", "list of format improvements")
            .list("recommendations", "list of additional recommendations");

        let llm = self
            .gateway
            .get_structured_completion(
                &prompt,
                &schema,
                Some(TaskType::CvOptimization),
                Some(CV_OPTIMIZATION_SYSTEM),
            )
            .await;

        Rewrite {
            text: llm.text("optimized_text"),
            changes: llm.list("changes"),
            format_suggestions: llm.list("format_suggestions"),
            recommendations: llm.list("recommendations"),
            data_quality: llm.quality(),
        }
    }

    /// Structure check over blank-line blocks plus a fresh match.
    pub async fn validate_optimization(
        &self,
        optimized_cv: &str,
        job_description: &str,
    ) -> Result<OptimizationValidation, AppError> {
        require_text("Optimized CV", optimized_cv)?;

        let blocks = signals::blocks(optimized_cv);
        let structure = self.rules.validate_structure(&blocks);
        let final_match = self
            .matcher
            .match_cv_to_job(optimized_cv, job_description, None)
            .await?;
        let match_score = final_match.score();

        Ok(OptimizationValidation {
            is_ats_compliant: structure.valid,
            match_score,
            compliance_issues: structure.issues,
            successful_optimization: match_score >= QUALITY_THRESHOLD,
            data_quality: final_match.data_quality,
        })
    }
}
