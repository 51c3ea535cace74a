use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway, OutputSchema, StructuredResponse, TaskType};
use crate::quality::prompts::{
    LETTER_CONTENT_PROMPT, LETTER_CUSTOMIZATION_PROMPT, LETTER_FORMAT_PROMPT, LETTER_TONE_PROMPT,
};
use crate::quality::scoring::{
    dedup_preserving_order, field_mean, round2, LETTER_EVALUATION_WEIGHTS, STRENGTH_CUTOFF,
};

/// Per-criterion minimums behind `meets_standards`.
const MIN_CONTENT_RELEVANCE: f64 = 70.0;
const MIN_PROFESSIONAL_TONE: f64 = 75.0;
const MIN_CUSTOMIZATION: f64 = 70.0;
const MIN_STRUCTURE_FORMAT: f64 = 75.0;

/// Addressed requirements and company-specific elements quoted as strengths.
const QUOTED_STRENGTHS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentRelevance {
    pub score: f64,
    pub addressed_requirements: Vec<String>,
    pub missing_requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToneQuality {
    pub score: f64,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomizationLevel {
    pub score: f64,
    pub company_specific: Vec<String>,
    pub generic_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureQuality {
    pub score: f64,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LetterEvaluationSummary {
    pub content_relevance: ContentRelevance,
    pub professional_tone: ToneQuality,
    pub customization_level: CustomizationLevel,
    pub structure_quality: StructureQuality,
}

/// Unrounded dimension means, in weight-table order.
struct DimensionMeans {
    content: f64,
    tone: f64,
    customization: f64,
    structure: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StandardsCheck {
    pub content_relevance: bool,
    pub professional_tone: bool,
    pub customization: bool,
    pub structure_format: bool,
    pub meets_all_standards: bool,
}

impl StandardsCheck {
    fn from_means(means: &DimensionMeans) -> Self {
        let content_relevance = means.content >= MIN_CONTENT_RELEVANCE;
        let professional_tone = means.tone >= MIN_PROFESSIONAL_TONE;
        let customization = means.customization >= MIN_CUSTOMIZATION;
        let structure_format = means.structure >= MIN_STRUCTURE_FORMAT;
        Self {
            content_relevance,
            professional_tone,
            customization,
            structure_format,
            meets_all_standards: content_relevance
                && professional_tone
                && customization
                && structure_format,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterEvaluation {
    pub overall_score: f64,
    pub evaluation_summary: LetterEvaluationSummary,
    pub meets_standards: StandardsCheck,
    pub strong_points: Vec<String>,
    pub improvement_needed: Vec<String>,
    pub data_quality: DataQuality,
}

impl LetterEvaluation {
    /// Zero score for a letter that was never written.
    fn missing() -> Self {
        Self {
            overall_score: 0.0,
            evaluation_summary: LetterEvaluationSummary::default(),
            meets_standards: StandardsCheck::default(),
            strong_points: Vec::new(),
            improvement_needed: vec!["No cover letter provided".to_string()],
            data_quality: DataQuality::Complete,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluator
// ────────────────────────────────────────────────────────────────────────────

pub struct LetterEvaluator {
    gateway: Arc<ModelGateway>,
}

impl LetterEvaluator {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }

    async fn complete(&self, prompt: &str, schema: &OutputSchema, task: TaskType) -> StructuredResponse {
        self.gateway
            .get_structured_completion(prompt, schema, Some(task), None)
            .await
    }

    pub async fn evaluate_letter(
        &self,
        letter_text: Option<&str>,
        job_description: &str,
        company_name: &str,
    ) -> Result<LetterEvaluation, AppError> {
        let Some(letter_text) = letter_text.filter(|l| !l.trim().is_empty()) else {
            info!("No cover letter to evaluate; scoring 0");
            return Ok(LetterEvaluation::missing());
        };
        info!("Starting cover letter evaluation");

        let mut quality = DataQuality::Complete;

        let llm = self
            .complete(
                &LETTER_CONTENT_PROMPT
                    .replace("{letter_text}", letter_text)
                    .replace("{job_description}", job_description),
                &OutputSchema::new()
                    .scalar("relevance_score", "number between 0 and 100")
                    .list("key_requirements_addressed", "list of addressed requirements")
                    .list("missing_requirements", "list of missing requirements")
                    .scalar("effectiveness", "number between 0 and 100"),
                TaskType::ContentEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let content_mean = field_mean(&llm, &["relevance_score", "effectiveness"]);
        let content = ContentRelevance {
            score: round2(content_mean),
            addressed_requirements: llm.list("key_requirements_addressed"),
            missing_requirements: llm.list("missing_requirements"),
        };

        let llm = self
            .complete(
                &LETTER_TONE_PROMPT.replace("{letter_text}", letter_text),
                &OutputSchema::new()
                    .scalar("tone_score", "number between 0 and 100")
                    .scalar("language_quality", "number between 0 and 100")
                    .list("professionalism_issues", "list of issues")
                    .list("strong_elements", "list of strong elements"),
                TaskType::ToneEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let tone_mean = field_mean(&llm, &["tone_score", "language_quality"]);
        let tone = ToneQuality {
            score: round2(tone_mean),
            issues: llm.list("professionalism_issues"),
            strengths: llm.list("strong_elements"),
        };

        let llm = self
            .complete(
                &LETTER_CUSTOMIZATION_PROMPT
                    .replace("{letter_text}", letter_text)
                    .replace("{job_description}", job_description)
                    .replace("{company_name}", company_name),
                &OutputSchema::new()
                    .scalar("customization_score", "number between 0 and 100")
                    .list("company_specific_content", "list of company-specific elements")
                    .list("generic_elements", "list of generic elements")
                    .scalar("personalization_level", "number between 0 and 100"),
                TaskType::CustomizationEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let customization_mean = field_mean(&llm, &["customization_score", "personalization_level"]);
        let customization = CustomizationLevel {
            score: round2(customization_mean),
            company_specific: llm.list("company_specific_content"),
            generic_elements: llm.list("generic_elements"),
        };

        let llm = self
            .complete(
                &LETTER_FORMAT_PROMPT.replace("{letter_text}", letter_text),
                &OutputSchema::new()
                    .scalar("structure_score", "number between 0 and 100")
                    .scalar("formatting_score", "number between 0 and 100")
                    .list("structure_issues", "list of structural issues")
                    .list("format_strengths", "list of format strengths"),
                TaskType::FormatEvaluation,
            )
            .await;
        quality = quality.merge(llm.quality());
        let structure_mean = field_mean(&llm, &["structure_score", "formatting_score"]);
        let structure = StructureQuality {
            score: round2(structure_mean),
            issues: llm.list("structure_issues"),
            strengths: llm.list("format_strengths"),
        };

        let means = DimensionMeans {
            content: content_mean,
            tone: tone_mean,
            customization: customization_mean,
            structure: structure_mean,
        };
        let overall_score = LETTER_EVALUATION_WEIGHTS.combine([
            means.content,
            means.tone,
            means.customization,
            means.structure,
        ]);
        if quality.is_degraded() {
            warn!(overall_score, "Letter evaluation ran on degraded completions; score is skewed low");
        }

        let summary = LetterEvaluationSummary {
            content_relevance: content,
            professional_tone: tone,
            customization_level: customization,
            structure_quality: structure,
        };

        info!(overall_score, "Cover letter evaluation completed");
        Ok(LetterEvaluation {
            overall_score,
            meets_standards: StandardsCheck::from_means(&means),
            strong_points: strengths(&summary, &means),
            improvement_needed: improvements(&summary, &means),
            evaluation_summary: summary,
            data_quality: quality,
        })
    }
}

fn strengths(summary: &LetterEvaluationSummary, means: &DimensionMeans) -> Vec<String> {
    let mut out = Vec::new();
    if means.content >= STRENGTH_CUTOFF {
        out.extend(
            summary
                .content_relevance
                .addressed_requirements
                .iter()
                .take(QUOTED_STRENGTHS)
                .map(|req| format!("Effectively addresses: {req}")),
        );
    }
    if means.tone >= STRENGTH_CUTOFF {
        out.extend(summary.professional_tone.strengths.iter().cloned());
    }
    if means.customization >= STRENGTH_CUTOFF {
        out.extend(
            summary
                .customization_level
                .company_specific
                .iter()
                .take(QUOTED_STRENGTHS)
                .map(|elem| format!("Company-specific content: {elem}")),
        );
    }
    if means.structure >= STRENGTH_CUTOFF {
        out.extend(summary.structure_quality.strengths.iter().cloned());
    }
    dedup_preserving_order(out)
}

fn improvements(summary: &LetterEvaluationSummary, means: &DimensionMeans) -> Vec<String> {
    let mut out = Vec::new();
    if means.content < STRENGTH_CUTOFF {
        out.extend(
            summary
                .content_relevance
                .missing_requirements
                .iter()
                .map(|req| format!("Address requirement: {req}")),
        );
    }
    if means.tone < STRENGTH_CUTOFF {
        out.extend(summary.professional_tone.issues.iter().cloned());
    }
    if means.customization < STRENGTH_CUTOFF {
        out.extend(
            summary
                .customization_level
                .generic_elements
                .iter()
                .map(|elem| format!("Replace generic content: {elem}")),
        );
    }
    if means.structure < STRENGTH_CUTOFF {
        out.extend(summary.structure_quality.issues.iter().cloned());
    }
    dedup_preserving_order(out)
}
