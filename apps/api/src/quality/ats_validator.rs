use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::require_text;
use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway, OutputSchema, TaskType};
use crate::quality::prompts::{ATS_CONTENT_PROMPT, ATS_FORMAT_PROMPT, ATS_KEYWORD_PROMPT};
use crate::quality::scoring::{
    mean, round2, ScoreRecord, ATS_VALIDATION_WEIGHTS, QUALITY_THRESHOLD, SUBCHECK_PASS_SCORE,
};
use crate::rules::AtsRules;
use crate::signals;

/// Structure sub-score when every required section is present, and when not.
const STRUCTURE_VALID_SCORE: f64 = 100.0;
const STRUCTURE_INVALID_SCORE: f64 = 50.0;

/// Missing keywords quoted in the critical issue.
const CRITICAL_KEYWORD_COUNT: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct KeywordValidation {
    #[serde(flatten)]
    pub record: ScoreRecord,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtsValidationDetails {
    pub format_validation: ScoreRecord,
    pub keyword_validation: KeywordValidation,
    pub structure_validation: ScoreRecord,
    pub content_validation: ScoreRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtsValidation {
    pub overall_score: f64,
    pub is_ats_compliant: bool,
    pub validation_details: AtsValidationDetails,
    pub critical_issues: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub data_quality: DataQuality,
}

// ────────────────────────────────────────────────────────────────────────────
// Validator
// ────────────────────────────────────────────────────────────────────────────

/// Four sub-checks (format, keywords, structure, content), weighted
/// 0.3 / 0.3 / 0.2 / 0.2. Only the structure check is LLM-free.
pub struct AtsValidator {
    gateway: Arc<ModelGateway>,
    rules: Arc<AtsRules>,
}

impl AtsValidator {
    pub fn new(gateway: Arc<ModelGateway>, rules: Arc<AtsRules>) -> Self {
        Self { gateway, rules }
    }

    pub async fn validate_cv(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<AtsValidation, AppError> {
        require_text("CV text", cv_text)?;
        info!("Starting ATS validation");

        let (format, format_quality) = self.validate_format(cv_text).await;
        let (keywords, keyword_quality) = self.validate_keywords(cv_text, job_description).await;
        let structure = self.validate_structure(cv_text);
        let (content, content_quality) = self.validate_content(cv_text, job_description).await;

        let overall_score = ATS_VALIDATION_WEIGHTS.combine([
            format.score,
            keywords.record.score,
            structure.score,
            content.score,
        ]);
        let data_quality = format_quality.merge(keyword_quality).merge(content_quality);
        if data_quality.is_degraded() {
            warn!(overall_score, "ATS validation ran on degraded completions; score is skewed low");
        }

        let critical_issues = critical_issues(&format, &keywords, &structure, &content);
        let improvement_suggestions = suggestions(&format, &keywords, &structure, &content);

        info!(overall_score, "ATS validation completed");
        Ok(AtsValidation {
            overall_score,
            is_ats_compliant: overall_score >= QUALITY_THRESHOLD,
            validation_details: AtsValidationDetails {
                format_validation: format,
                keyword_validation: keywords,
                structure_validation: structure,
                content_validation: content,
            },
            critical_issues,
            improvement_suggestions,
            data_quality,
        })
    }

    async fn validate_format(&self, cv_text: &str) -> (ScoreRecord, DataQuality) {
        let schema = OutputSchema::new()
            .scalar("is_clean_format", "boolean")
            .scalar("has_proper_spacing", "boolean")
            .scalar("uses_standard_sections", "boolean")
            .list("formatting_issues", "list of issues")
            .scalar("format_score", "number between 0 and 100");
        let prompt = ATS_FORMAT_PROMPT.replace("{cv_text}", cv_text);

        let llm = self
            .gateway
            .get_structured_completion(&prompt, &schema, Some(TaskType::AtsValidation), None)
            .await;
        let record = ScoreRecord::new(
            llm.number("format_score"),
            llm.list("formatting_issues"),
            SUBCHECK_PASS_SCORE,
        );
        (record, llm.quality())
    }

    async fn validate_keywords(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> (KeywordValidation, DataQuality) {
        let schema = OutputSchema::new()
            .list("keyword_matches", "list of matched keywords")
            .list("missing_keywords", "list of missing important keywords")
            .scalar("keyword_placement_score", "number between 0 and 100")
            .scalar("optimization_level", "string");
        let prompt = ATS_KEYWORD_PROMPT
            .replace("{cv_text}", cv_text)
            .replace("{job_description}", job_description);

        let llm = self
            .gateway
            .get_structured_completion(&prompt, &schema, Some(TaskType::KeywordValidation), None)
            .await;
        let validation = KeywordValidation {
            record: ScoreRecord::new(
                llm.number("keyword_placement_score"),
                Vec::new(),
                SUBCHECK_PASS_SCORE,
            ),
            matched_keywords: llm.list("keyword_matches"),
            missing_keywords: llm.list("missing_keywords"),
        };
        (validation, llm.quality())
    }

    /// Rule-engine structure check over blank-line separated blocks.
    fn validate_structure(&self, cv_text: &str) -> ScoreRecord {
        let outcome = self.rules.validate_structure(&signals::blocks(cv_text));
        let score = if outcome.valid {
            STRUCTURE_VALID_SCORE
        } else {
            STRUCTURE_INVALID_SCORE
        };
        ScoreRecord::new(score, outcome.issues, SUBCHECK_PASS_SCORE)
    }

    async fn validate_content(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> (ScoreRecord, DataQuality) {
        let schema = OutputSchema::new()
            .scalar("content_clarity", "number between 0 and 100")
            .scalar("bullet_point_quality", "number between 0 and 100")
            .scalar("achievement_focus", "number between 0 and 100")
            .list("content_issues", "list of issues");
        let prompt = ATS_CONTENT_PROMPT
            .replace("{cv_text}", cv_text)
            .replace("{job_description}", job_description);

        let llm = self
            .gateway
            .get_structured_completion(&prompt, &schema, Some(TaskType::ContentValidation), None)
            .await;
        let score = mean(&[
            llm.number("content_clarity"),
            llm.number("bullet_point_quality"),
            llm.number("achievement_focus"),
        ]);
        let record = ScoreRecord::new(round2(score), llm.list("content_issues"), SUBCHECK_PASS_SCORE);
        (record, llm.quality())
    }
}

fn critical_issues(
    format: &ScoreRecord,
    keywords: &KeywordValidation,
    structure: &ScoreRecord,
    content: &ScoreRecord,
) -> Vec<String> {
    let mut issues = Vec::new();
    if !format.passes {
        issues.extend(format.issues.iter().cloned());
    }
    if !keywords.record.passes {
        let missing: Vec<&str> = keywords
            .missing_keywords
            .iter()
            .take(CRITICAL_KEYWORD_COUNT)
            .map(String::as_str)
            .collect();
        issues.push(format!("Missing critical keywords: {}", missing.join(", ")));
    }
    if !structure.passes {
        issues.extend(structure.issues.iter().cloned());
    }
    if !content.passes {
        issues.extend(content.issues.iter().cloned());
    }
    issues
}

fn suggestions(
    format: &ScoreRecord,
    keywords: &KeywordValidation,
    structure: &ScoreRecord,
    content: &ScoreRecord,
) -> Vec<String> {
    [
        (format.passes, "Improve CV formatting for better ATS readability"),
        (keywords.record.passes, "Add missing relevant keywords from job description"),
        (structure.passes, "Reorganize CV sections following standard ATS format"),
        (content.passes, "Enhance content clarity and achievement descriptions"),
    ]
    .into_iter()
    .filter(|(passes, _)| !passes)
    .map(|(_, text)| text.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::{self, CV_TEXT, JOB_TEXT};
    use crate::llm_client::testing::{failing_gateway, gateway_with};

    fn validator(gateway: Arc<ModelGateway>) -> AtsValidator {
        AtsValidator::new(gateway, Arc::new(AtsRules::new()))
    }

    #[tokio::test]
    async fn test_validate_cv_weights_sub_checks() {
        let validator = validator(gateway_with(fixtures::canned_reply));

        let result = validator.validate_cv(CV_TEXT, JOB_TEXT).await.unwrap();

        let details = &result.validation_details;
        assert_eq!(details.format_validation.score, 85.0);
        assert_eq!(details.keyword_validation.record.score, 80.0);
        assert_eq!(details.structure_validation.score, 100.0);
        assert_eq!(details.content_validation.score, 80.0);
        // 0.3*85 + 0.3*80 + 0.2*100 + 0.2*80
        assert_eq!(result.overall_score, 85.5);
        assert!(result.is_ats_compliant);
        assert!(result.critical_issues.is_empty());
        assert!(result.improvement_suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_failing_checks_raise_critical_issues() {
        let validator = validator(gateway_with(|request| {
            if request.prompt.contains("Analyze keyword optimization") {
                Ok(r#"{"keyword_placement_score": "40", "missing_keywords": ["aws", "spark", "kafka", "airflow"]}"#.into())
            } else {
                fixtures::canned_reply(request)
            }
        }));

        let result = validator
            .validate_cv("Skills\nPython\n\nEducation\nBSc", JOB_TEXT)
            .await
            .unwrap();

        assert_eq!(result.validation_details.structure_validation.score, 50.0);
        assert_eq!(
            result.critical_issues,
            vec![
                "Missing critical keywords: aws, spark, kafka".to_string(),
                "Missing required section: contact".to_string(),
                "Missing required section: experience".to_string(),
            ]
        );
        assert_eq!(
            result.improvement_suggestions,
            vec![
                "Add missing relevant keywords from job description".to_string(),
                "Reorganize CV sections following standard ATS format".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_degraded_validation_keeps_zero_scores() {
        let validator = validator(failing_gateway());

        let result = validator.validate_cv(CV_TEXT, JOB_TEXT).await.unwrap();

        assert_eq!(result.data_quality, DataQuality::Degraded);
        assert_eq!(result.validation_details.format_validation.score, 0.0);
        // only the rule-based structure check contributes
        assert_eq!(result.overall_score, 20.0);
        assert!(!result.is_ats_compliant);
    }
}
