//! Axum route handlers for the application workflow, matching, ATS rules and
//! quality metrics.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agents::{LetterFormat, MatchResult};
use crate::errors::AppError;
use crate::quality::{MetricMap, QualityAssessment};
use crate::rules::{OptimizationGuidelines, ValidationOutcome};
use crate::state::AppState;
use crate::workflow::document::SUPPORTED_EXTENSIONS;
use crate::workflow::orchestrator::{
    ApplicationRequest, ApplicationResults, WorkflowError, WorkflowStatus,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub results: ApplicationResults,
    pub summary: String,
    pub quality_summary: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub cv_text: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct StructureRequest {
    pub sections: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetricsRequest {
    #[serde(default)]
    pub cv_metrics: MetricMap,
    #[serde(default)]
    pub letter_metrics: MetricMap,
    #[serde(default)]
    pub ats_metrics: MetricMap,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub assessment: QualityAssessment,
    pub priorities: Vec<String>,
}

/// Multipart form fields of an application upload.
#[derive(Debug, Default)]
struct ApplicationForm {
    cv_file_name: Option<String>,
    cv_bytes: Option<Bytes>,
    job_description: String,
    company_name: String,
    industry: Option<String>,
    generate_letter: bool,
    letter_format: LetterFormat,
}

impl ApplicationForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ApplicationForm {
            generate_letter: true,
            ..Default::default()
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "cv" {
                form.cv_file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read CV upload: {e}")))?;
                form.cv_bytes = Some(bytes);
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read field '{name}': {e}")))?;
            match name.as_str() {
                "job_description" => form.job_description = value,
                "company_name" => form.company_name = value,
                "industry" => {
                    form.industry = Some(value.trim().to_string()).filter(|v| !v.is_empty())
                }
                "generate_letter" => form.generate_letter = parse_flag(&value),
                "letter_style" => form.letter_format = LetterFormat::parse(&value),
                _ => {}
            }
        }
        Ok(form)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/applications
///
/// Multipart upload of a CV plus job details. Runs the full workflow and
/// returns the results with the text summaries.
pub async fn handle_process_application(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApplicationResponse>, WorkflowError> {
    let form = ApplicationForm::read(multipart)
        .await
        .map_err(WorkflowError::before_start)?;
    let (Some(file_name), Some(bytes)) = (form.cv_file_name, form.cv_bytes) else {
        return Err(WorkflowError::before_start(AppError::Validation(
            "cv file is required".to_string(),
        )));
    };

    let extension = std::path::Path::new(&file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| {
            WorkflowError::before_start(AppError::Validation(format!(
                "Unsupported CV format: {file_name}"
            )))
        })?;

    // The upload lives only as long as this handle.
    let upload = tempfile::Builder::new()
        .prefix("cv-")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .map_err(|e| WorkflowError::before_start(AppError::Internal(e.into())))?;
    tokio::fs::write(upload.path(), &bytes)
        .await
        .map_err(|e| WorkflowError::before_start(AppError::Internal(e.into())))?;

    let orchestrator = &state.orchestrator;
    orchestrator
        .validate_inputs(upload.path(), &form.job_description, &form.company_name)
        .map_err(WorkflowError::before_start)?;
    info!(file = %file_name, company = %form.company_name, "Processing application upload");

    let results = orchestrator
        .process_application(ApplicationRequest {
            cv_path: upload.path(),
            job_description: &form.job_description,
            company_name: &form.company_name,
            industry: form.industry.as_deref(),
            generate_letter: form.generate_letter,
            letter_format: form.letter_format,
        })
        .await?;

    Ok(Json(ApplicationResponse {
        summary: orchestrator.get_application_summary(&results),
        quality_summary: orchestrator
            .coordinator()
            .get_quality_summary(&results.quality_assessment),
        recommendations: orchestrator.get_improvement_recommendations(&results),
        results,
    }))
}

/// GET /api/v1/workflow/status
///
/// Stage flags of the most recent run.
pub async fn handle_workflow_status(State(state): State<AppState>) -> Json<WorkflowStatus> {
    Json(state.orchestrator.get_workflow_status())
}

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let result = state
        .orchestrator
        .matcher()
        .match_cv_to_job(&request.cv_text, &request.job_description, None)
        .await?;
    Ok(Json(result))
}

/// POST /api/v1/ats/structure
pub async fn handle_validate_structure(
    State(state): State<AppState>,
    Json(request): Json<StructureRequest>,
) -> Json<ValidationOutcome> {
    Json(state.rules.validate_structure(&request.sections))
}

/// GET /api/v1/ats/guidelines
pub async fn handle_guidelines(State(state): State<AppState>) -> Json<OptimizationGuidelines> {
    Json(state.rules.get_optimization_guidelines())
}

/// POST /api/v1/quality/metrics
///
/// Scores caller-supplied metrics; no model calls.
pub async fn handle_quality_metrics(
    State(state): State<AppState>,
    Json(request): Json<MetricsRequest>,
) -> Result<Json<MetricsResponse>, AppError> {
    let assessment = state.metrics.get_quality_assessment(
        &request.cv_metrics,
        &request.letter_metrics,
        &request.ats_metrics,
    )?;
    let priorities = state.metrics.get_improvement_priorities(&assessment);
    Ok(Json(MetricsResponse {
        assessment,
        priorities,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_defaults_to_true() {
        assert!(parse_flag("true"));
        assert!(parse_flag("yes"));
        assert!(parse_flag(""));
        assert!(!parse_flag("False"));
        assert!(!parse_flag(" 0 "));
    }
}
