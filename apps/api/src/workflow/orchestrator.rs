//! End-to-end application pipeline.
//!
//! Stages run strictly in order and each flag in `WorkflowProgress` is set
//! only after its stage succeeds. A failure aborts the run and the flags
//! reached so far travel with the `WorkflowError`; they are also kept as the
//! orchestrator's last known progress until the next run resets them.

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agents::{
    AtsOptimizer, CoverLetter, CvAnalysis, CvAnalyzer, CvMatcher, JobAnalysis, JobAnalyzer,
    LetterFormat, LetterWriter, MatchResult, OptimizationResult,
};
use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway};
use crate::quality::{Coordinator, QualityReport};
use crate::rules::{AtsRules, DocumentFacts};
use crate::workflow::document::{extension_of, DocumentIngestor, SUPPORTED_EXTENSIONS};

const MIN_JOB_DESCRIPTION_CHARS: usize = 50;
const MIN_COMPANY_NAME_CHARS: usize = 2;
/// Critical issues quoted per domain in the application summary.
const SUMMARY_ISSUES: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Progress
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    DocumentProcessing,
    InitialAnalysis,
    Optimization,
    LetterGeneration,
    QualityCheck,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 5] = [
        WorkflowStage::DocumentProcessing,
        WorkflowStage::InitialAnalysis,
        WorkflowStage::Optimization,
        WorkflowStage::LetterGeneration,
        WorkflowStage::QualityCheck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::DocumentProcessing => "document_processing",
            WorkflowStage::InitialAnalysis => "initial_analysis",
            WorkflowStage::Optimization => "optimization",
            WorkflowStage::LetterGeneration => "letter_generation",
            WorkflowStage::QualityCheck => "quality_check",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowProgress {
    completed: [bool; 5],
}

impl WorkflowProgress {
    pub fn mark(&mut self, stage: WorkflowStage) {
        self.completed[stage.index()] = true;
    }

    pub fn is_complete(&self, stage: WorkflowStage) -> bool {
        self.completed[stage.index()]
    }

    pub fn completed_steps(&self) -> usize {
        self.completed.iter().filter(|done| **done).count()
    }

    pub fn status(&self) -> WorkflowStatus {
        let completed_steps = self.completed_steps();
        let total_steps = WorkflowStage::ALL.len();
        let pct = completed_steps as f64 / total_steps as f64 * 100.0;
        WorkflowStatus {
            completed_steps,
            total_steps,
            completion_percentage: (pct * 100.0).round() / 100.0,
            step_status: WorkflowStage::ALL
                .into_iter()
                .enumerate()
                .map(|(i, stage)| StepStatus {
                    step: stage,
                    completed: self.is_complete(stage),
                    order: i + 1,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepStatus {
    pub step: WorkflowStage,
    pub completed: bool,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStatus {
    pub completed_steps: usize,
    pub total_steps: usize,
    pub completion_percentage: f64,
    pub step_status: Vec<StepStatus>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("workflow failed during {stage_name}: {source}", stage_name = .stage.as_str())]
pub struct WorkflowError {
    pub stage: WorkflowStage,
    pub progress: WorkflowProgress,
    #[source]
    pub source: AppError,
}

impl WorkflowError {
    /// Failure before any stage has run, such as a rejected upload.
    pub fn before_start(source: AppError) -> Self {
        Self {
            stage: WorkflowStage::DocumentProcessing,
            progress: WorkflowProgress::default(),
            source,
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.source.parts();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "stage": self.stage,
                "workflow_status": self.progress.status(),
            }
        }));
        (status, body).into_response()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OriginalCv {
    pub content: String,
    pub analysis: CvAnalysis,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizedApplication {
    pub cv: String,
    pub optimization_details: OptimizationResult,
    pub cover_letter: Option<String>,
    pub letter_details: Option<CoverLetter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationResults {
    pub run_id: Uuid,
    pub original_cv: OriginalCv,
    pub job_analysis: JobAnalysis,
    pub initial_match: MatchResult,
    pub optimized_application: OptimizedApplication,
    pub quality_assessment: QualityReport,
    pub workflow_status: WorkflowStatus,
    pub data_quality: DataQuality,
}

/// Caller inputs for one run.
#[derive(Debug, Clone)]
pub struct ApplicationRequest<'a> {
    pub cv_path: &'a Path,
    pub job_description: &'a str,
    pub company_name: &'a str,
    pub industry: Option<&'a str>,
    pub generate_letter: bool,
    pub letter_format: LetterFormat,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct WorkflowOrchestrator {
    ingestor: Arc<dyn DocumentIngestor>,
    matcher: Arc<CvMatcher>,
    optimizer: AtsOptimizer,
    letter_writer: LetterWriter,
    coordinator: Coordinator,
    last_progress: Mutex<WorkflowProgress>,
}

impl WorkflowOrchestrator {
    /// Wires every agent onto the one shared gateway and rule engine.
    pub fn new(
        gateway: Arc<ModelGateway>,
        rules: Arc<AtsRules>,
        ingestor: Arc<dyn DocumentIngestor>,
    ) -> Self {
        let matcher = Arc::new(CvMatcher::new(
            Arc::new(CvAnalyzer::new(gateway.clone(), rules.clone())),
            Arc::new(JobAnalyzer::new(gateway.clone())),
        ));
        Self {
            ingestor,
            optimizer: AtsOptimizer::new(gateway.clone(), rules.clone(), matcher.clone()),
            letter_writer: LetterWriter::new(gateway.clone(), matcher.clone()),
            coordinator: Coordinator::new(gateway, rules),
            matcher,
            last_progress: Mutex::new(WorkflowProgress::default()),
        }
    }

    pub fn matcher(&self) -> &CvMatcher {
        &self.matcher
    }

    pub async fn process_application(
        &self,
        request: ApplicationRequest<'_>,
    ) -> Result<ApplicationResults, WorkflowError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("application", %run_id, company = request.company_name);

        async {
            self.store_progress(WorkflowProgress::default());
            let mut progress = WorkflowProgress::default();

            let outcome = self.run_stages(run_id, &request, &mut progress).await;
            self.store_progress(progress);

            match &outcome {
                Ok(_) => info!("Application workflow completed"),
                Err(e) => error!(stage = e.stage.as_str(), "Application workflow failed: {}", e.source),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        request: &ApplicationRequest<'_>,
        progress: &mut WorkflowProgress,
    ) -> Result<ApplicationResults, WorkflowError> {
        let fail = |stage: WorkflowStage, progress: WorkflowProgress| {
            move |source: AppError| WorkflowError {
                stage,
                progress,
                source,
            }
        };

        // Document processing
        let stage = WorkflowStage::DocumentProcessing;
        info!(path = %request.cv_path.display(), "Processing CV document");
        let document = self.ingestor.process_document(request.cv_path).await;
        let cv_text = match (document.success, document.content) {
            (true, Some(content)) => content,
            _ => {
                let reason = document.error.unwrap_or_else(|| "no content extracted".to_string());
                return Err(fail(stage, *progress)(AppError::Document(format!(
                    "Failed to process CV: {reason}"
                ))));
            }
        };
        let facts = document.metadata.map(|m| {
            let name = request
                .cv_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            DocumentFacts::new(&name, m.file_size)
        });
        progress.mark(stage);

        // Initial analysis
        let stage = WorkflowStage::InitialAnalysis;
        let cv_analysis = self
            .matcher
            .cv_analyzer()
            .analyze_cv(&cv_text, facts.as_ref())
            .await
            .map_err(fail(stage, *progress))?;
        let job_analysis = self
            .matcher
            .job_analyzer()
            .analyze_job(request.job_description)
            .await
            .map_err(fail(stage, *progress))?;
        let initial_match = self.matcher.match_analyses(&cv_analysis, &job_analysis);
        progress.mark(stage);

        // Optimization
        let stage = WorkflowStage::Optimization;
        let optimization = self
            .optimizer
            .optimize(&cv_text, request.job_description, &cv_analysis, &job_analysis)
            .await
            .map_err(fail(stage, *progress))?;
        let optimized_cv = optimization.optimized_cv.clone();
        progress.mark(stage);

        // Letter generation
        let letter = if request.generate_letter {
            let stage = WorkflowStage::LetterGeneration;
            let letter = self
                .letter_writer
                .draft_letter(
                    &optimized_cv,
                    &job_analysis,
                    &optimization.final_match,
                    request.company_name,
                    request.letter_format,
                )
                .await
                .map_err(fail(stage, *progress))?;
            progress.mark(stage);
            Some(letter)
        } else {
            info!("Cover letter not requested; skipping generation");
            None
        };
        let letter_text = letter.as_ref().map(|l| l.letter.clone());

        // Quality check
        let stage = WorkflowStage::QualityCheck;
        let quality = self
            .coordinator
            .assess_application_quality(
                &optimized_cv,
                letter_text.as_deref(),
                request.job_description,
                request.company_name,
                request.industry,
            )
            .await
            .map_err(fail(stage, *progress))?;
        progress.mark(stage);

        let data_quality = [
            cv_analysis.data_quality,
            job_analysis.data_quality,
            initial_match.data_quality,
            optimization.data_quality,
            letter.as_ref().map_or(DataQuality::Complete, |l| l.data_quality),
            quality.data_quality,
        ]
        .into_iter()
        .fold(DataQuality::Complete, DataQuality::merge);
        if data_quality.is_degraded() {
            warn!("Application results include degraded model output");
        }

        Ok(ApplicationResults {
            run_id,
            original_cv: OriginalCv {
                content: cv_text,
                analysis: cv_analysis,
            },
            job_analysis,
            initial_match,
            optimized_application: OptimizedApplication {
                cv: optimized_cv,
                optimization_details: optimization,
                cover_letter: letter_text,
                letter_details: letter,
            },
            quality_assessment: quality,
            workflow_status: progress.status(),
            data_quality,
        })
    }

    fn store_progress(&self, progress: WorkflowProgress) {
        match self.last_progress.lock() {
            Ok(mut guard) => *guard = progress,
            Err(poisoned) => *poisoned.into_inner() = progress,
        }
    }

    /// Progress of the most recent run (all false before the first one).
    pub fn last_progress(&self) -> WorkflowProgress {
        match self.last_progress.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn get_workflow_status(&self) -> WorkflowStatus {
        self.last_progress().status()
    }

    /// Pre-flight checks on the caller's inputs. Returns the first problem.
    pub fn validate_inputs(
        &self,
        cv_path: &Path,
        job_description: &str,
        company_name: &str,
    ) -> Result<(), AppError> {
        if !cv_path.exists() {
            return Err(AppError::Validation("CV file does not exist".to_string()));
        }
        let extension = extension_of(cv_path);
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported CV format: .{extension}"
            )));
        }
        if job_description.trim().chars().count() < MIN_JOB_DESCRIPTION_CHARS {
            return Err(AppError::Validation(
                "Job description is too short or empty".to_string(),
            ));
        }
        if company_name.trim().chars().count() < MIN_COMPANY_NAME_CHARS {
            return Err(AppError::Validation("Invalid company name".to_string()));
        }
        Ok(())
    }

    pub fn get_application_summary(&self, results: &ApplicationResults) -> String {
        let scores = &results.quality_assessment.component_scores;
        let status = &results.workflow_status;

        let mut lines = vec![
            "Application Processing Summary:".to_string(),
            "-".repeat(30),
            format!("Initial Match Score: {}/100", results.initial_match.score()),
            String::new(),
            "Optimization Results:".to_string(),
            format!("- ATS Compliance Score: {}/100", scores.ats_score),
            format!("- CV Quality Score: {}/100", scores.cv_score),
        ];
        if results.optimized_application.cover_letter.is_some() {
            lines.push(format!("- Cover Letter Score: {}/100", scores.letter_score));
        }
        lines.extend([
            String::new(),
            "Workflow Status:".to_string(),
            format!(
                "- Completed Steps: {}/{}",
                status.completed_steps, status.total_steps
            ),
            format!("- Completion: {}%", status.completion_percentage),
        ]);

        let issues = &results.quality_assessment.critical_issues;
        if !issues.is_empty() {
            lines.push(String::new());
            lines.push("Critical Issues to Address:".to_string());
            for group in [&issues.ats_issues, &issues.cv_issues, &issues.letter_issues] {
                lines.extend(group.iter().take(SUMMARY_ISSUES).map(|i| format!("- {i}")));
            }
        }

        lines.join("\n")
    }

    pub fn get_improvement_recommendations(&self, results: &ApplicationResults) -> Vec<String> {
        let quality = &results.quality_assessment.improvement_recommendations;
        let optimization = &results.optimized_application.optimization_details;

        quality
            .high_priority
            .iter()
            .map(|r| format!("[High Priority] {r}"))
            .chain(quality.medium_priority.iter().map(|r| format!("[Medium Priority] {r}")))
            .chain(optimization.recommendations.iter().map(|r| format!("[Optimization] {r}")))
            .collect()
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }
}
