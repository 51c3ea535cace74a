use std::sync::Arc;

use crate::config::Config;
use crate::quality::QualityMetrics;
use crate::rules::AtsRules;
use crate::workflow::WorkflowOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every service is built once at startup; requests share them read-only.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub metrics: Arc<QualityMetrics>,
    pub rules: Arc<AtsRules>,
    pub config: Config,
}
