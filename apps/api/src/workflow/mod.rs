// Application workflow: document ingestion, the staged orchestrator and its
// HTTP handlers.

pub mod document;
pub mod handlers;
pub mod orchestrator;

pub use document::{DocumentIngestor, DocumentProcessor, DocumentResult};
pub use orchestrator::{
    ApplicationRequest, ApplicationResults, WorkflowError, WorkflowOrchestrator, WorkflowStage,
};
