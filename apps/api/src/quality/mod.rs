//! Quality agents and score aggregation.
//!
//! `AtsValidator`, `CvEvaluator` and `LetterEvaluator` each issue one
//! structured completion per sub-dimension and fold the results through a
//! fixed weight table. `QualityMetrics` scores caller-supplied metric maps;
//! `Coordinator` runs all three evaluators for one application.

pub mod ats_validator;
pub mod coordinator;
pub mod cv_evaluator;
pub mod letter_evaluator;
pub mod metrics;
pub mod prompts;
pub mod scoring;

pub use ats_validator::{AtsValidation, AtsValidator};
pub use coordinator::{Coordinator, QualityReport};
pub use cv_evaluator::{CvEvaluation, CvEvaluator};
pub use letter_evaluator::{LetterEvaluation, LetterEvaluator};
pub use metrics::{MetricMap, QualityAssessment, QualityMetrics};
