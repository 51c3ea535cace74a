pub mod ats_rules;
pub mod section_matcher;

pub use ats_rules::{AtsRules, DocumentFacts, OptimizationGuidelines, ValidationOutcome};
pub use section_matcher::{ExactMatcher, SectionMatcher, SubstringMatcher};
