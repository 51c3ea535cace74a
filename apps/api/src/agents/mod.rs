//! Analysis agents. Each one combines structured completions from the
//! gateway with lexical signals and rule checks into a typed result.
//! Agents do not degrade on their own: invalid input is an `AppError`,
//! while degraded completions surface through `data_quality`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;

pub mod ats_optimizer;
pub mod cv_analyzer;
pub mod cv_matcher;
pub mod job_analyzer;
pub mod letter_writer;
pub mod prompts;

#[cfg(test)]
pub mod fixtures;

pub use ats_optimizer::{AtsOptimizer, OptimizationResult};
pub use cv_analyzer::{CvAnalysis, CvAnalyzer};
pub use cv_matcher::{CvMatcher, MatchLevel, MatchResult};
pub use job_analyzer::{JobAnalysis, JobAnalyzer};
pub use letter_writer::{CoverLetter, LetterFormat, LetterWriter};

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// First run of digits in `text` ("3-5 years" → 3), 0 when there is none.
pub fn first_integer(text: &str) -> u32 {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("3-5 years of experience"), 3);
        assert_eq!(first_integer("10+"), 10);
        assert_eq!(first_integer("senior"), 0);
        assert_eq!(first_integer("7.5"), 7);
    }

    #[test]
    fn test_require_text_rejects_blank() {
        assert!(matches!(
            require_text("CV text", "  \n"),
            Err(AppError::Validation(msg)) if msg == "CV text must not be empty"
        ));
        assert!(require_text("CV text", "x").is_ok());
    }
}
