use serde::Serialize;
use tracing::{debug, info, warn};

use super::section_matcher::{SectionMatcher, SubstringMatcher};

// ────────────────────────────────────────────────────────────────────────────
// Rule tables
// ────────────────────────────────────────────────────────────────────────────

pub const ALLOWED_FORMATS: &[&str] = &[".pdf", ".docx"];
pub const MAX_FILE_SIZE_MB: f64 = 10.0;
pub const RECOMMENDED_FONTS: &[&str] = &["Arial", "Calibri", "Times New Roman", "Helvetica"];
pub const MIN_FONT_SIZE: u8 = 10;
pub const MAX_FONT_SIZE: u8 = 12;

pub const RECOMMENDED_SECTIONS: &[&str] = &["summary", "certifications", "languages", "projects"];

pub const MAX_PAGES: u8 = 2;
pub const MAX_BULLETS_PER_JOB: u8 = 6;
pub const MAX_CHARACTERS_PER_BULLET: u8 = 100;
pub const FORBIDDEN_ELEMENTS: &[&str] = &[
    "images",
    "tables",
    "text boxes",
    "headers",
    "footers",
    "columns",
];

/// Whole-token substitutions applied during title normalization.
const TITLE_REPLACEMENTS: &[(&str, &str)] = &[
    ("edu", "education"),
    ("academic", "education"),
    ("qualification", "education"),
    ("exp", "experience"),
    ("professional", "experience"),
    ("employment", "experience"),
    ("work", "experience"),
    ("comp", "competencies"),
    ("tech", "technical"),
];

/// A section every ATS-friendly CV must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCategory {
    Contact,
    Experience,
    Education,
    Skills,
}

impl SectionCategory {
    pub const REQUIRED: [SectionCategory; 4] = [
        SectionCategory::Contact,
        SectionCategory::Experience,
        SectionCategory::Education,
        SectionCategory::Skills,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionCategory::Contact => "contact",
            SectionCategory::Experience => "experience",
            SectionCategory::Education => "education",
            SectionCategory::Skills => "skills",
        }
    }

    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            SectionCategory::Contact => &[
                "contact",
                "contact information",
                "personal information",
                "personal details",
                "personal info",
            ],
            SectionCategory::Experience => &[
                "experience",
                "work experience",
                "professional experience",
                "work history",
                "employment history",
                "professional background",
            ],
            SectionCategory::Education => &[
                "education",
                "academic background",
                "qualifications",
                "academic qualifications",
                "educational background",
            ],
            SectionCategory::Skills => &[
                "skills",
                "technical skills",
                "competencies",
                "key skills",
                "core competencies",
                "professional skills",
            ],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl ValidationOutcome {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationGuidelines {
    pub format_guidelines: Vec<String>,
    pub structure_guidelines: Vec<String>,
    pub content_guidelines: Vec<String>,
}

impl OptimizationGuidelines {
    /// Flat rendering for prompt interpolation.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        for (title, lines) in [
            ("Format", &self.format_guidelines),
            ("Structure", &self.structure_guidelines),
            ("Content", &self.content_guidelines),
        ] {
            out.push_str(title);
            out.push_str(":\n");
            for line in lines {
                out.push_str("- ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// File-level facts needed for format validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFacts {
    /// Lowercased, with the leading dot (".pdf").
    pub extension: String,
    pub size_mb: f64,
}

impl DocumentFacts {
    pub fn new(file_name: &str, size_bytes: u64) -> Self {
        let extension = std::path::Path::new(file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            extension,
            size_mb: size_bytes as f64 / (1024.0 * 1024.0),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic, LLM-free ATS checks over static rule tables.
pub struct AtsRules {
    matcher: Box<dyn SectionMatcher>,
}

impl Default for AtsRules {
    fn default() -> Self {
        Self::new()
    }
}

impl AtsRules {
    pub fn new() -> Self {
        Self::with_matcher(SubstringMatcher)
    }

    pub fn with_matcher(matcher: impl SectionMatcher + 'static) -> Self {
        Self {
            matcher: Box::new(matcher),
        }
    }

    /// Checks file extension (case-insensitive) and size. Both checks always
    /// run, so both issues can be reported together.
    pub fn validate_format(&self, extension: &str, size_mb: f64) -> ValidationOutcome {
        info!("Validating format: {extension}, size: {size_mb}MB");
        let mut issues = Vec::new();

        let extension = extension.to_lowercase();
        if !ALLOWED_FORMATS.contains(&extension.as_str()) {
            issues.push(format!(
                "Unsupported format. Use {}",
                ALLOWED_FORMATS.join(", ")
            ));
        }
        if size_mb > MAX_FILE_SIZE_MB {
            issues.push(format!(
                "File too large. Maximum size is {MAX_FILE_SIZE_MB}MB"
            ));
        }

        let outcome = ValidationOutcome::from_issues(issues);
        info!(valid = outcome.valid, issues = ?outcome.issues, "Format validation completed");
        outcome
    }

    pub fn validate_document(&self, facts: &DocumentFacts) -> ValidationOutcome {
        self.validate_format(&facts.extension, facts.size_mb)
    }

    /// Each required category is satisfied when any normalized title matches
    /// any normalized synonym under the configured matcher.
    pub fn validate_structure<S: AsRef<str>>(&self, sections: &[S]) -> ValidationOutcome {
        let normalized: Vec<String> = sections
            .iter()
            .map(|s| normalize_section_title(s.as_ref()))
            .collect();
        debug!(matcher = self.matcher.name(), ?normalized, "Validating structure");

        let mut issues = Vec::new();
        for category in SectionCategory::REQUIRED {
            let found = category.synonyms().iter().any(|synonym| {
                let synonym = normalize_section_title(synonym);
                normalized
                    .iter()
                    .any(|title| self.matcher.matches(title, &synonym))
            });
            if found {
                debug!("Found required section: {}", category.as_str());
            } else {
                warn!("Missing required section: {}", category.as_str());
                issues.push(format!("Missing required section: {}", category.as_str()));
            }
        }

        let outcome = ValidationOutcome::from_issues(issues);
        info!(valid = outcome.valid, issues = ?outcome.issues, "Structure validation completed");
        outcome
    }

    pub fn get_optimization_guidelines(&self) -> OptimizationGuidelines {
        OptimizationGuidelines {
            format_guidelines: vec![
                format!("Use approved file formats: {}", ALLOWED_FORMATS.join(", ")),
                format!("Keep file size under {MAX_FILE_SIZE_MB}MB"),
                format!("Use standard fonts: {}", RECOMMENDED_FONTS.join(", ")),
                format!("Font size between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}"),
            ],
            structure_guidelines: vec![
                "Include all required sections".to_string(),
                "Use standard section titles".to_string(),
                "Avoid complex formatting".to_string(),
                format!("Maximum {MAX_PAGES} pages"),
                "Ensure clear section headings".to_string(),
                format!("Consider adding: {}", RECOMMENDED_SECTIONS.join(", ")),
            ],
            content_guidelines: vec![
                format!("Maximum {MAX_BULLETS_PER_JOB} bullet points per job"),
                format!("Keep bullet points under {MAX_CHARACTERS_PER_BULLET} characters"),
                format!("Avoid: {}", FORBIDDEN_ELEMENTS.join(", ")),
                "Use industry-standard keywords".to_string(),
                "Include measurable achievements".to_string(),
            ],
        }
    }
}

/// Lowercases, drops punctuation, collapses whitespace, then expands common
/// abbreviations token by token ("Edu." → "education", "Work History" →
/// "experience history").
pub fn normalize_section_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    cleaned
        .split_whitespace()
        .map(|token| {
            TITLE_REPLACEMENTS
                .iter()
                .find(|(from, _)| *from == token)
                .map(|(_, to)| *to)
                .unwrap_or(token)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
