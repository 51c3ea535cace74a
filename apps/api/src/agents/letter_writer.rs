use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::agents::cv_matcher::{CvMatcher, MatchResult};
use crate::agents::job_analyzer::JobAnalysis;
use crate::agents::prompts::{
    LETTER_CONTENT_PROMPT, LETTER_SYSTEM, LETTER_VALIDATION_PROMPT, TONE_ANALYSIS_PROMPT,
};
use crate::agents::{join_or, require_text};
use crate::errors::AppError;
use crate::llm_client::{DataQuality, ModelGateway, OutputSchema, TaskType};

const DEFAULT_TONE: &str = "professional";
const MIN_WORDS: usize = 250;
const MAX_WORDS: usize = 400;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterFormat {
    #[default]
    Formal,
    Modern,
    Creative,
}

/// Which optional blocks a format includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    pub salutation: bool,
    pub company_address: bool,
    pub formal_closing: bool,
}

impl LetterFormat {
    /// Unknown names fall back to `Formal`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "modern" => LetterFormat::Modern,
            "creative" => LetterFormat::Creative,
            _ => LetterFormat::Formal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LetterFormat::Formal => "formal",
            LetterFormat::Modern => "modern",
            LetterFormat::Creative => "creative",
        }
    }

    pub fn config(self) -> FormatConfig {
        match self {
            LetterFormat::Formal => FormatConfig {
                salutation: true,
                company_address: true,
                formal_closing: true,
            },
            LetterFormat::Modern => FormatConfig {
                salutation: true,
                company_address: false,
                formal_closing: false,
            },
            LetterFormat::Creative => FormatConfig {
                salutation: true,
                company_address: false,
                formal_closing: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterSection {
    Date,
    CompanyAddress,
    Salutation,
    Introduction,
    BodyParagraph,
    Closing,
    Signature,
}

/// Model-written letter body before formatting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LetterContent {
    pub introduction: String,
    pub body_paragraphs: Vec<String>,
    pub closing: String,
    pub achievements: Vec<String>,
    pub key_points: Vec<String>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedLetter {
    pub text: String,
    pub sections: Vec<LetterSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterStructure {
    pub sections: Vec<LetterSection>,
    pub format_used: LetterFormat,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleAnalysis {
    pub tone: String,
    /// Number of sections in the formatted letter.
    pub structure_completeness: usize,
    pub length_appropriate: bool,
    pub has_key_components: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverLetter {
    pub letter: String,
    pub structure: LetterStructure,
    pub style_analysis: StyleAnalysis,
    pub matching_achievements: Vec<String>,
    pub key_points_included: Vec<String>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterValidation {
    pub is_relevant: bool,
    pub addresses_key_requirements: bool,
    pub professional_tone: bool,
    pub improvement_suggestions: Vec<String>,
    pub data_quality: DataQuality,
}

// ────────────────────────────────────────────────────────────────────────────
// Writer
// ────────────────────────────────────────────────────────────────────────────

pub struct LetterWriter {
    gateway: Arc<ModelGateway>,
    matcher: Arc<CvMatcher>,
}

impl LetterWriter {
    pub fn new(gateway: Arc<ModelGateway>, matcher: Arc<CvMatcher>) -> Self {
        Self { gateway, matcher }
    }

    /// Analyzes the CV and job once, matches them, then drafts the letter.
    pub async fn generate_cover_letter(
        &self,
        cv_text: &str,
        job_description: &str,
        company_name: &str,
        format: LetterFormat,
    ) -> Result<CoverLetter, AppError> {
        require_text("Company name", company_name)?;
        info!(company = company_name, format = format.as_str(), "Starting cover letter generation");

        let cv_analysis = self.matcher.cv_analyzer().analyze_cv(cv_text, None).await?;
        let job_analysis = self.matcher.job_analyzer().analyze_job(job_description).await?;
        let match_result = self.matcher.match_analyses(&cv_analysis, &job_analysis);

        self.draft_letter(cv_text, &job_analysis, &match_result, company_name, format)
            .await
    }

    /// Drafts a letter from analyses the caller already has.
    pub async fn draft_letter(
        &self,
        cv_text: &str,
        job: &JobAnalysis,
        match_result: &MatchResult,
        company_name: &str,
        format: LetterFormat,
    ) -> Result<CoverLetter, AppError> {
        require_text("CV text", cv_text)?;
        require_text("Company name", company_name)?;

        let content = self
            .generate_content(cv_text, job, match_result, company_name)
            .await;
        let formatted = format_letter(&content, company_name, format, Local::now().date_naive());
        let (style_analysis, tone_quality) = self.analyze_style(&formatted).await;

        let data_quality = content.data_quality.merge(tone_quality);
        let word_count = formatted.text.split_whitespace().count();
        info!(words = word_count, ?data_quality, "Cover letter generated");

        Ok(CoverLetter {
            letter: formatted.text,
            structure: LetterStructure {
                sections: formatted.sections,
                format_used: format,
                word_count,
            },
            style_analysis,
            matching_achievements: content.achievements,
            key_points_included: content.key_points,
            data_quality,
        })
    }

    async fn generate_content(
        &self,
        cv_text: &str,
        job: &JobAnalysis,
        match_result: &MatchResult,
        company_name: &str,
    ) -> LetterContent {
        let experience_met = if match_result.experience_match.meets_requirement {
            "Yes"
        } else {
            "No"
        };
        let experience_level = if job.requirements.experience.is_empty() {
            "Not specified"
        } else {
            job.requirements.experience.as_str()
        };

        let prompt = LETTER_CONTENT_PROMPT
            .replace("{company_name}", company_name)
            .replace(
                "{required_skills}",
                &join_or(&job.requirements.required_skills, "Not specified"),
            )
            .replace("{experience_level}", experience_level)
            .replace("{seniority_level}", &job.job_details.seniority_level)
            .replace(
                "{matching_skills}",
                &join_or(&match_result.skills_match.matched_required, "None identified"),
            )
            .replace("{experience_met}", experience_met)
            .replace(
                "{culture_indicators}",
                &join_or(&job.company_culture.indicators, "Not specified"),
            )
            .replace("{cv_text}", cv_text);

        let schema = OutputSchema::new()
            .scalar("introduction", "string")
            .list("body_paragraphs", "list of paragraphs")
            .scalar("closing", "string")
            .list("achievements", "list of highlighted achievements")
            .list("key_points", "list of key points addressed");

        let llm = self
            .gateway
            .get_structured_completion(
                &prompt,
                &schema,
                Some(TaskType::LetterWriting),
                Some(LETTER_SYSTEM),
            )
            .await;
        if llm.is_degraded() {
            warn!("Letter content completion degraded; letter body is empty");
        }

        LetterContent {
            introduction: llm.text("introduction"),
            body_paragraphs: llm.list("body_paragraphs"),
            closing: llm.text("closing"),
            achievements: llm.list("achievements"),
            key_points: llm.list("key_points"),
            data_quality: llm.quality(),
        }
    }

    async fn analyze_style(&self, letter: &FormattedLetter) -> (StyleAnalysis, DataQuality) {
        let (tone, quality) = self.determine_tone(&letter.text).await;
        let words = letter.text.split_whitespace().count();
        let has_key_components = [
            LetterSection::Introduction,
            LetterSection::BodyParagraph,
            LetterSection::Closing,
        ]
        .iter()
        .all(|section| letter.sections.contains(section));

        let analysis = StyleAnalysis {
            tone,
            structure_completeness: letter.sections.len(),
            length_appropriate: (MIN_WORDS..=MAX_WORDS).contains(&words),
            has_key_components,
        };
        (analysis, quality)
    }

    /// Primary tone from one completion, "professional" when none comes back.
    async fn determine_tone(&self, text: &str) -> (String, DataQuality) {
        let schema = OutputSchema::new()
            .scalar("primary_tone", "string")
            .scalar("formality_level", "string")
            .scalar("enthusiasm_level", "string");
        let prompt = TONE_ANALYSIS_PROMPT.replace("{text}", text);

        let llm = self
            .gateway
            .get_structured_completion(&prompt, &schema, Some(TaskType::ToneAnalysis), None)
            .await;
        let tone = llm.text("primary_tone");
        if tone.is_empty() {
            (DEFAULT_TONE.to_string(), llm.quality())
        } else {
            (tone, llm.quality())
        }
    }

    pub async fn validate_letter(
        &self,
        letter_text: &str,
        job_description: &str,
    ) -> Result<LetterValidation, AppError> {
        require_text("Cover letter", letter_text)?;
        require_text("Job description", job_description)?;

        let schema = OutputSchema::new()
            .scalar("is_relevant", "boolean")
            .scalar("addresses_key_requirements", "boolean")
            .scalar("professional_tone", "boolean")
            .list("improvement_suggestions", "list of suggestions");
        let prompt = LETTER_VALIDATION_PROMPT
            .replace("{letter_text}", letter_text)
            .replace("{job_description}", job_description);

        let llm = self
            .gateway
            .get_structured_completion(&prompt, &schema, Some(TaskType::LetterValidation), None)
            .await;
        if llm.is_degraded() {
            warn!("Letter validation completion degraded; all checks read as failed");
        }

        Ok(LetterValidation {
            is_relevant: llm.flag("is_relevant"),
            addresses_key_requirements: llm.flag("addresses_key_requirements"),
            professional_tone: llm.flag("professional_tone"),
            improvement_suggestions: llm.list("improvement_suggestions"),
            data_quality: llm.quality(),
        })
    }
}

/// Lays the letter out section by section according to `format`.
pub fn format_letter(
    content: &LetterContent,
    company_name: &str,
    format: LetterFormat,
    date: NaiveDate,
) -> FormattedLetter {
    let config = format.config();
    let mut text = String::new();
    let mut sections = Vec::new();

    text.push_str(&format!("{}\n\n", date.format("%B %d, %Y")));
    sections.push(LetterSection::Date);

    if config.company_address {
        text.push_str(&format!("{company_name}\n[Company Address]\n\n"));
        sections.push(LetterSection::CompanyAddress);
    }
    if config.salutation {
        text.push_str("Dear Hiring Manager,\n\n");
        sections.push(LetterSection::Salutation);
    }

    text.push_str(&content.introduction);
    text.push_str("\n\n");
    sections.push(LetterSection::Introduction);

    for paragraph in &content.body_paragraphs {
        text.push_str(paragraph);
        text.push_str("\n\n");
        sections.push(LetterSection::BodyParagraph);
    }

    text.push_str(&content.closing);
    text.push_str("\n\n");
    sections.push(LetterSection::Closing);

    if config.formal_closing {
        text.push_str("Sincerely,\n[Your Name]");
        sections.push(LetterSection::Signature);
    }

    FormattedLetter {
        text: text.trim_end().to_string(),
        sections,
    }
}
