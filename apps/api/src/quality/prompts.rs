// Evaluation prompt templates for the quality agents.
// Each template asks for exactly one sub-dimension; the gateway appends the schema.

/// Replace `{cv_text}`.
pub const ATS_FORMAT_PROMPT: &str = "Analyze the format of this CV for ATS compliance:\n\n{cv_text}";

/// Replace `{cv_text}` and `{job_description}`.
pub const ATS_KEYWORD_PROMPT: &str = r#"Analyze keyword optimization between CV and job description:

CV:
{cv_text}

Job Description:
{job_description}"#;

/// Replace `{cv_text}` and `{job_description}`.
pub const ATS_CONTENT_PROMPT: &str = r#"Analyze the content quality of this CV for ATS compliance:

CV:
{cv_text}

Job Description:
{job_description}"#;

pub const CV_CONTENT_PROMPT: &str = "Evaluate the content quality of this CV:\n\n{cv_text}";

pub const CV_ACHIEVEMENTS_PROMPT: &str = "Evaluate the achievements in this CV:\n\n{cv_text}";

pub const CV_EXPERIENCE_PROMPT: &str = "Evaluate the experience presentation in this CV:\n\n{cv_text}";

/// Replace `{cv_text}` and `{industry}` ("Not specified" when absent).
pub const CV_SKILLS_PROMPT: &str = r#"Evaluate the skills presentation in this CV:

CV Content:
{cv_text}

Industry Context:
{industry}"#;

/// Replace `{industry}` and `{cv_text}`.
pub const CV_INDUSTRY_PROMPT: &str = r#"Evaluate this CV's alignment with {industry} industry standards:

CV Content:
{cv_text}"#;

/// Replace `{letter_text}` and `{job_description}`.
pub const LETTER_CONTENT_PROMPT: &str = r#"Evaluate how well this cover letter addresses the job requirements:

Cover Letter:
{letter_text}

Job Description:
{job_description}"#;

pub const LETTER_TONE_PROMPT: &str = "Evaluate the professional tone of this cover letter:\n\n{letter_text}";

/// Replace `{letter_text}`, `{job_description}` and `{company_name}`.
pub const LETTER_CUSTOMIZATION_PROMPT: &str = r#"Evaluate how well this cover letter is customized:

Cover Letter:
{letter_text}

Job Description:
{job_description}

Company:
{company_name}"#;

pub const LETTER_FORMAT_PROMPT: &str =
    "Evaluate the structure and format of this cover letter:\n\n{letter_text}";
