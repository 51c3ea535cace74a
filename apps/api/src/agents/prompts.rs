// LLM prompt constants for the analysis agents.
// Schema text is appended by the gateway; templates here only carry the task.

/// System prompt for CV analysis.
pub const CV_ANALYSIS_SYSTEM: &str = "You are an expert CV analyzer.";

/// CV analysis prompt. Replace `{cv_text}` before sending.
pub const CV_ANALYSIS_PROMPT: &str = r#"Analyze the following CV.

Extract the candidate's skills, total years of professional experience, highest
education, key achievements, important elements that are missing, and concrete
suggestions for improvement.

CV:
{cv_text}"#;

/// Job analysis prompt. Replace `{job_description}` before sending.
pub const JOB_ANALYSIS_PROMPT: &str = r#"Analyze this job description and extract key information in a structured format:

{job_description}

Focus on:
1. Required and preferred skills
2. Experience and education requirements
3. Key responsibilities
4. Company culture indicators
5. Benefits and perks
6. Seniority level
7. Technical requirements
8. Soft skills required"#;

/// System prompt for cover letter drafting.
pub const LETTER_SYSTEM: &str = "You are an expert cover letter writer with deep understanding \
    of professional communication.";

/// Letter content prompt. Replace `{company_name}`, `{required_skills}`,
/// `{experience_level}`, `{seniority_level}`, `{matching_skills}`,
/// `{experience_met}`, `{cv_text}` and `{culture_indicators}`.
pub const LETTER_CONTENT_PROMPT: &str = r#"Write a compelling cover letter for {company_name} based on the following:

Job Requirements:
- Required Skills: {required_skills}
- Experience Level: {experience_level}
- Job Level: {seniority_level}

Matching Qualifications:
- Matching Skills: {matching_skills}
- Experience Match: {experience_met}

Candidate Background:
{cv_text}

Company Culture Indicators:
{culture_indicators}

Guidelines:
1. Focus on matching qualifications
2. Highlight relevant achievements
3. Show enthusiasm for the company
4. Address specific job requirements
5. Maintain professional tone

Structure the response with clear introduction, body paragraphs, and closing.
Do not include a date, address block, salutation or signature."#;

/// Tone analysis prompt. Replace `{text}`.
pub const TONE_ANALYSIS_PROMPT: &str = "Analyze the tone of this text:\n\n{text}";

/// Letter validation prompt. Replace `{letter_text}` and `{job_description}`.
pub const LETTER_VALIDATION_PROMPT: &str = r#"Validate this cover letter against the job description:

Cover Letter:
{letter_text}

Job Description:
{job_description}"#;

/// System prompt for the CV rewrite.
pub const CV_OPTIMIZATION_SYSTEM: &str = "You are an expert ATS optimization system.";

/// CV rewrite prompt. Replace `{initial_score}`, `{job_description}`,
/// `{guidelines}` and `{cv_text}`.
pub const CV_OPTIMIZATION_PROMPT: &str = r#"As an ATS optimization expert, improve this CV to better match the job description.
Current match score: {initial_score}/100

Job Description:
{job_description}

ATS Guidelines:
{guidelines}

Current CV:
{cv_text}

Provide:
1. The full optimized CV text, keeping standard section headings on their own lines
2. List of specific changes made
3. Format suggestions
4. Additional recommendations

Never invent employers, titles, dates or achievements that are not in the current CV."#;
