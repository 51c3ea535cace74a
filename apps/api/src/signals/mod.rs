//! Lexical signals over raw CV / job text: vocabulary hits, simple content
//! metrics and line-based section splitting. No LLM involvement.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub mod vocabulary;

use vocabulary::{is_action_verb, is_technical_term};

static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s.,\-']").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("valid regex"));
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

static SECTION_PATTERNS: Lazy<Vec<(SectionKind, Regex)>> = Lazy::new(|| {
    [
        (SectionKind::Education, r"education|academic|qualifications"),
        (SectionKind::Experience, r"experience|employment|work history"),
        (SectionKind::Skills, r"skills|competencies|expertise"),
        (SectionKind::Projects, r"projects|portfolio|works"),
        (SectionKind::Contact, r"contact|personal information|details"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("valid regex")))
    .collect()
});

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordSignals {
    pub technical_terms: Vec<String>,
    pub action_verbs: Vec<String>,
    /// Always empty: no part-of-speech tagging is performed.
    pub nouns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentMetrics {
    pub sentence_count: usize,
    pub word_count: usize,
    pub avg_sentence_length: f64,
    pub unique_words: usize,
    /// Percentage of words that are vocabulary terms or action verbs.
    pub keyword_richness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Education,
    Experience,
    Skills,
    Projects,
    Contact,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Skills => "skills",
            SectionKind::Projects => "projects",
            SectionKind::Contact => "contact",
        }
    }

    fn detect(line: &str) -> Option<SectionKind> {
        let lower = line.to_lowercase();
        SECTION_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(&lower))
            .map(|(kind, _)| *kind)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Lowercases, blanks out characters outside `[a-z0-9\s.,\-']`, drops one
/// trailing period and collapses whitespace.
pub fn preprocess(text: &str) -> String {
    let lower = text.to_lowercase();
    let cleaned = DISALLOWED_CHARS.replace_all(&lower, " ");
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned);
    WHITESPACE.replace_all(cleaned, " ").trim().to_string()
}

/// Strips list punctuation around a token so "python," still matches.
fn bare_token(word: &str) -> &str {
    word.trim_matches(|c| c == ',' || c == '\'').trim_end_matches('.')
}

pub fn extract_keywords(text: &str) -> KeywordSignals {
    let processed = preprocess(text);
    let mut technical = BTreeSet::new();
    let mut verbs = BTreeSet::new();

    for word in processed.split_whitespace().map(bare_token) {
        if is_technical_term(word) {
            technical.insert(word.to_string());
        }
        if is_action_verb(word) {
            verbs.insert(word.to_string());
        }
    }

    KeywordSignals {
        technical_terms: technical.into_iter().collect(),
        action_verbs: verbs.into_iter().collect(),
        nouns: Vec::new(),
    }
}

pub fn analyze_content(text: &str) -> ContentMetrics {
    let processed = preprocess(text);
    let sentence_count = SENTENCE_END
        .split(&processed)
        .filter(|s| !s.trim().is_empty())
        .count();
    let words: Vec<&str> = processed.split_whitespace().collect();
    let word_count = words.len();
    let unique_words = words.iter().collect::<BTreeSet<_>>().len();

    let avg_sentence_length = if sentence_count == 0 {
        0.0
    } else {
        word_count as f64 / sentence_count as f64
    };

    let keyword_richness = if word_count == 0 {
        0.0
    } else {
        let hits = words
            .iter()
            .map(|w| bare_token(w))
            .filter(|w| is_technical_term(w) || is_action_verb(w))
            .count();
        hits as f64 / word_count as f64 * 100.0
    };

    ContentMetrics {
        sentence_count,
        word_count,
        avg_sentence_length,
        unique_words,
        keyword_richness,
    }
}

/// Splits text into sections in document order. A line matching a section
/// pattern starts a new section; lines before the first header are dropped.
/// A repeated header appends to the earlier section of the same kind.
pub fn extract_sections(text: &str) -> Vec<(SectionKind, String)> {
    let mut sections: Vec<(SectionKind, Vec<String>)> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(kind) = SectionKind::detect(line) {
            let idx = match sections.iter().position(|(k, _)| *k == kind) {
                Some(idx) => idx,
                None => {
                    sections.push((kind, Vec::new()));
                    sections.len() - 1
                }
            };
            current = Some(idx);
        } else if let Some(idx) = current {
            sections[idx].1.push(line.to_string());
        }
    }

    sections
        .into_iter()
        .map(|(kind, lines)| (kind, lines.join("\n")))
        .collect()
}

/// Section names in document order.
pub fn section_names(text: &str) -> Vec<String> {
    extract_sections(text)
        .into_iter()
        .map(|(kind, _)| kind.as_str().to_string())
        .collect()
}

/// Blank-line separated blocks, trimmed, empties dropped.
pub fn blocks(text: &str) -> Vec<String> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}
