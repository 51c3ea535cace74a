//! Document ingestion: turns an uploaded CV file into plain text.
//!
//! `.pdf` goes through `pdf-extract`. `.docx`/`.doc` are read as OOXML
//! packages: `word/document.xml` is pulled out of the zip and its `<w:t>`
//! text runs are joined, one line per `<w:p>` paragraph.
//!
//! Extraction is blocking and runs on `spawn_blocking`. `process_document`
//! never fails; problems are reported in `DocumentResult::error`.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{error, info};

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];

static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>").expect("valid regex"));
static TEXT_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").expect("valid regex"));

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<usize>,
    pub file_size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub success: bool,
    pub content: Option<String>,
    pub metadata: Option<DocumentMetadata>,
    pub error: Option<String>,
}

impl DocumentResult {
    fn extracted(content: String, metadata: DocumentMetadata) -> Self {
        Self {
            success: true,
            content: Some(content),
            metadata: Some(metadata),
            error: None,
        }
    }

    fn failed(reason: impl std::fmt::Display) -> Self {
        let message = format!("Error processing document: {reason}");
        error!("{message}");
        Self {
            success: false,
            content: None,
            metadata: None,
            error: Some(message),
        }
    }
}

/// Lower-cased extension without the dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Ingestor
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait DocumentIngestor: Send + Sync {
    async fn process_document(&self, path: &Path) -> DocumentResult;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentProcessor;

#[async_trait]
impl DocumentIngestor for DocumentProcessor {
    async fn process_document(&self, path: &Path) -> DocumentResult {
        let owned: PathBuf = path.to_path_buf();
        match tokio::task::spawn_blocking(move || extract(&owned)).await {
            Ok(Ok((content, metadata))) => {
                info!(path = %path.display(), "Successfully processed document");
                DocumentResult::extracted(content, metadata)
            }
            Ok(Err(reason)) => DocumentResult::failed(reason),
            Err(e) => DocumentResult::failed(format!("extraction task failed: {e}")),
        }
    }
}

fn extract(path: &Path) -> Result<(String, DocumentMetadata), String> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }
    let extension = extension_of(path);
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let file_size = bytes.len() as u64;

    match extension.as_str() {
        "pdf" => {
            let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| format!("PDF extraction failed: {e}"))?;
            let content = pages.join("\n").trim().to_string();
            Ok((
                content,
                DocumentMetadata {
                    pages: Some(pages.len()),
                    paragraphs: None,
                    file_size,
                },
            ))
        }
        "docx" | "doc" => {
            let xml = read_document_xml(&bytes)?;
            let paragraphs = ooxml_paragraphs(&xml);
            Ok((
                paragraphs.join("\n").trim().to_string(),
                DocumentMetadata {
                    pages: None,
                    paragraphs: Some(paragraphs.len()),
                    file_size,
                },
            ))
        }
        other => Err(format!("Unsupported file format: .{other}")),
    }
}

fn read_document_xml(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| format!("not a Word document: {e}"))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing document body: {e}"))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|e| e.to_string())?;
    Ok(xml)
}

/// Text of each `<w:p>` paragraph, empty paragraphs included.
fn ooxml_paragraphs(xml: &str) -> Vec<String> {
    PARAGRAPH_RE
        .find_iter(xml)
        .map(|paragraph| {
            TEXT_RUN_RE
                .captures_iter(paragraph.as_str())
                .filter_map(|c| c.get(1))
                .map(|run| unescape_xml(run.as_str()))
                .collect::<String>()
        })
        .collect()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document><w:body>
<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
<w:p><w:pPr/><w:r><w:t xml:space="preserve">Skills: </w:t></w:r><w:r><w:t>Python &amp; SQL</w:t></w:r></w:p>
<w:p/>
</w:body></w:document>"#;

    fn write_docx(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(BODY.as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_ooxml_paragraphs_join_runs() {
        let paragraphs = ooxml_paragraphs(BODY);
        assert_eq!(paragraphs, vec!["Jane Doe", "Skills: Python & SQL"]);
    }

    #[tokio::test]
    async fn test_process_docx() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_docx(dir.path(), "cv.docx");

        let result = DocumentProcessor.process_document(&path).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.content.as_deref(), Some("Jane Doe\nSkills: Python & SQL"));
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.paragraphs, Some(2));
        assert!(metadata.file_size > 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();

        let result = DocumentProcessor
            .process_document(&dir.path().join("absent.pdf"))
            .await;

        assert!(!result.success);
        assert!(result.content.is_none());
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[tokio::test]
    async fn test_unsupported_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("cv.txt");
        std::fs::write(&txt, "plain text").unwrap();
        let fake_docx = dir.path().join("cv.docx");
        std::fs::write(&fake_docx, "not a zip").unwrap();

        let unsupported = DocumentProcessor.process_document(&txt).await;
        let corrupt = DocumentProcessor.process_document(&fake_docx).await;

        assert!(unsupported.error.unwrap().contains("Unsupported file format: .txt"));
        assert!(!corrupt.success);
    }

    #[test]
    fn test_extension_of_is_lowercased() {
        assert_eq!(extension_of(Path::new("/tmp/CV.PDF")), "pdf");
        assert_eq!(extension_of(Path::new("/tmp/cv")), "");
    }
}
