//! Document text extraction and cleanup
//!
//! Real PDF parsing lives outside this crate; `TextExtractor` is the seam.
//! `PlainTextExtractor` reads documents that are already UTF-8 text.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors from document extraction
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not UTF-8 text")]
    NotText(String),
}

/// Text and metadata pulled out of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

/// Turns a stored document into plain text
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, DocumentError>;
}

/// Extractor for plain UTF-8 text files
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, DocumentError> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|_| DocumentError::NotText(path.display().to_string()))?;

        let mut metadata = BTreeMap::new();
        if let Some(name) = path.file_name() {
            metadata.insert("file_name".to_string(), name.to_string_lossy().into_owned());
        }
        Ok(ExtractedDocument { text, metadata })
    }
}

/// Title, abstract and body of an extracted document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedDocument {
    pub title: String,
    pub abstract_text: String,
    pub body: String,
}

const ABSTRACT_HEADING: &str = "abstract";
const SECTION_HEADINGS: &[&str] = &[
    "introduction",
    "keywords",
    "index terms",
    "categories and subject descriptors",
];

/// Whether a line opens the section following the abstract
fn is_section_heading(line: &str) -> bool {
    let trimmed = line.trim();
    let lower = trimmed.to_lowercase();
    if SECTION_HEADINGS.iter().any(|h| lower.starts_with(h)) {
        return true;
    }

    // "1 Introduction", "2. Related Work", "IV. EXPERIMENTS"
    let mut words = trimmed.split_whitespace();
    let Some(first) = words.next() else {
        return false;
    };
    let number = first.trim_end_matches('.');
    let numbered = !number.is_empty()
        && (number.chars().all(|c| c.is_ascii_digit())
            || (first.ends_with('.') && number.chars().all(|c| matches!(c, 'I' | 'V' | 'X'))));

    let rest: Vec<&str> = words.collect();
    numbered
        && !rest.is_empty()
        && rest.len() <= 4
        && rest[0].starts_with(char::is_uppercase)
}

/// Text after an `Abstract` heading on the same line, if the line is one
fn abstract_heading(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let head = trimmed.get(..ABSTRACT_HEADING.len())?;
    if !head.eq_ignore_ascii_case(ABSTRACT_HEADING) {
        return None;
    }
    let rest = &trimmed[ABSTRACT_HEADING.len()..];
    if rest.starts_with(char::is_alphanumeric) {
        return None;
    }
    Some(rest.trim_start_matches(|c: char| !c.is_alphanumeric()))
}

/// Split extracted text into title, abstract and body.
pub fn clean_extracted(contents: &str) -> CleanedDocument {
    let lines: Vec<&str> = contents.lines().collect();
    let Some(title_at) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return CleanedDocument::default();
    };
    let title = lines[title_at].trim().to_string();

    let abstract_at = lines
        .iter()
        .enumerate()
        .skip(title_at + 1)
        .find_map(|(i, l)| abstract_heading(l).map(|rest| (i, rest)));

    let Some((start, first)) = abstract_at else {
        return CleanedDocument {
            title,
            abstract_text: String::new(),
            body: join_lines(&lines[title_at + 1..]),
        };
    };

    let end = lines[start + 1..]
        .iter()
        .position(|l| is_section_heading(l))
        .map_or(lines.len(), |offset| start + 1 + offset);

    let mut abstract_lines = vec![first];
    abstract_lines.extend(&lines[start + 1..end]);

    CleanedDocument {
        title,
        abstract_text: join_lines(&abstract_lines),
        body: join_lines(&lines[end..]),
    }
}

fn join_lines(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
