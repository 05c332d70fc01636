//! Document type detection.
//!
//! Each detectable type has a trigger vocabulary. The detector counts
//! whole-word, case-insensitive trigger hits across every section title and
//! body, then picks the type with the most hits. Ties go to the type that
//! comes first in [`DocumentType::PRIORITY`]. Zero hits means `Unknown`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::document::{Document, DocumentType};
use crate::error::{EngineError, Result};

/// Built-in trigger vocabulary for a detectable type.
pub fn default_triggers(document_type: DocumentType) -> &'static [&'static str] {
    match document_type {
        DocumentType::LegalContract => &[
            "whereas",
            "party",
            "parties",
            "hereby",
            "herein",
            "thereof",
            "indemnify",
            "indemnification",
            "agreement",
            "governing law",
            "liability",
            "termination",
        ],
        DocumentType::ApiDocumentation => &[
            "endpoint",
            "endpoints",
            "api",
            "request",
            "response",
            "http",
            "status code",
            "parameter",
            "parameters",
            "authentication",
            "json",
        ],
        DocumentType::TechnicalDocumentation => &[
            "installation",
            "configuration",
            "architecture",
            "deployment",
            "troubleshooting",
            "requirements",
            "overview",
            "setup",
        ],
        DocumentType::ResearchPaper => &[
            "abstract",
            "methodology",
            "hypothesis",
            "experiment",
            "experiments",
            "results",
            "conclusion",
            "references",
            "related work",
            "et al",
        ],
        DocumentType::Tutorial => &[
            "tutorial",
            "step",
            "steps",
            "getting started",
            "exercise",
            "lesson",
            "learn",
            "let's",
            "follow along",
        ],
        DocumentType::SourceCode => &[
            "fn", "def", "class", "import", "return", "struct", "impl", "function", "const",
        ],
        DocumentType::Unknown => &[],
    }
}

static BUILTIN_RULES: LazyLock<Vec<(DocumentType, Regex)>> = LazyLock::new(|| {
    DocumentType::PRIORITY
        .iter()
        .map(|t| (*t, compile_triggers(default_triggers(*t)).unwrap()))
        .collect()
});

/// Build one alternation regex for a trigger list. Word boundaries are only
/// added where the keyword edge is itself a word character.
fn compile_triggers<S: AsRef<str>>(keywords: &[S]) -> Result<Regex> {
    let mut sorted: Vec<&str> = keywords.iter().map(|k| k.as_ref().trim()).collect();
    if sorted.iter().any(|k| k.is_empty()) {
        return Err(EngineError::config("detection trigger keywords must not be empty"));
    }
    // Longest first so "parties" wins over "party" at the same offset.
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    sorted.dedup();

    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let alternatives: Vec<String> = sorted
        .iter()
        .map(|k| {
            let lead = if is_word(k.chars().next()) { r"\b" } else { "" };
            let tail = if is_word(k.chars().last()) { r"\b" } else { "" };
            format!("{lead}{}{tail}", regex::escape(k))
        })
        .collect();

    let pattern = format!("(?i)(?:{})", alternatives.join("|"));
    Regex::new(&pattern).map_err(|e| EngineError::config(format!("invalid trigger rule: {e}")))
}

/// Hit count for one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeScore {
    pub document_type: DocumentType,
    pub hits: usize,
}

/// Detection outcome with the per-type evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub document_type: DocumentType,
    /// One entry per detectable type, in priority order.
    pub scores: Vec<TypeScore>,
}

/// Keyword-count document classifier.
#[derive(Debug, Clone)]
pub struct TypeDetector {
    rules: Vec<(DocumentType, Regex)>,
}

impl Default for TypeDetector {
    fn default() -> Self {
        Self {
            rules: BUILTIN_RULES.clone(),
        }
    }
}

impl TypeDetector {
    /// Built-in rules with the listed types' trigger lists replaced.
    /// `Unknown` cannot be given triggers.
    pub fn with_rules(overrides: &BTreeMap<DocumentType, Vec<String>>) -> Result<Self> {
        if overrides.contains_key(&DocumentType::Unknown) {
            return Err(EngineError::config(
                "document_type_rules cannot define triggers for 'unknown'",
            ));
        }

        let mut rules = Vec::with_capacity(DocumentType::PRIORITY.len());
        for (document_type, builtin) in BUILTIN_RULES.iter() {
            let regex = match overrides.get(document_type) {
                Some(keywords) if keywords.is_empty() => {
                    return Err(EngineError::config(format!(
                        "document_type_rules.{document_type} must list at least one keyword"
                    )));
                }
                Some(keywords) => compile_triggers(keywords)?,
                None => builtin.clone(),
            };
            rules.push((*document_type, regex));
        }
        Ok(Self { rules })
    }

    pub fn detect(&self, document: &Document) -> DocumentType {
        self.detect_with_scores(document).document_type
    }

    pub fn detect_with_scores(&self, document: &Document) -> Detection {
        let scores: Vec<TypeScore> = self
            .rules
            .iter()
            .map(|(document_type, regex)| {
                let hits = document
                    .sections
                    .iter()
                    .map(|s| regex.find_iter(&s.title).count() + regex.find_iter(&s.body).count())
                    .sum();
                TypeScore {
                    document_type: *document_type,
                    hits,
                }
            })
            .collect();

        // Strictly greater keeps the earlier (higher-priority) type on ties.
        let mut best: Option<TypeScore> = None;
        for score in &scores {
            if score.hits > best.map_or(0, |b| b.hits) {
                best = Some(*score);
            }
        }
        let document_type = best.map_or(DocumentType::Unknown, |b| b.document_type);

        debug!(
            document_id = %document.id,
            %document_type,
            hits = best.map_or(0, |b| b.hits),
            "detected document type"
        );

        Detection {
            document_type,
            scores,
        }
    }
}

/// Detect with the built-in rules.
pub fn detect_document_type(document: &Document) -> DocumentType {
    TypeDetector::default().detect(document)
}
