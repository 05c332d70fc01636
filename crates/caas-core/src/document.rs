//! Input data model: documents, sections and the identifiers the engine
//! reports back to callers.
//!
//! Documents are owned by the caller. The engine only ever borrows them and
//! never writes weights back into them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BASE_WEIGHT;
use crate::error::EngineError;

/// Detected document category. Exactly one per document; `Unknown` when no
/// detection rule matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    LegalContract,
    TechnicalDocumentation,
    SourceCode,
    ResearchPaper,
    Tutorial,
    ApiDocumentation,
    Unknown,
}

impl DocumentType {
    /// Detectable types in tie-break priority order, highest first.
    pub const PRIORITY: [DocumentType; 6] = [
        Self::LegalContract,
        Self::ApiDocumentation,
        Self::TechnicalDocumentation,
        Self::ResearchPaper,
        Self::Tutorial,
        Self::SourceCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegalContract => "legal_contract",
            Self::TechnicalDocumentation => "technical_documentation",
            Self::SourceCode => "source_code",
            Self::ResearchPaper => "research_paper",
            Self::Tutorial => "tutorial",
            Self::ApiDocumentation => "api_documentation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legal_contract" => Ok(Self::LegalContract),
            "technical_documentation" => Ok(Self::TechnicalDocumentation),
            "source_code" => Ok(Self::SourceCode),
            "research_paper" => Ok(Self::ResearchPaper),
            "tutorial" => Ok(Self::Tutorial),
            "api_documentation" => Ok(Self::ApiDocumentation),
            "unknown" => Ok(Self::Unknown),
            other => Err(EngineError::config(format!("unknown document type '{other}'"))),
        }
    }
}

/// Where a section's content comes from. Official sources outrank informal ones
/// when the two disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceAuthority {
    Official,
    Informal,
    #[default]
    Unknown,
}

impl SourceAuthority {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Official => 2,
            Self::Informal => 1,
            Self::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Informal => "informal",
            Self::Unknown => "unknown",
        }
    }
}

fn default_base_weight() -> f64 {
    DEFAULT_BASE_WEIGHT
}

/// One titled section of a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub body: String,
    /// Position index within the owning document, starting at 0.
    pub position: usize,
    #[serde(default = "default_base_weight")]
    pub base_weight: f64,
    #[serde(default)]
    pub authority: SourceAuthority,
}

impl Section {
    pub fn new(title: &str, body: &str, position: usize) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            position,
            base_weight: DEFAULT_BASE_WEIGHT,
            authority: SourceAuthority::Unknown,
        }
    }

    pub fn with_authority(mut self, authority: SourceAuthority) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_base_weight(mut self, base_weight: f64) -> Self {
        self.base_weight = base_weight;
        self
    }

    /// Body length in characters.
    pub fn char_len(&self) -> usize {
        self.body.chars().count()
    }

    /// Title and body as one searchable string.
    pub fn full_text(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}

/// An immutable snapshot of a parsed document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// `None` until detected; a supplied type is trusted as-is.
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Last creation/update time, Unix seconds.
    #[serde(default)]
    pub updated_at: u64,
}

impl Document {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            document_type: None,
            sections: Vec::new(),
            updated_at: 0,
        }
    }

    /// Append a section at the next position index.
    pub fn push_section(&mut self, title: &str, body: &str) -> &mut Section {
        let position = self.sections.len();
        self.sections.push(Section::new(title, body, position));
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    pub fn with_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = Some(document_type);
        self
    }

    pub fn with_updated_at(mut self, updated_at: u64) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Identifies an assembly candidate: a document section or a conversation turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CandidateId {
    Section { document_id: String, position: usize },
    Turn { sequence: u64 },
}

impl CandidateId {
    pub fn section(document_id: &str, position: usize) -> Self {
        Self::Section {
            document_id: document_id.to_string(),
            position,
        }
    }

    pub fn turn(sequence: u64) -> Self {
        Self::Turn { sequence }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Self::Section { .. })
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section {
                document_id,
                position,
            } => write!(f, "{document_id}#{position}"),
            Self::Turn { sequence } => write!(f, "turn#{sequence}"),
        }
    }
}
