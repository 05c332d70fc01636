//! Section weight calculation.
//!
//! A section's weight starts at its base weight and is multiplied, in this
//! fixed order, by:
//!
//! 1. the type-specific title multiplier,
//! 2. `(1 + bonus)` for each content heuristic that fires,
//! 3. `(1 + bonus)` for first/last position,
//! 4. `(1 + 0.5)` when any query token matches.
//!
//! Later stages scale the already-boosted weight, so bonuses compound.
//! The result is never negative and has no upper clamp.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};
use serde::Serialize;
use tracing::debug;

use crate::constants::{
    CODE_BLOCK_BONUS, DEFINITIONS_HEADING_BONUS, FIRST_POSITION_BONUS, IMPORTANCE_MARKER_BONUS,
    LAST_POSITION_BONUS, LONG_BODY_BONUS, LONG_BODY_THRESHOLD_CHARS, QUERY_MATCH_BONUS,
};
use crate::document::{DocumentType, Section};
use crate::tokenizer::QueryTerms;

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:```|~~~)|^(?: {4}|\t)\S").unwrap());
static DEFINITIONS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\d+(?:\.\d+)*\.?[ \t]+)?(?:definitions|defined terms|glossary|terminology)[ \t]*:?[ \t]*$",
    )
    .unwrap()
});
static IMPORTANCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:critical|must|required)\b").unwrap());

/// Title keyword → multiplier for one document type. First match wins;
/// titles matching nothing keep ×1.0.
///
/// Keywords match whole words, with an optional plural `s`/`es`. A trailing
/// `*` marks a stem that matches at a word start ("indemnif*" covers
/// "Indemnification" and "Indemnify").
pub fn title_multipliers(document_type: DocumentType) -> &'static [(&'static str, f64)] {
    match document_type {
        DocumentType::LegalContract => LEGAL_CONTRACT_TITLES,
        DocumentType::TechnicalDocumentation => TECHNICAL_DOCUMENTATION_TITLES,
        DocumentType::SourceCode => SOURCE_CODE_TITLES,
        DocumentType::ResearchPaper => RESEARCH_PAPER_TITLES,
        DocumentType::Tutorial => TUTORIAL_TITLES,
        DocumentType::ApiDocumentation => API_DOCUMENTATION_TITLES,
        DocumentType::Unknown => &[],
    }
}

const LEGAL_CONTRACT_TITLES: &[(&str, f64)] = &[
    ("definitions", 2.0),
    ("indemnif*", 1.8),
    ("liability", 1.8),
    ("obligations", 1.6),
    ("termination", 1.5),
    ("payment", 1.4),
    ("confidential*", 1.4),
    ("warrant*", 1.3),
    ("governing law", 1.2),
    ("recitals", 0.8),
    ("signature", 0.7),
];

const TECHNICAL_DOCUMENTATION_TITLES: &[(&str, f64)] = &[
    ("architecture", 1.6),
    ("installation", 1.5),
    ("configuration", 1.5),
    ("overview", 1.4),
    ("requirements", 1.4),
    ("troubleshooting", 1.3),
    ("changelog", 0.7),
];

const SOURCE_CODE_TITLES: &[(&str, f64)] = &[
    ("public api", 1.6),
    ("interface", 1.5),
    ("class", 1.4),
    ("struct", 1.4),
    ("main", 1.3),
    ("function", 1.2),
    ("test", 0.8),
    ("comment", 0.6),
];

const RESEARCH_PAPER_TITLES: &[(&str, f64)] = &[
    ("abstract", 2.0),
    ("conclusion", 1.8),
    ("results", 1.7),
    ("discussion", 1.5),
    ("methodology", 1.4),
    ("methods", 1.4),
    ("introduction", 1.2),
    ("related work", 0.9),
    ("references", 0.5),
    ("acknowledg*", 0.5),
];

const TUTORIAL_TITLES: &[(&str, f64)] = &[
    ("getting started", 1.6),
    ("step", 1.5),
    ("example", 1.4),
    ("prerequisites", 1.3),
    ("summary", 1.3),
    ("exercise", 1.2),
    ("further reading", 0.7),
];

const API_DOCUMENTATION_TITLES: &[(&str, f64)] = &[
    ("authentication", 1.8),
    ("endpoint", 1.7),
    ("request", 1.5),
    ("response", 1.5),
    ("parameter", 1.4),
    ("error", 1.4),
    ("rate limit", 1.3),
    ("example", 1.2),
    ("changelog", 0.7),
];

static LEGAL_CONTRACT_SET: LazyLock<RegexSet> =
    LazyLock::new(|| keyword_set(LEGAL_CONTRACT_TITLES));
static TECHNICAL_DOCUMENTATION_SET: LazyLock<RegexSet> =
    LazyLock::new(|| keyword_set(TECHNICAL_DOCUMENTATION_TITLES));
static SOURCE_CODE_SET: LazyLock<RegexSet> = LazyLock::new(|| keyword_set(SOURCE_CODE_TITLES));
static RESEARCH_PAPER_SET: LazyLock<RegexSet> =
    LazyLock::new(|| keyword_set(RESEARCH_PAPER_TITLES));
static TUTORIAL_SET: LazyLock<RegexSet> = LazyLock::new(|| keyword_set(TUTORIAL_TITLES));
static API_DOCUMENTATION_SET: LazyLock<RegexSet> =
    LazyLock::new(|| keyword_set(API_DOCUMENTATION_TITLES));

fn keyword_pattern(keyword: &str) -> String {
    let (word, is_stem) = match keyword.strip_suffix('*') {
        Some(stem) => (stem, true),
        None => (keyword, false),
    };
    let words: Vec<String> = word.split_whitespace().map(regex::escape).collect();
    let tail = if is_stem { r"\w*" } else { "(?:s|es)?" };
    format!(r"(?i)\b{}{tail}\b", words.join(r"\s+"))
}

fn keyword_set(table: &[(&str, f64)]) -> RegexSet {
    title_keyword_matcher(table.iter().map(|(keyword, _)| *keyword))
}

/// Case-insensitive whole-word matcher over title keywords, one pattern per
/// keyword in order. A trailing `*` makes the keyword a stem.
pub(crate) fn title_keyword_matcher<'a>(
    keywords: impl IntoIterator<Item = &'a str>,
) -> RegexSet {
    RegexSet::new(keywords.into_iter().map(keyword_pattern)).unwrap()
}

fn title_keyword_set(document_type: DocumentType) -> Option<&'static RegexSet> {
    match document_type {
        DocumentType::LegalContract => Some(&*LEGAL_CONTRACT_SET),
        DocumentType::TechnicalDocumentation => Some(&*TECHNICAL_DOCUMENTATION_SET),
        DocumentType::SourceCode => Some(&*SOURCE_CODE_SET),
        DocumentType::ResearchPaper => Some(&*RESEARCH_PAPER_SET),
        DocumentType::Tutorial => Some(&*TUTORIAL_SET),
        DocumentType::ApiDocumentation => Some(&*API_DOCUMENTATION_SET),
        DocumentType::Unknown => None,
    }
}

/// First keyword of the type's table that `title` contains, with its multiplier.
pub fn match_title_keyword(
    title: &str,
    document_type: DocumentType,
) -> Option<(&'static str, f64)> {
    let set = title_keyword_set(document_type)?;
    let index = set.matches(title).iter().next()?;
    let (keyword, multiplier) = title_multipliers(document_type)[index];
    Some((keyword.trim_end_matches('*'), multiplier))
}

/// Content heuristic that adds a bonus. Declaration order is application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentBonus {
    CodeBlock,
    DefinitionsHeading,
    ImportanceMarker,
    LongBody,
}

impl ContentBonus {
    pub fn bonus(&self) -> f64 {
        match self {
            Self::CodeBlock => CODE_BLOCK_BONUS,
            Self::DefinitionsHeading => DEFINITIONS_HEADING_BONUS,
            Self::ImportanceMarker => IMPORTANCE_MARKER_BONUS,
            Self::LongBody => LONG_BODY_BONUS,
        }
    }
}

pub fn has_code_block(body: &str) -> bool {
    CODE_BLOCK.is_match(body)
}

/// A heading line inside the body. The section's own title is not checked;
/// titles are already scored by [`title_multipliers`].
pub fn has_definitions_heading(body: &str) -> bool {
    DEFINITIONS_HEADING.is_match(body)
}

pub fn has_importance_marker(body: &str) -> bool {
    IMPORTANCE_MARKER.is_match(body)
}

/// Content bonuses that apply to `section`, in application order.
pub fn content_bonuses(section: &Section) -> Vec<ContentBonus> {
    let mut bonuses = Vec::new();
    if has_code_block(&section.body) {
        bonuses.push(ContentBonus::CodeBlock);
    }
    if has_definitions_heading(&section.body) {
        bonuses.push(ContentBonus::DefinitionsHeading);
    }
    if has_importance_marker(&section.body) {
        bonuses.push(ContentBonus::ImportanceMarker);
    }
    if section.char_len() > LONG_BODY_THRESHOLD_CHARS {
        bonuses.push(ContentBonus::LongBody);
    }
    bonuses
}

/// First position wins when a single-section document is both first and last.
pub fn position_bonus(position: usize, section_count: usize) -> f64 {
    if position == 0 {
        FIRST_POSITION_BONUS
    } else if section_count > 0 && position == section_count - 1 {
        LAST_POSITION_BONUS
    } else {
        0.0
    }
}

/// Every factor that went into one weight. Replaying it reproduces the
/// weight bit for bit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeightBreakdown {
    pub base_weight: f64,
    pub type_multiplier: f64,
    pub matched_title_keyword: Option<String>,
    pub content_bonuses: Vec<ContentBonus>,
    pub position_bonus: f64,
    pub query_bonus: f64,
    pub matched_query_term: Option<String>,
    pub weight: f64,
}

impl WeightBreakdown {
    /// Breakdown for something with no structure of its own (e.g. a
    /// conversation turn): base weight plus an optional query match.
    pub fn flat(base_weight: f64, text: &str, query: Option<&QueryTerms>) -> Self {
        let matched_query_term = query.and_then(|q| q.first_match(text)).map(str::to_string);
        let mut breakdown = Self {
            base_weight: base_weight.max(0.0),
            type_multiplier: 1.0,
            matched_title_keyword: None,
            content_bonuses: Vec::new(),
            position_bonus: 0.0,
            query_bonus: if matched_query_term.is_some() {
                QUERY_MATCH_BONUS
            } else {
                0.0
            },
            matched_query_term,
            weight: 0.0,
        };
        breakdown.weight = breakdown.replay();
        breakdown
    }

    /// Recompute the weight from the recorded factors in the fixed order.
    pub fn replay(&self) -> f64 {
        let mut weight = self.base_weight;
        weight *= self.type_multiplier;
        for bonus in &self.content_bonuses {
            weight *= 1.0 + bonus.bonus();
        }
        weight *= 1.0 + self.position_bonus;
        weight *= 1.0 + self.query_bonus;
        weight
    }
}

/// Full breakdown for one section.
///
/// `section_count` is the number of sections in the owning document and
/// decides which position is last. A negative or NaN base weight is treated
/// as zero.
pub fn weight_breakdown(
    section: &Section,
    section_count: usize,
    document_type: DocumentType,
    query: Option<&QueryTerms>,
) -> WeightBreakdown {
    let (matched_title_keyword, type_multiplier) =
        match_title_keyword(&section.title, document_type)
            .map_or((None, 1.0), |(keyword, m)| (Some(keyword.to_string()), m));

    let matched_query_term = query
        .and_then(|q| q.first_match(&section.full_text()))
        .map(str::to_string);

    let mut breakdown = WeightBreakdown {
        base_weight: section.base_weight.max(0.0),
        type_multiplier,
        matched_title_keyword,
        content_bonuses: content_bonuses(section),
        position_bonus: position_bonus(section.position, section_count),
        query_bonus: if matched_query_term.is_some() {
            QUERY_MATCH_BONUS
        } else {
            0.0
        },
        matched_query_term,
        weight: 0.0,
    };
    breakdown.weight = breakdown.replay();

    debug!(
        title = %section.title,
        position = section.position,
        %document_type,
        weight = breakdown.weight,
        "computed section weight"
    );
    breakdown
}

/// Final (pre-decay) weight for one section.
pub fn compute_weight(
    section: &Section,
    section_count: usize,
    document_type: DocumentType,
    query: Option<&QueryTerms>,
) -> f64 {
    weight_breakdown(section, section_count, document_type, query).weight
}
