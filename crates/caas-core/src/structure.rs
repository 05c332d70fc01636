//! Structure analysis and content tiers.
//!
//! Tiers are reported for explainability only; they do not change weights.

use std::sync::LazyLock;

use regex::RegexSet;
use serde::Serialize;

use crate::detect::{Detection, TypeDetector};
use crate::document::{Document, Section};
use crate::weight::{
    has_code_block, has_definitions_heading, has_importance_marker, title_keyword_matcher,
};

/// Coarse importance tier of a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentTier {
    /// Headers, definitions, API contracts, declarations, abstracts.
    Tier1High,
    /// Body text and logic.
    Tier2Medium,
    /// Footnotes, comments, disclaimers.
    Tier3Low,
}

const TIER_1_TITLES: &[&str] = &[
    "definition",
    "glossary",
    "abstract",
    "summary",
    "overview",
    "api",
    "interface",
    "contract",
    "specification",
    "class",
];

const TIER_3_TITLES: &[&str] = &[
    "footnote",
    "comment",
    "disclaimer",
    "appendix",
    "changelog",
    "acknowledg*",
    "references",
    "note",
];

static TIER_1_MATCHER: LazyLock<RegexSet> =
    LazyLock::new(|| title_keyword_matcher(TIER_1_TITLES.iter().copied()));
static TIER_3_MATCHER: LazyLock<RegexSet> =
    LazyLock::new(|| title_keyword_matcher(TIER_3_TITLES.iter().copied()));

/// Low-value titles are checked first, so "API changelog" is tier 3.
pub fn classify_tier(section: &Section) -> ContentTier {
    if TIER_3_MATCHER.is_match(&section.title) {
        return ContentTier::Tier3Low;
    }
    if TIER_1_MATCHER.is_match(&section.title) {
        return ContentTier::Tier1High;
    }

    let body = section.body.trim_start().to_lowercase();
    if has_definitions_heading(&section.body) {
        ContentTier::Tier1High
    } else if body.starts_with("note:") || body.starts_with("disclaimer") {
        ContentTier::Tier3Low
    } else {
        ContentTier::Tier2Medium
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub tier_1_high: usize,
    pub tier_2_medium: usize,
    pub tier_3_low: usize,
}

/// Summary of a document's shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructureReport {
    pub document_id: String,
    pub detection: Detection,
    pub section_count: usize,
    pub total_chars: usize,
    pub average_chars: f64,
    pub longest_section: Option<String>,
    pub sections_with_code: usize,
    pub sections_with_importance_markers: usize,
    pub sections_with_definitions: usize,
    pub tiers: TierCounts,
}

pub fn analyze_structure(document: &Document, detector: &TypeDetector) -> StructureReport {
    let mut tiers = TierCounts::default();
    let mut total_chars = 0usize;
    let mut longest: Option<(&Section, usize)> = None;
    let mut sections_with_code = 0;
    let mut sections_with_importance_markers = 0;
    let mut sections_with_definitions = 0;

    for section in &document.sections {
        let len = section.char_len();
        total_chars += len;
        if longest.is_none_or(|(_, l)| len > l) {
            longest = Some((section, len));
        }
        if has_code_block(&section.body) {
            sections_with_code += 1;
        }
        if has_importance_marker(&section.body) {
            sections_with_importance_markers += 1;
        }
        if has_definitions_heading(&section.body) {
            sections_with_definitions += 1;
        }
        match classify_tier(section) {
            ContentTier::Tier1High => tiers.tier_1_high += 1,
            ContentTier::Tier2Medium => tiers.tier_2_medium += 1,
            ContentTier::Tier3Low => tiers.tier_3_low += 1,
        }
    }

    let section_count = document.sections.len();
    let average_chars = if section_count == 0 {
        0.0
    } else {
        total_chars as f64 / section_count as f64
    };

    StructureReport {
        document_id: document.id.clone(),
        detection: detector.detect_with_scores(document),
        section_count,
        total_chars,
        average_chars,
        longest_section: longest.map(|(s, _)| s.title.clone()),
        sections_with_code,
        sections_with_importance_markers,
        sections_with_definitions,
        tiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;

    #[test]
    fn test_tier_from_title() {
        assert_eq!(
            classify_tier(&Section::new("Definitions", "", 0)),
            ContentTier::Tier1High
        );
        assert_eq!(
            classify_tier(&Section::new("API Changelog", "", 0)),
            ContentTier::Tier3Low
        );
        assert_eq!(
            classify_tier(&Section::new("Payment", "Pay on time.", 0)),
            ContentTier::Tier2Medium
        );
    }

    #[test]
    fn test_tier_titles_match_whole_words() {
        for title in ["Capital contributions", "Classification", "Denotes", "Contractor duties"] {
            assert_eq!(
                classify_tier(&Section::new(title, "plain text", 1)),
                ContentTier::Tier2Medium,
                "{title}"
            );
        }
        assert_eq!(
            classify_tier(&Section::new("Acknowledgements", "", 1)),
            ContentTier::Tier3Low
        );
        assert_eq!(
            classify_tier(&Section::new("Release notes", "", 1)),
            ContentTier::Tier3Low
        );
    }

    #[test]
    fn test_tier_from_body() {
        assert_eq!(
            classify_tier(&Section::new("Part 1", "## Glossary\nTerm: meaning", 0)),
            ContentTier::Tier1High
        );
        assert_eq!(
            classify_tier(&Section::new("Part 2", "  Note: informal aside.", 0)),
            ContentTier::Tier3Low
        );
    }

    #[test]
    fn test_analyze_structure() {
        let mut doc = Document::new("c1", "Contract");
        doc.push_section("Definitions", "WHEREAS the parties agree.");
        doc.push_section("Termination", "Notice must be given in writing, thirty days ahead.");
        doc.push_section("Appendix", "```\nsample\n```");

        let report = analyze_structure(&doc, &TypeDetector::default());
        assert_eq!(report.section_count, 3);
        assert_eq!(report.detection.document_type, DocumentType::LegalContract);
        assert_eq!(report.longest_section.as_deref(), Some("Termination"));
        assert_eq!(report.sections_with_code, 1);
        assert_eq!(report.sections_with_importance_markers, 1);
        assert_eq!(report.tiers.tier_1_high, 1);
        assert_eq!(report.tiers.tier_2_medium, 1);
        assert_eq!(report.tiers.tier_3_low, 1);
    }

    #[test]
    fn test_analyze_empty_document() {
        let report = analyze_structure(&Document::new("e", ""), &TypeDetector::default());
        assert_eq!(report.section_count, 0);
        assert_eq!(report.average_chars, 0.0);
        assert_eq!(report.longest_section, None);
        assert_eq!(report.detection.document_type, DocumentType::Unknown);
    }
}
