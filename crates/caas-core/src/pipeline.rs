//! End-to-end assembly: detect → weigh → decay → conflicts → assemble.
//!
//! The caller supplies `now`, so the same inputs always produce the same
//! response. Every reported weight equals `breakdown.replay() * decay_factor`.

use serde::Serialize;
use tracing::{debug, info};

use crate::assemble::{Candidate, assemble, validate_budget};
use crate::config::EngineConfig;
use crate::conflict::{ConflictFlag, find_conflicts};
use crate::decay::HalfLife;
use crate::detect::TypeDetector;
use crate::document::{CandidateId, Document, DocumentType};
use crate::error::Result;
use crate::time::age_secs;
use crate::tokenizer::QueryTerms;
use crate::weight::{WeightBreakdown, weight_breakdown};
use crate::window::ConversationTurn;

/// Base weight for conversation turns.
const TURN_BASE_WEIGHT: f64 = 1.0;

/// One assembly request.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextRequest {
    pub query: Option<String>,
    pub max_tokens: i64,
    /// Unix seconds used to age documents and turns.
    pub now: u64,
}

impl ContextRequest {
    pub fn new(max_tokens: i64, now: u64) -> Self {
        Self {
            query: None,
            max_tokens,
            now,
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentReport {
    pub id: String,
    pub detected_type: DocumentType,
}

/// The weight actually applied to one candidate, with everything needed to
/// reproduce it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppliedWeight {
    pub id: CandidateId,
    pub title: String,
    pub breakdown: WeightBreakdown,
    pub age_secs: f64,
    pub decay_factor: f64,
    pub weight: f64,
}

impl AppliedWeight {
    fn new(
        id: CandidateId,
        title: &str,
        breakdown: WeightBreakdown,
        age: f64,
        half_life: HalfLife,
    ) -> Self {
        let decay_factor = half_life.factor(age);
        Self {
            id,
            title: title.to_string(),
            weight: breakdown.weight * decay_factor,
            breakdown,
            age_secs: age,
            decay_factor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContextResponse {
    pub documents: Vec<DocumentReport>,
    pub context: String,
    /// Section titles in output order. Turns are not listed.
    pub sections_used: Vec<String>,
    pub used_ids: Vec<CandidateId>,
    pub total_tokens: usize,
    pub token_budget: usize,
    /// One entry per candidate, sections first (document order) then turns.
    pub weights_applied: Vec<AppliedWeight>,
    pub conflicts: Vec<ConflictFlag>,
    pub excluded_count: usize,
}

/// Flat weight for a turn: base 1.0, query boost, then decay by age.
pub fn turn_weight(
    turn: &ConversationTurn,
    query: Option<&QueryTerms>,
    half_life: HalfLife,
    now: u64,
) -> f64 {
    let breakdown = WeightBreakdown::flat(TURN_BASE_WEIGHT, &turn.text, query);
    half_life.apply(breakdown.weight, age_secs(turn.timestamp, now))
}

/// Validated configuration, ready for repeated assembly calls.
#[derive(Debug, Clone)]
pub struct ContextEngine {
    detector: TypeDetector,
    half_life: HalfLife,
}

impl ContextEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: config.detector()?,
            half_life: config.half_life()?,
        })
    }

    pub fn detector(&self) -> &TypeDetector {
        &self.detector
    }

    pub fn half_life(&self) -> HalfLife {
        self.half_life
    }

    /// A supplied document type is trusted; otherwise it is detected.
    pub fn document_type(&self, document: &Document) -> DocumentType {
        document
            .document_type
            .unwrap_or_else(|| self.detector.detect(document))
    }

    pub fn build(
        &self,
        documents: &[Document],
        turns: &[ConversationTurn],
        request: &ContextRequest,
    ) -> Result<ContextResponse> {
        validate_budget(request.max_tokens)?;

        let query = request
            .query
            .as_deref()
            .map(QueryTerms::new)
            .filter(|q| !q.is_empty());
        let query = query.as_ref();

        let mut reports = Vec::with_capacity(documents.len());
        let mut candidates = Vec::new();
        let mut weights_applied = Vec::new();

        for document in documents {
            let document_type = self.document_type(document);
            reports.push(DocumentReport {
                id: document.id.clone(),
                detected_type: document_type,
            });

            let age = age_secs(document.updated_at, request.now);
            let section_count = document.sections.len();
            for section in &document.sections {
                let breakdown = weight_breakdown(section, section_count, document_type, query);
                let applied = AppliedWeight::new(
                    CandidateId::section(&document.id, section.position),
                    &section.title,
                    breakdown,
                    age,
                    self.half_life,
                );
                candidates.push(Candidate::from_section(&document.id, section, applied.weight));
                weights_applied.push(applied);
            }
        }
        let section_candidates = candidates.len();

        for (index, turn) in turns.iter().enumerate() {
            let breakdown = WeightBreakdown::flat(TURN_BASE_WEIGHT, &turn.text, query);
            let applied = AppliedWeight::new(
                CandidateId::turn(turn.sequence),
                &format!("turn {}", turn.sequence),
                breakdown,
                age_secs(turn.timestamp, request.now),
                self.half_life,
            );
            candidates.push(Candidate::from_turn(turn, index, applied.weight));
            weights_applied.push(applied);
        }

        let conflicts = find_conflicts(&candidates[..section_candidates]);
        debug!(
            candidates = candidates.len(),
            conflicts = conflicts.len(),
            "scored candidates"
        );

        let assembled = assemble(&candidates, request.max_tokens, &conflicts)?;

        let sections_used = assembled
            .entries()
            .iter()
            .filter(|e| e.id.is_section())
            .map(|e| e.title.clone())
            .collect();

        info!(
            documents = documents.len(),
            turns = turns.len(),
            used = assembled.entries().len(),
            total_tokens = assembled.total_tokens(),
            budget = assembled.token_budget(),
            "built context"
        );

        Ok(ContextResponse {
            documents: reports,
            context: assembled.context().to_string(),
            sections_used,
            used_ids: assembled.used_ids(),
            total_tokens: assembled.total_tokens(),
            token_budget: assembled.token_budget(),
            weights_applied,
            conflicts: assembled.conflicts().to_vec(),
            excluded_count: assembled.excluded_count(),
        })
    }
}

/// One-shot convenience over [`ContextEngine`].
pub fn build_context(
    documents: &[Document],
    turns: &[ConversationTurn],
    request: &ContextRequest,
    config: &EngineConfig,
) -> Result<ContextResponse> {
    ContextEngine::new(config)?.build(documents, turns, request)
}
