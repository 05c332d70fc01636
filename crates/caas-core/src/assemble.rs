//! Budget-constrained context assembly.
//!
//! Candidates are ranked by final weight (descending), ties broken by
//! position index (ascending) and then by input order. The ranked list is
//! scanned once: a candidate that fits the remaining budget is taken whole,
//! one that does not is skipped, and scanning continues so smaller,
//! lower-weight candidates can still use the leftover budget.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace};

use crate::conflict::ConflictFlag;
use crate::document::{CandidateId, Section, SourceAuthority};
use crate::error::{EngineError, Result};
use crate::tokenizer::estimate_tokens;
use crate::window::ConversationTurn;

/// A weighted piece of content competing for the token budget.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub title: String,
    /// Raw text used for conflict analysis.
    pub text: String,
    /// Exact text placed in the assembled context.
    pub rendered: String,
    pub position: usize,
    /// Final weight (structure, content, position, query and decay).
    pub weight: f64,
    /// Estimated token cost of `rendered`.
    pub tokens: usize,
    pub authority: SourceAuthority,
}

impl Candidate {
    /// NaN and negative weights become zero.
    pub fn new(
        id: CandidateId,
        title: &str,
        text: &str,
        rendered: String,
        position: usize,
        weight: f64,
        authority: SourceAuthority,
    ) -> Self {
        let weight = if weight > 0.0 { weight } else { 0.0 };
        Self {
            id,
            title: title.to_string(),
            text: text.to_string(),
            tokens: estimate_tokens(&rendered),
            rendered,
            position,
            weight,
            authority,
        }
    }

    /// Rendered as `## {title}\n{body}\n`.
    pub fn from_section(document_id: &str, section: &Section, weight: f64) -> Self {
        Self::new(
            CandidateId::section(document_id, section.position),
            &section.title,
            &section.full_text(),
            format!("## {}\n{}\n", section.title, section.body),
            section.position,
            weight,
            section.authority,
        )
    }

    /// Rendered as `[turn {sequence}] {text}\n`. `index` is the turn's place
    /// in the window snapshot, oldest first.
    pub fn from_turn(turn: &ConversationTurn, index: usize, weight: f64) -> Self {
        Self::new(
            CandidateId::turn(turn.sequence),
            &format!("turn {}", turn.sequence),
            &turn.text,
            format!("[turn {}] {}\n", turn.sequence, turn.text),
            index,
            weight,
            SourceAuthority::Unknown,
        )
    }
}

/// One candidate that made it into the assembled context.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssembledEntry {
    pub id: CandidateId,
    pub title: String,
    pub weight: f64,
    pub tokens: usize,
}

/// Result of one assembly call. Read-only once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssembledContext {
    entries: Vec<AssembledEntry>,
    context: String,
    total_tokens: usize,
    token_budget: usize,
    conflicts: Vec<ConflictFlag>,
    excluded_count: usize,
}

impl AssembledContext {
    /// Selected entries in output order.
    pub fn entries(&self) -> &[AssembledEntry] {
        &self.entries
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Conflicts whose both sides were selected.
    pub fn conflicts(&self) -> &[ConflictFlag] {
        &self.conflicts
    }

    /// Candidates skipped because they did not fit.
    pub fn excluded_count(&self) -> usize {
        self.excluded_count
    }

    pub fn used_ids(&self) -> Vec<CandidateId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate a caller-supplied token budget.
pub fn validate_budget(token_budget: i64) -> Result<usize> {
    if token_budget <= 0 {
        return Err(EngineError::InvalidBudget(token_budget));
    }
    Ok(usize::try_from(token_budget).unwrap_or(usize::MAX))
}

/// Select and order candidates into a context that fits `token_budget`.
///
/// Only a non-positive budget is an error. No candidates, or none that fit,
/// yields an empty context.
pub fn assemble(
    candidates: &[Candidate],
    token_budget: i64,
    conflicts: &[ConflictFlag],
) -> Result<AssembledContext> {
    let budget = validate_budget(token_budget)?;

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    // sort_by is stable: full ties keep input order.
    order.sort_by(|&a, &b| {
        let (a, b) = (&candidates[a], &candidates[b]);
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.position.cmp(&b.position))
    });

    let mut entries = Vec::new();
    let mut context = String::new();
    let mut total_tokens = 0usize;
    let mut excluded_count = 0usize;

    for idx in order {
        let candidate = &candidates[idx];
        if total_tokens + candidate.tokens > budget {
            trace!(
                id = %candidate.id,
                tokens = candidate.tokens,
                remaining = budget - total_tokens,
                "skipped candidate over budget"
            );
            excluded_count += 1;
            continue;
        }
        total_tokens += candidate.tokens;
        context.push_str(&candidate.rendered);
        entries.push(AssembledEntry {
            id: candidate.id.clone(),
            title: candidate.title.clone(),
            weight: candidate.weight,
            tokens: candidate.tokens,
        });
    }

    let selected: HashSet<&CandidateId> = entries.iter().map(|e| &e.id).collect();
    let conflicts: Vec<ConflictFlag> = conflicts
        .iter()
        .filter(|c| selected.contains(&c.left) && selected.contains(&c.right))
        .cloned()
        .collect();

    debug!(
        selected = entries.len(),
        excluded = excluded_count,
        total_tokens,
        budget,
        conflicts = conflicts.len(),
        "assembled context"
    );

    Ok(AssembledContext {
        entries,
        context,
        total_tokens,
        token_budget: budget,
        conflicts,
        excluded_count,
    })
}
