//! Heuristic conflict detection between official and informal sources.
//!
//! Two candidates are flagged when all of these hold:
//!
//! - one is `official` and the other `informal` (unknown authority is never flagged),
//! - they share at least [`CONFLICT_MIN_SHARED_TERMS`] significant terms and
//!   the overlap coefficient reaches [`CONFLICT_MIN_OVERLAP`],
//! - at least one of them has a contradiction marker ("deprecated",
//!   "no longer", ...) within [`CONFLICT_MARKER_WINDOW`] tokens of a shared term.
//!
//! False negatives are expected. Flags are advisory and never change content.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::assemble::Candidate;
use crate::constants::{CONFLICT_MARKER_WINDOW, CONFLICT_MIN_OVERLAP, CONFLICT_MIN_SHARED_TERMS};
use crate::document::{CandidateId, SourceAuthority};
use crate::tokenizer::{significant_terms, tokenize};

const CONTRADICTION_MARKERS: &[&[&str]] = &[
    &["deprecated"],
    &["no", "longer"],
    &["incorrect"],
    &["outdated"],
    &["obsolete"],
    &["superseded"],
    &["not", "supported"],
    &["unsupported"],
    &["removed"],
    &["wrong"],
    &["broken"],
    &["doesn't", "work"],
    &["does", "not", "work"],
];

/// Advisory annotation: two candidates likely contradict each other.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConflictFlag {
    pub left: CandidateId,
    pub right: CandidateId,
    pub left_authority: SourceAuthority,
    pub right_authority: SourceAuthority,
    /// Shared significant terms, sorted.
    pub shared_terms: Vec<String>,
    /// The contradiction marker that triggered the flag.
    pub marker: String,
    pub description: String,
}

impl ConflictFlag {
    /// The side with the higher-ranked authority.
    pub fn authoritative(&self) -> &CandidateId {
        if self.left_authority.rank() >= self.right_authority.rank() {
            &self.left
        } else {
            &self.right
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(left: CandidateId, right: CandidateId) -> Self {
        Self {
            left,
            right,
            left_authority: SourceAuthority::Official,
            right_authority: SourceAuthority::Informal,
            shared_terms: Vec::new(),
            marker: "deprecated".to_string(),
            description: String::new(),
        }
    }
}

struct Profile<'a> {
    candidate: &'a Candidate,
    tokens: Vec<String>,
    terms: BTreeSet<String>,
}

fn is_marker_word(term: &str) -> bool {
    CONTRADICTION_MARKERS
        .iter()
        .any(|marker| marker.contains(&term))
}

fn profile(candidate: &Candidate) -> Profile<'_> {
    let terms = significant_terms(&candidate.text)
        .into_iter()
        .filter(|t| !is_marker_word(t))
        .collect();
    Profile {
        candidate,
        tokens: tokenize(&candidate.text),
        terms,
    }
}

/// First contradiction marker (in text order) with a shared term nearby.
/// Returns the marker phrase and the nearby term.
fn marker_near_shared_term(
    tokens: &[String],
    shared: &BTreeSet<String>,
) -> Option<(String, String)> {
    for start in 0..tokens.len() {
        for marker in CONTRADICTION_MARKERS {
            let end = start + marker.len();
            if end > tokens.len()
                || !tokens[start..end]
                    .iter()
                    .zip(marker.iter())
                    .all(|(t, m)| t == m)
            {
                continue;
            }
            let lo = start.saturating_sub(CONFLICT_MARKER_WINDOW);
            let hi = (end - 1 + CONFLICT_MARKER_WINDOW).min(tokens.len() - 1);
            if let Some(term) = tokens[lo..=hi].iter().find(|t| shared.contains(*t)) {
                return Some((marker.join(" "), term.clone()));
            }
        }
    }
    None
}

fn check_pair(left: &Profile<'_>, right: &Profile<'_>) -> Option<ConflictFlag> {
    let (la, ra) = (left.candidate.authority, right.candidate.authority);
    if la == ra || la == SourceAuthority::Unknown || ra == SourceAuthority::Unknown {
        return None;
    }

    let shared: BTreeSet<String> = left.terms.intersection(&right.terms).cloned().collect();
    let smaller = left.terms.len().min(right.terms.len());
    if shared.len() < CONFLICT_MIN_SHARED_TERMS
        || (shared.len() as f64 / smaller as f64) < CONFLICT_MIN_OVERLAP
    {
        return None;
    }

    let (marked, other, (marker, term)) =
        if let Some(hit) = marker_near_shared_term(&left.tokens, &shared) {
            (left, right, hit)
        } else {
            (right, left, marker_near_shared_term(&right.tokens, &shared)?)
        };

    let description = format!(
        "{} ({}) says \"{marker}\" about \"{term}\"; {} ({}) covers the same topic",
        marked.candidate.id,
        marked.candidate.authority.as_str(),
        other.candidate.id,
        other.candidate.authority.as_str(),
    );

    Some(ConflictFlag {
        left: left.candidate.id.clone(),
        right: right.candidate.id.clone(),
        left_authority: la,
        right_authority: ra,
        shared_terms: shared.into_iter().collect(),
        marker,
        description,
    })
}

/// Flag likely-contradictory pairs. Pairs are reported in input order
/// (`left` always precedes `right`).
pub fn find_conflicts(candidates: &[Candidate]) -> Vec<ConflictFlag> {
    let profiles: Vec<Profile<'_>> = candidates
        .iter()
        .filter(|c| c.authority != SourceAuthority::Unknown)
        .map(profile)
        .collect();

    let mut flags = Vec::new();
    for (i, left) in profiles.iter().enumerate() {
        for right in &profiles[i + 1..] {
            if let Some(flag) = check_pair(left, right) {
                debug!(left = %flag.left, right = %flag.right, marker = %flag.marker, "conflict flagged");
                flags.push(flag);
            }
        }
    }
    flags
}
