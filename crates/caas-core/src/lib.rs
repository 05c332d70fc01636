//! Context weighting and assembly engine.
//!
//! Classifies documents, weights their sections from structure, content,
//! position and query relevance, decays weights by age, flags conflicts
//! between official and informal sources, and packs the highest-weighted
//! sections and conversation turns into a token budget.
//!
//! Zero I/O. Every operation is a deterministic function of its inputs; the
//! only stateful piece is [`ConversationWindow`], owned per conversation.

pub mod assemble;
pub mod config;
pub mod conflict;
pub mod constants;
pub mod decay;
pub mod detect;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod structure;
pub mod time;
pub mod tokenizer;
pub mod weight;
pub mod window;

pub use assemble::{AssembledContext, AssembledEntry, Candidate, assemble, validate_budget};
pub use config::EngineConfig;
pub use conflict::{ConflictFlag, find_conflicts};
pub use constants::CHARS_PER_TOKEN;
pub use decay::{HalfLife, decay};
pub use detect::{Detection, TypeDetector, TypeScore, detect_document_type};
pub use document::{CandidateId, Document, DocumentType, Section, SourceAuthority};
pub use error::{EngineError, Result};
pub use pipeline::{
    AppliedWeight, ContextEngine, ContextRequest, ContextResponse, DocumentReport, build_context,
    turn_weight,
};
pub use structure::{ContentTier, StructureReport, analyze_structure, classify_tier};
pub use tokenizer::{QueryTerms, estimate_tokens, tokenize};
pub use weight::{ContentBonus, WeightBreakdown, compute_weight, weight_breakdown};
pub use window::{ConversationTurn, ConversationWindow, WindowState};
