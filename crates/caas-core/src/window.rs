//! Fixed-capacity conversation window with strict FIFO eviction.
//!
//! Turns are never reordered, summarized or evicted by weight: once the
//! window is over capacity the oldest turns are dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EngineError, Result};

/// One conversational turn. `sequence` is assigned by the window on append.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sequence: u64,
    pub text: String,
    /// Unix seconds.
    pub timestamp: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Empty,
    Partial,
    Full,
}

/// Bounded, insertion-ordered buffer of turns for a single conversation.
///
/// There is no internal locking. A window shared between threads must sit
/// behind one lock per conversation (e.g. `Mutex<ConversationWindow>` keyed
/// by conversation id); unrelated conversations need no shared lock.
#[derive(Clone, Debug)]
pub struct ConversationWindow {
    capacity: usize,
    turns: VecDeque<ConversationTurn>,
    next_sequence: u64,
    evicted: u64,
}

impl ConversationWindow {
    /// Capacity is fixed for the lifetime of the window and must be positive.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::config("window capacity must be positive"));
        }
        Ok(Self {
            capacity,
            turns: VecDeque::with_capacity(capacity),
            next_sequence: 1,
            evicted: 0,
        })
    }

    /// Append a turn and evict the oldest turns beyond capacity.
    /// Returns the sequence number assigned to the new turn.
    pub fn append(&mut self, text: &str, timestamp: u64) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.turns.push_back(ConversationTurn {
            sequence,
            text: text.to_string(),
            timestamp,
        });

        while self.turns.len() > self.capacity {
            if let Some(old) = self.turns.pop_front() {
                self.evicted += 1;
                trace!(sequence = old.sequence, "evicted oldest turn");
            }
        }
        sequence
    }

    /// Current turns, oldest first. Does not modify the window.
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn state(&self) -> WindowState {
        match self.turns.len() {
            0 => WindowState::Empty,
            n if n < self.capacity => WindowState::Partial,
            _ => WindowState::Full,
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of turns evicted since construction.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
