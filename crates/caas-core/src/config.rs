//! Per-use-case engine configuration.
//!
//! The engine never reads files or environment variables; callers hand it a
//! parsed [`EngineConfig`]. `half_life_days` and `window_capacity` are
//! required: different data classes (incident reports vs policy documents)
//! need different half-lives, so there is no default to fall back on.
//!
//! ```toml
//! half_life_days = 365.0
//! window_capacity = 20
//!
//! [document_type_rules]
//! tutorial = ["recipe", "walkthrough"]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decay::HalfLife;
use crate::detect::TypeDetector;
use crate::document::DocumentType;
use crate::error::{EngineError, Result};
use crate::window::ConversationWindow;

/// Top-level engine config, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Half-life for temporal decay, in days.
    pub half_life_days: f64,

    /// Conversation window capacity, in turns.
    pub window_capacity: usize,

    /// Trigger keywords per document type name. Listed types replace their
    /// built-in triggers; unlisted types keep them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub document_type_rules: BTreeMap<String, Vec<String>>,
}

impl EngineConfig {
    pub fn new(half_life_days: f64, window_capacity: usize) -> Self {
        Self {
            half_life_days,
            window_capacity,
            document_type_rules: BTreeMap::new(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EngineError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field without building anything long-lived.
    pub fn validate(&self) -> Result<()> {
        self.half_life()?;
        if self.window_capacity == 0 {
            return Err(EngineError::config("window_capacity must be positive"));
        }
        self.detector()?;
        Ok(())
    }

    /// Half-life in seconds.
    pub fn half_life(&self) -> Result<HalfLife> {
        HalfLife::from_days(self.half_life_days).map_err(|_| {
            EngineError::config(format!(
                "half_life_days must be a positive, finite number (got {})",
                self.half_life_days
            ))
        })
    }

    pub fn type_rules(&self) -> Result<BTreeMap<DocumentType, Vec<String>>> {
        self.document_type_rules
            .iter()
            .map(|(name, keywords)| Ok((name.parse::<DocumentType>()?, keywords.clone())))
            .collect()
    }

    pub fn detector(&self) -> Result<TypeDetector> {
        TypeDetector::with_rules(&self.type_rules()?)
    }

    /// An empty window sized by this config.
    pub fn new_window(&self) -> Result<ConversationWindow> {
        ConversationWindow::new(self.window_capacity)
    }
}
