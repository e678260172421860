//! Statistical NLP engine seam
//!
//! Named-entity models (PERSON, ORGANIZATION, LOCATION, ...) live outside
//! this crate. An adapter implements [`StatisticalEngine`]; when none is
//! configured the analyzer runs with [`BlankEngine`] and reports the
//! fallback through [`EngineStatus`].

use serde::{Deserialize, Serialize};

use crate::language::Language;

use super::entity::Candidate;
use super::text::SourceText;

/// Runtime status of the statistical engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub initialized: bool,
    pub fallback_used: bool,
    pub fallback_reason: Option<String>,
}

impl EngineStatus {
    pub fn ready() -> Self {
        Self {
            initialized: true,
            fallback_used: false,
            fallback_reason: None,
        }
    }

    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            initialized: true,
            fallback_used: true,
            fallback_reason: Some(reason.into()),
        }
    }
}

/// A statistical named-entity engine.
///
/// Candidates carry character offsets and, usually, a score. The engine may
/// emit tags outside the registry; they are kept as
/// [`EntityType::Other`](super::entity::EntityType::Other).
pub trait StatisticalEngine: Send + Sync {
    fn name(&self) -> &str;

    fn status(&self) -> EngineStatus;

    fn analyze(&self, text: &SourceText<'_>, language: Language) -> Vec<Candidate>;
}

/// Engine without a model. Emits nothing.
pub struct BlankEngine {
    reason: String,
}

impl BlankEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for BlankEngine {
    fn default() -> Self {
        Self::new("no statistical model configured")
    }
}

impl StatisticalEngine for BlankEngine {
    fn name(&self) -> &str {
        "blank"
    }

    fn status(&self) -> EngineStatus {
        EngineStatus::fallback(self.reason.clone())
    }

    fn analyze(&self, _text: &SourceText<'_>, _language: Language) -> Vec<Candidate> {
        Vec::new()
    }
}
