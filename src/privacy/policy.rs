//! Anonymization policy
//!
//! A policy maps entity tags to the [`Operator`] used to render them. The
//! `"default"` entry covers every tag without its own entry. Requests may
//! send a partial policy that is merged over the configured one.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::EntityType;

/// Key of the fallback entry
pub const DEFAULT_KEY: &str = "default";

const DEFAULT_REPLACEMENT: &str = "[REDACTED]";

/// How a detected span is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operator {
    /// Substitute a fixed value; `<ENTITY_TYPE>` when none is given
    Replace {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_value: Option<String>,
    },
    /// Overwrite up to `chars_to_mask` characters
    Mask {
        #[serde(default = "default_masking_char")]
        masking_char: char,
        #[serde(default = "default_chars_to_mask")]
        chars_to_mask: usize,
        #[serde(default)]
        from_end: bool,
    },
    /// Remove the span
    Redact,
    /// SHA-256 of the span, lowercase hex
    Hash,
    /// Leave the span as is
    Keep,
}

fn default_masking_char() -> char {
    '*'
}

fn default_chars_to_mask() -> usize {
    100
}

impl Operator {
    pub fn replace(value: impl Into<String>) -> Self {
        Self::Replace {
            new_value: Some(value.into()),
        }
    }

    /// Mask the whole span (up to 100 characters) from the start.
    pub fn mask_all() -> Self {
        Self::Mask {
            masking_char: default_masking_char(),
            chars_to_mask: default_chars_to_mask(),
            from_end: false,
        }
    }

    /// Operator name as used in policies
    pub fn name(&self) -> &'static str {
        match self {
            Self::Replace { .. } => "replace",
            Self::Mask { .. } => "mask",
            Self::Redact => "redact",
            Self::Hash => "hash",
            Self::Keep => "keep",
        }
    }
}

static FALLBACK_OPERATOR: Operator = Operator::Replace { new_value: None };

/// Tag → operator map with a `"default"` fallback.
///
/// Keys are normalized to canonical tag names, so `EMAIL` and
/// `EMAIL_ADDRESS` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Operator>", into = "BTreeMap<String, Operator>")]
pub struct AnonymizationPolicy {
    operators: BTreeMap<String, Operator>,
}

impl From<BTreeMap<String, Operator>> for AnonymizationPolicy {
    fn from(entries: BTreeMap<String, Operator>) -> Self {
        let operators = entries
            .into_iter()
            .map(|(key, op)| (normalize_key(&key), op))
            .collect();
        Self { operators }
    }
}

impl From<AnonymizationPolicy> for BTreeMap<String, Operator> {
    fn from(policy: AnonymizationPolicy) -> Self {
        policy.operators
    }
}

fn normalize_key(key: &str) -> String {
    if key.trim().eq_ignore_ascii_case(DEFAULT_KEY) {
        DEFAULT_KEY.to_string()
    } else {
        EntityType::from(key).to_string()
    }
}

impl AnonymizationPolicy {
    /// Parse a policy from a JSON object of `{tag: {type, ...}}` entries.
    ///
    /// Every entry must name its operator in a `type` field.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let entries = value
            .as_object()
            .ok_or_else(|| Error::Policy("policy must be an object".to_string()))?;

        let mut operators = BTreeMap::new();
        for (key, entry) in entries {
            if entry.get("type").is_none() {
                return Err(Error::Policy(format!(
                    "Policy entry '{}' must define a 'type'",
                    key
                )));
            }
            let op: Operator = serde_json::from_value(entry.clone()).map_err(|e| {
                Error::Policy(format!("Invalid policy entry '{}': {}", key, e))
            })?;
            operators.insert(normalize_key(key), op);
        }

        Ok(Self { operators })
    }

    /// Operator for `entity_type`, falling back to the `"default"` entry and
    /// then to a `<ENTITY_TYPE>` replacement.
    pub fn operator_for(&self, entity_type: &EntityType) -> &Operator {
        self.operators
            .get(entity_type.as_str())
            .or_else(|| self.operators.get(DEFAULT_KEY))
            .unwrap_or(&FALLBACK_OPERATOR)
    }

    /// Entries of `overrides` replace entries of `self`.
    pub fn merged_with(&self, overrides: &AnonymizationPolicy) -> AnonymizationPolicy {
        let mut operators = self.operators.clone();
        operators.extend(
            overrides
                .operators
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Self { operators }
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operator)> {
        self.operators.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Builder for anonymization policies
pub struct PolicyBuilder {
    policy: AnonymizationPolicy,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self {
            policy: AnonymizationPolicy::default(),
        }
    }

    /// Set the fallback operator
    pub fn default_operator(mut self, op: Operator) -> Self {
        self.policy
            .operators
            .insert(DEFAULT_KEY.to_string(), op);
        self
    }

    /// Set the operator for one entity type
    pub fn operator(mut self, entity_type: impl Into<EntityType>, op: Operator) -> Self {
        self.policy
            .operators
            .insert(entity_type.into().to_string(), op);
        self
    }

    pub fn build(self) -> AnonymizationPolicy {
        self.policy
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in policy: readable substitutes for names, organizations and
/// places, full masking for contacts, cards and every Russian identifier.
pub fn default_policy() -> AnonymizationPolicy {
    let mut builder = PolicyBuilder::new()
        .default_operator(Operator::replace(DEFAULT_REPLACEMENT))
        .operator(EntityType::Person, Operator::replace("Иван Иванов"))
        .operator(EntityType::Organization, Operator::replace("Компания"))
        .operator(EntityType::Location, Operator::replace("Адрес"))
        .operator(EntityType::Gpe, Operator::replace("Адрес"));

    for entity_type in [
        EntityType::Email,
        EntityType::Phone,
        EntityType::PhoneRu,
        EntityType::Card,
        EntityType::RuPassport,
        EntityType::RuSnils,
        EntityType::RuInn,
        EntityType::RuOgrn,
        EntityType::RuOgrnip,
        EntityType::RuBik,
        EntityType::RuRs,
        EntityType::RuKs,
    ] {
        builder = builder.operator(entity_type, Operator::mask_all());
    }

    builder.build()
}
