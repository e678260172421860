//! PII detection, validation and anonymization
//!
//! Pattern recognizers and a statistical engine propose candidate spans;
//! the post-validator keeps the ones that pass checksum, context and
//! disambiguation gates; the anonymizer renders the survivors with a policy.
//!
//! - [`checksum`]: identifier checksum validators
//! - [`entity`]: entity type registry and candidate spans
//! - [`recognizer`], [`rules`]: regex candidate generation
//! - [`engine`]: statistical engine seam
//! - [`validation`]: post-validation pipeline
//! - [`policy`], [`anonymizer`]: anonymization
//! - [`analyzer`]: the assembled front end
//! - [`handler`]: HTTP handlers

pub mod analyzer;
pub mod anonymizer;
pub mod checksum;
pub mod engine;
pub mod entity;
pub mod handler;
pub mod policy;
pub mod recognizer;
pub mod rules;
pub mod text;
pub mod validation;

pub use analyzer::{Analysis, Anonymization, PiiAnalyzer};
pub use anonymizer::{anonymize, AnonymizedItem, AnonymizedText};
pub use engine::{BlankEngine, EngineStatus, StatisticalEngine};
pub use entity::{Candidate, EntityGroup, EntityType, Gate, LanguageScope, Source};
pub use handler::{pii_router, PiiState};
pub use policy::{default_policy, AnonymizationPolicy, Operator, PolicyBuilder};
pub use recognizer::{ContextEnhancement, EntityRecognizer, PatternRecognizer, PatternRule};
pub use validation::{validate, PostValidator, Rejection, ValidationContext, ValidationSettings};
