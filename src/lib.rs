//! ru-pii-guard - PII detection and redaction for Russian and English text
//!
//! Combines weak regex recognizers and an optional statistical NER engine
//! with a post-validation pipeline that checks Russian identifiers (passport,
//! SNILS, INN, OGRN/OGRNIP, BIK, bank accounts) and bank cards by checksum
//! and context before anything is reported.
//!
//! ## Architecture
//!
//! ```text
//!   text + language
//!        │
//!        ├──► pattern recognizers ──┐
//!        │                          ├──► candidates ──► post-validator ──► entities
//!        └──► statistical engine ───┘                                        │
//!                                                                            ▼
//!                                                               anonymizer (policy)
//! ```
//!
//! ## Modules
//!
//! - [`privacy`]: recognizers, validation pipeline, anonymization
//! - [`language`]: language selection strategies
//! - [`api`]: HTTP application
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod error;
pub mod language;
pub mod privacy;

pub use config::GuardConfig;
pub use error::{Error, Result};
pub use privacy::PiiAnalyzer;
