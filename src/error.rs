//! ru-pii-guard error types
//!
//! The validation core never fails: malformed spans and unparseable
//! payloads are absorbed as rejected candidates. These errors belong to the
//! outer layers (configuration, language selection, policies, I/O).

use thiserror::Error;

/// ru-pii-guard error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Explicit language outside the supported set
    #[error("Unsupported language '{0}'. Only 'ru' or 'en' are allowed")]
    UnsupportedLanguage(String),

    /// Invalid recognizer pattern
    #[error("Invalid pattern for rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// Invalid anonymization policy
    #[error("Policy error: {0}")]
    Policy(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for ru-pii-guard operations
pub type Result<T> = std::result::Result<T, Error>;
