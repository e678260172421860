//! ru-pii-guard configuration management
//!
//! Configuration is a TOML file. Every section and field has a default, so
//! an empty file (or no file) gives the stock analyzer.

use crate::error::{Error, Result};
use crate::language::{DetectorKind, Language};
use crate::privacy::entity::EntityType;
use crate::privacy::policy::{default_policy, AnonymizationPolicy};
use crate::privacy::recognizer::ContextEnhancement;
use crate::privacy::validation::ValidationSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Detection and validation tunables
    pub detection: DetectionConfig,

    /// Language selection
    pub language: LanguageConfig,

    /// Anonymization policy
    pub anonymization: AnonymizationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

/// Detection and validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum score for PERSON / ORGANIZATION / LOCATION / GPE
    pub score_threshold: f64,

    /// Passport keyword window before the span, in characters
    pub passport_window_before: usize,

    /// Passport keyword window after the span, in characters
    pub passport_window_after: usize,

    /// Phone keyword window on either side, in characters
    pub phone_window: usize,

    /// Sort validated results by position
    pub sort_results: bool,

    /// Entity types that are always dropped
    pub reject_types: Vec<String>,

    /// Candidates scoring below this are discarded before validation
    pub min_candidate_score: f64,

    /// Score added when a context keyword precedes a pattern match
    pub context_boost: f64,

    /// Number of preceding words searched for context keywords
    pub context_prefix_words: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let settings = ValidationSettings::default();
        let enhancement = ContextEnhancement::default();
        Self {
            score_threshold: settings.score_threshold,
            passport_window_before: settings.passport_window_before,
            passport_window_after: settings.passport_window_after,
            phone_window: settings.phone_window,
            sort_results: settings.sort_results,
            reject_types: settings
                .reject_types
                .iter()
                .map(|t| t.to_string())
                .collect(),
            min_candidate_score: 0.0,
            context_boost: enhancement.boost,
            context_prefix_words: enhancement.prefix_words,
        }
    }
}

impl DetectionConfig {
    /// Settings for the post-validation pipeline
    pub fn validation_settings(&self) -> ValidationSettings {
        ValidationSettings {
            score_threshold: self.score_threshold,
            passport_window_before: self.passport_window_before,
            passport_window_after: self.passport_window_after,
            phone_window: self.phone_window,
            sort_results: self.sort_results,
            reject_types: self
                .reject_types
                .iter()
                .map(|t| EntityType::from(t.as_str()))
                .collect(),
        }
    }

    /// Context enhancement for pattern recognizers
    pub fn enhancement(&self) -> ContextEnhancement {
        ContextEnhancement {
            boost: self.context_boost,
            prefix_words: self.context_prefix_words,
            ..ContextEnhancement::default()
        }
    }
}

/// Language selection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Use this language for every request without an explicit one
    pub default_language: Option<Language>,

    /// Detection strategies, in rank order
    pub detectors: Vec<DetectorKind>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default_language: None,
            detectors: vec![DetectorKind::Stopwords, DetectorKind::Script],
        }
    }
}

/// Anonymization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizationConfig {
    /// Tag → operator map with a `default` entry
    pub policy: AnonymizationPolicy,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
        }
    }
}

impl GuardConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        for (name, value) in [
            ("score_threshold", d.score_threshold),
            ("min_candidate_score", d.min_candidate_score),
            ("context_boost", d.context_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "detection.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::policy::Operator;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.detection.score_threshold, 0.55);
        assert_eq!(config.detection.reject_types, vec!["US_DRIVER_LICENSE"]);
        assert!(config.detection.sort_results);
        assert_eq!(config.language.default_language, None);
        assert_eq!(config.anonymization.policy, default_policy());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[detection]
score_threshold = 0.7
reject_types = ["US_DRIVER_LICENSE", "NRP"]

[language]
default_language = "ru"
detectors = ["script"]

[anonymization.policy.PERSON]
type = "hash"
"#
        )
        .unwrap();

        let config = GuardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.detection.score_threshold, 0.7);
        assert_eq!(config.detection.passport_window_before, 24);
        assert_eq!(config.language.default_language, Some(Language::Ru));
        assert_eq!(config.language.detectors, vec![DetectorKind::Script]);
        assert_eq!(
            config.anonymization.policy.operator_for(&EntityType::Person),
            &Operator::Hash
        );

        let settings = config.detection.validation_settings();
        assert_eq!(
            settings.reject_types,
            vec![EntityType::UsDriverLicense, EntityType::Other("NRP".into())]
        );
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[detection]\nscore_threshold = 1.5").unwrap();
        let err = GuardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(matches!(
            GuardConfig::from_file(file.path()),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(GuardConfig::load(Some(&path)), Err(Error::Io(_))));
        assert_eq!(GuardConfig::load(None).unwrap(), GuardConfig::default());
    }

    #[test]
    fn test_default_toml_round_trip() {
        let text = GuardConfig::default().to_toml().unwrap();
        let parsed: GuardConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, GuardConfig::default());
    }

    #[test]
    fn test_enhancement_from_config() {
        let detection = DetectionConfig {
            context_boost: 0.2,
            context_prefix_words: 3,
            ..Default::default()
        };
        let enhancement = detection.enhancement();
        assert_eq!(enhancement.boost, 0.2);
        assert_eq!(enhancement.prefix_words, 3);
        assert_eq!(enhancement.min_score, 0.4);
    }
}
