//! Language selection
//!
//! The analyzer only supports Russian and English. Selection is a ranked
//! chain of [`LanguageDetector`] strategies built from configuration: a
//! forced language, a stop-word frequency model, and the Cyrillic script
//! heuristic that always answers. An explicit per-request language bypasses
//! the chain and must be one of the supported codes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Self::Ru),
            "en" => Ok(Self::En),
            _ => Err(Error::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// How a language was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Given in the request
    Explicit,
    /// Fixed by configuration
    Forced,
    /// Stop-word frequency model
    Stopwords,
    /// Cyrillic script heuristic
    Script,
}

/// Result of a language detection attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    pub language: Language,
    pub method: DetectionMethod,
    pub confidence: Option<f64>,
}

/// A language detection strategy.
///
/// Returning `None` means "no opinion"; the chain moves on to the next
/// strategy.
pub trait LanguageDetector: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &str;

    fn detect(&self, text: &str) -> Option<LanguageDetection>;
}

/// Always answers with the configured language.
pub struct ForcedLanguage(pub Language);

impl LanguageDetector for ForcedLanguage {
    fn name(&self) -> &str {
        "forced"
    }

    fn detect(&self, _text: &str) -> Option<LanguageDetection> {
        Some(LanguageDetection {
            language: self.0,
            method: DetectionMethod::Forced,
            confidence: None,
        })
    }
}

const RU_STOPWORDS: &[&str] = &[
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
    "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "только", "ее",
    "мне", "было", "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "для", "мы", "это",
    "при", "или", "который", "выдан", "номер", "серия",
];

const EN_STOPWORDS: &[&str] = &[
    "the", "and", "a", "an", "of", "to", "in", "is", "it", "you", "that", "he", "was", "for",
    "on", "are", "with", "as", "i", "his", "they", "be", "at", "one", "have", "this", "from",
    "or", "by", "me", "my", "call", "number", "please", "your", "we", "our", "details",
];

/// Stop-word frequency model.
///
/// Counts hits against small Russian and English stop-word lists and
/// answers with the majority once at least `min_hits` words matched.
pub struct StopwordDetector {
    ru: HashSet<&'static str>,
    en: HashSet<&'static str>,
    min_hits: usize,
}

impl StopwordDetector {
    pub fn new(min_hits: usize) -> Self {
        Self {
            ru: RU_STOPWORDS.iter().copied().collect(),
            en: EN_STOPWORDS.iter().copied().collect(),
            min_hits: min_hits.max(1),
        }
    }
}

impl Default for StopwordDetector {
    fn default() -> Self {
        Self::new(2)
    }
}

impl LanguageDetector for StopwordDetector {
    fn name(&self) -> &str {
        "stopwords"
    }

    fn detect(&self, text: &str) -> Option<LanguageDetection> {
        let mut ru = 0usize;
        let mut en = 0usize;

        for word in text.split(|c: char| !c.is_alphabetic()) {
            if word.is_empty() {
                continue;
            }
            let word = word.to_lowercase();
            if self.ru.contains(word.as_str()) {
                ru += 1;
            } else if self.en.contains(word.as_str()) {
                en += 1;
            }
        }

        let total = ru + en;
        if total < self.min_hits || ru == en {
            return None;
        }

        let (language, hits) = if ru > en {
            (Language::Ru, ru)
        } else {
            (Language::En, en)
        };
        Some(LanguageDetection {
            language,
            method: DetectionMethod::Stopwords,
            confidence: Some(hits as f64 / total as f64),
        })
    }
}

/// Any Cyrillic letter means Russian, otherwise English.
pub struct ScriptHeuristic;

impl ScriptHeuristic {
    fn detect_language(text: &str) -> Language {
        let has_cyrillic = text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c));
        if has_cyrillic {
            Language::Ru
        } else {
            Language::En
        }
    }
}

impl LanguageDetector for ScriptHeuristic {
    fn name(&self) -> &str {
        "script"
    }

    fn detect(&self, text: &str) -> Option<LanguageDetection> {
        Some(LanguageDetection {
            language: Self::detect_language(text),
            method: DetectionMethod::Script,
            confidence: None,
        })
    }
}

/// Detector kinds selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Stopwords,
    Script,
}

/// Ranked fallback chain of detectors.
pub struct DetectorChain {
    detectors: Vec<Box<dyn LanguageDetector>>,
}

impl DetectorChain {
    pub fn new(detectors: Vec<Box<dyn LanguageDetector>>) -> Self {
        Self { detectors }
    }

    /// Build from configuration: the forced language (if any) first, then
    /// the listed detectors in order.
    pub fn from_kinds(forced: Option<Language>, kinds: &[DetectorKind]) -> Self {
        let mut detectors: Vec<Box<dyn LanguageDetector>> = Vec::new();
        if let Some(language) = forced {
            detectors.push(Box::new(ForcedLanguage(language)));
        }
        for kind in kinds {
            match kind {
                DetectorKind::Stopwords => detectors.push(Box::new(StopwordDetector::default())),
                DetectorKind::Script => detectors.push(Box::new(ScriptHeuristic)),
            }
        }
        Self::new(detectors)
    }

    /// Names of the configured strategies, in rank order.
    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Resolve the language for a request.
    ///
    /// An explicit language wins and is validated. Otherwise the first
    /// detector with an opinion decides; the script heuristic is the final
    /// fallback even if the chain does not list it.
    pub fn resolve(&self, text: &str, explicit: Option<&str>) -> Result<LanguageDetection> {
        if let Some(code) = explicit.filter(|c| !c.trim().is_empty()) {
            let language: Language = code.parse()?;
            tracing::debug!("Language forced by request: {}", language);
            return Ok(LanguageDetection {
                language,
                method: DetectionMethod::Explicit,
                confidence: None,
            });
        }

        for detector in &self.detectors {
            if let Some(detection) = detector.detect(text) {
                tracing::debug!(
                    "Language detected via {}: {} (confidence={:?})",
                    detector.name(),
                    detection.language,
                    detection.confidence
                );
                return Ok(detection);
            }
        }

        Ok(LanguageDetection {
            language: ScriptHeuristic::detect_language(text),
            method: DetectionMethod::Script,
            confidence: None,
        })
    }
}

impl Default for DetectorChain {
    fn default() -> Self {
        Self::from_kinds(None, &[DetectorKind::Stopwords, DetectorKind::Script])
    }
}
