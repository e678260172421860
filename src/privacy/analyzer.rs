//! PII analyzer
//!
//! Owns everything a request needs: the pattern recognizers, the
//! statistical engine, the language detector chain, the post-validator and
//! the anonymization policy. Built once at startup and shared behind an
//! `Arc`; analysis itself is synchronous and lock-free.

use crate::config::GuardConfig;
use crate::error::Result;
use crate::language::{DetectorChain, LanguageDetection};
use serde::Serialize;

use super::anonymizer::{anonymize, AnonymizedText};
use super::engine::{BlankEngine, EngineStatus, StatisticalEngine};
use super::entity::Candidate;
use super::policy::{default_policy, AnonymizationPolicy};
use super::recognizer::EntityRecognizer;
use super::rules::build_default_recognizers;
use super::text::SourceText;
use super::validation::PostValidator;
use crate::language::Language;

/// Validated entities of one text
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub language: LanguageDetection,
    pub entities: Vec<Candidate>,
}

/// Anonymized text together with the entities it was rendered from
#[derive(Debug, Clone, Serialize)]
pub struct Anonymization {
    pub language: LanguageDetection,
    pub entities: Vec<Candidate>,
    pub anonymized: AnonymizedText,
}

/// Detection, validation and anonymization front end
pub struct PiiAnalyzer {
    recognizers: Vec<Box<dyn EntityRecognizer>>,
    engine: Box<dyn StatisticalEngine>,
    detectors: DetectorChain,
    validator: PostValidator,
    policy: AnonymizationPolicy,
    min_candidate_score: f64,
}

impl PiiAnalyzer {
    /// Build from configuration without a statistical model.
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        Self::with_engine(config, Box::new(BlankEngine::default()))
    }

    /// Build from configuration with the given statistical engine.
    pub fn with_engine(config: &GuardConfig, engine: Box<dyn StatisticalEngine>) -> Result<Self> {
        config.validate()?;

        let recognizers = build_default_recognizers(config.detection.enhancement())?;
        let detectors = DetectorChain::from_kinds(
            config.language.default_language,
            &config.language.detectors,
        );

        let status = engine.status();
        if status.fallback_used {
            tracing::warn!(
                "Statistical engine '{}' in fallback mode: {}",
                engine.name(),
                status.fallback_reason.as_deref().unwrap_or("unknown reason")
            );
        }
        tracing::info!(
            "PII analyzer ready: {} recognizers, engine={}, language detectors={:?}",
            recognizers.len(),
            engine.name(),
            detectors.names()
        );

        Ok(Self {
            recognizers,
            engine,
            detectors,
            validator: PostValidator::new(config.detection.validation_settings()),
            policy: default_policy().merged_with(&config.anonymization.policy),
            min_candidate_score: config.detection.min_candidate_score,
        })
    }

    /// Engine initialization / fallback status
    pub fn status(&self) -> EngineStatus {
        self.engine.status()
    }

    /// The configured anonymization policy
    pub fn policy(&self) -> &AnonymizationPolicy {
        &self.policy
    }

    pub fn validator(&self) -> &PostValidator {
        &self.validator
    }

    /// Raw candidates from the engine and every recognizer for `language`,
    /// before validation.
    pub fn candidates(&self, text: &str, language: Language) -> Vec<Candidate> {
        let source = SourceText::new(text);

        let mut candidates = self.engine.analyze(&source, language);
        for recognizer in &self.recognizers {
            candidates.extend(recognizer.analyze(&source, language));
        }

        let floor = self.min_candidate_score;
        candidates.retain(|c| c.score.map_or(true, |s| s >= floor));
        candidates
    }

    /// Detect and validate PII in `text`.
    ///
    /// `language` is the explicit request language; it must be `ru` or `en`.
    /// Without it the detector chain decides.
    pub fn analyze(&self, text: &str, language: Option<&str>) -> Result<Analysis> {
        let detection = self.detectors.resolve(text, language)?;
        let raw = self.candidates(text, detection.language);
        let entities = self.validator.validate(text, &raw);

        tracing::debug!(
            "Analyzed {} chars ({}): {} candidates, {} validated",
            text.chars().count(),
            detection.language,
            raw.len(),
            entities.len()
        );

        Ok(Analysis {
            language: detection,
            entities,
        })
    }

    /// Analyze and render `text` with the configured policy, merged with
    /// `overrides` when given.
    pub fn anonymize(
        &self,
        text: &str,
        language: Option<&str>,
        overrides: Option<&AnonymizationPolicy>,
    ) -> Result<Anonymization> {
        let analysis = self.analyze(text, language)?;
        let merged;
        let policy = match overrides {
            Some(overrides) => {
                merged = self.policy.merged_with(overrides);
                &merged
            }
            None => &self.policy,
        };

        let anonymized = anonymize(text, &analysis.entities, policy);
        Ok(Anonymization {
            language: analysis.language,
            entities: analysis.entities,
            anonymized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::language::DetectionMethod;
    use crate::privacy::entity::EntityType;
    use crate::privacy::policy::{Operator, PolicyBuilder};

    struct FixedEngine(Vec<Candidate>);

    impl StatisticalEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn status(&self) -> EngineStatus {
            EngineStatus::ready()
        }

        fn analyze(&self, _text: &SourceText<'_>, _language: Language) -> Vec<Candidate> {
            self.0.clone()
        }
    }

    fn analyzer() -> PiiAnalyzer {
        PiiAnalyzer::from_config(&GuardConfig::default()).unwrap()
    }

    fn types(entities: &[Candidate]) -> Vec<&str> {
        entities.iter().map(|c| c.entity_type.as_str()).collect()
    }

    #[test]
    fn test_analyze_russian_identifiers() {
        let text = "ИНН 7736050003, СНИЛС 112-233-445 95";
        let analysis = analyzer().analyze(text, Some("ru")).unwrap();
        assert_eq!(analysis.language.method, DetectionMethod::Explicit);
        assert_eq!(types(&analysis.entities), vec!["RU_INN", "RU_SNILS"]);
    }

    #[test]
    fn test_language_detected_when_absent() {
        let analysis = analyzer()
            .analyze("Мой ИНН 7736050003 и это всё", None)
            .unwrap();
        assert_eq!(analysis.language.language, Language::Ru);
        assert!(types(&analysis.entities).contains(&"RU_INN"));
    }

    #[test]
    fn test_russian_rules_skipped_for_english() {
        let analysis = analyzer().analyze("INN 7736050003", Some("en")).unwrap();
        assert!(!types(&analysis.entities).contains(&"RU_INN"));
    }

    #[test]
    fn test_unsupported_language() {
        let err = analyzer().analyze("hello", Some("de")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_engine_candidates_are_validated() {
        let text = "John Smith met Jane at DL A1234567";
        let engine = FixedEngine(vec![
            Candidate::new(EntityType::Person, 0, 10).with_score(0.85),
            Candidate::new(EntityType::Person, 15, 19).with_score(0.4),
            Candidate::new(EntityType::UsDriverLicense, 26, 34).with_score(0.9),
        ]);
        let analyzer =
            PiiAnalyzer::with_engine(&GuardConfig::default(), Box::new(engine)).unwrap();
        assert!(!analyzer.status().fallback_used);

        let analysis = analyzer.analyze(text, Some("en")).unwrap();
        assert_eq!(types(&analysis.entities), vec!["PERSON"]);
        assert_eq!((analysis.entities[0].start, analysis.entities[0].end), (0, 10));
    }

    #[test]
    fn test_min_candidate_score() {
        let mut config = GuardConfig::default();
        config.detection.min_candidate_score = 0.3;
        let analyzer = PiiAnalyzer::from_config(&config).unwrap();
        // Bare INN pattern scores 0.2 without context
        let analysis = analyzer.analyze("номер 7736050003", Some("ru")).unwrap();
        assert!(!types(&analysis.entities).contains(&"RU_INN"));
        // "ИНН" raises it above the floor
        let analysis = analyzer.analyze("ИНН 7736050003", Some("ru")).unwrap();
        assert!(types(&analysis.entities).contains(&"RU_INN"));
    }

    #[test]
    fn test_anonymize_with_overrides() {
        let text = "ИНН 7736050003";
        let analyzer = analyzer();

        let out = analyzer.anonymize(text, Some("ru"), None).unwrap();
        assert_eq!(out.anonymized.text, "ИНН **********");

        let overrides = PolicyBuilder::new()
            .operator(EntityType::RuInn, Operator::replace("<ИНН>"))
            .build();
        let out = analyzer.anonymize(text, Some("ru"), Some(&overrides)).unwrap();
        assert_eq!(out.anonymized.text, "ИНН <ИНН>");
        assert_eq!(out.entities.len(), 1);
    }

    const RU_PAYLOAD: &str = "Иванов Иван Иванович из Москвы (ООО \"Контур\"), паспорт 4012 345678, \
        СНИЛС 123-456-789 01, ИНН 7736050003, ОГРН 1027700132195, ОГРНИП 304500116000157, \
        БИК 044525225, р/с 40702810900000001234, к/с 30101810400000000225, \
        телефон +7 (912) 000-00-00 и +90 531 123 4567, email ivan.ivanov@example.com, \
        карта 4111 1111 1111 1111.";

    const EN_PAYLOAD: &str = "John Doe from London (Contoso Ltd), passport number 4012 345678, \
        email john.doe@example.com, phones +7 (912) 000-00-00 and +44 20 7946 0958, \
        credit card 4111 1111 1111 1111.";

    fn span_of(text: &str, needle: &str) -> (usize, usize) {
        let byte = text.find(needle).unwrap();
        let start = text[..byte].chars().count();
        (start, start + needle.chars().count())
    }

    fn texts_of(text: &str, entities: &[Candidate], entity_type: EntityType) -> Vec<String> {
        let source = SourceText::new(text);
        entities
            .iter()
            .filter(|c| c.entity_type == entity_type)
            .map(|c| source.slice(c.start, c.end).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_russian_payload() {
        let analysis = analyzer().analyze(RU_PAYLOAD, Some("ru")).unwrap();
        let found = types(&analysis.entities);
        for expected in [
            "PERSON",
            "RU_PASSPORT",
            "RU_INN",
            "RU_OGRN",
            "RU_OGRNIP",
            "RU_BIK",
            "RU_KS",
            "PHONE_NUMBER_RU",
            "PHONE_NUMBER",
            "EMAIL_ADDRESS",
            "CREDIT_CARD",
        ] {
            assert!(found.contains(&expected), "missing {expected}");
        }

        let entities = &analysis.entities;
        assert_eq!(
            texts_of(RU_PAYLOAD, entities, EntityType::RuPassport),
            vec!["4012 345678"]
        );
        assert_eq!(texts_of(RU_PAYLOAD, entities, EntityType::RuInn), vec!["7736050003"]);
        // Bad SNILS checksum; the settlement account does not match the BIK
        assert!(!found.contains(&"RU_SNILS"));
        assert!(!found.contains(&"RU_RS"));
        assert!(texts_of(RU_PAYLOAD, entities, EntityType::Phone)
            .contains(&"+90 531 123 4567".to_string()));
    }

    #[test]
    fn test_english_payload_with_statistical_engine() {
        let text = EN_PAYLOAD;
        let (dl_start, dl_end) = span_of(text, "4012 345678");
        let (url_start, url_end) = span_of(text, "example.com");
        let (person_start, person_end) = span_of(text, "John Doe");
        let engine = FixedEngine(vec![
            Candidate::new(EntityType::Person, person_start, person_end).with_score(0.85),
            Candidate::new(EntityType::UsDriverLicense, dl_start, dl_end).with_score(0.6),
            Candidate::new(EntityType::Url, url_start, url_end).with_score(0.5),
        ]);
        let analyzer =
            PiiAnalyzer::with_engine(&GuardConfig::default(), Box::new(engine)).unwrap();

        let analysis = analyzer.analyze(text, None).unwrap();
        assert_eq!(analysis.language.language, Language::En);

        let found = types(&analysis.entities);
        assert!(!found.contains(&"US_DRIVER_LICENSE"));
        assert!(!found.contains(&"URL"));
        assert!(!found.contains(&"RU_INN"));

        let entities = &analysis.entities;
        assert_eq!(texts_of(text, entities, EntityType::Person), vec!["John Doe"]);
        assert_eq!(
            texts_of(text, entities, EntityType::RuPassport),
            vec!["4012 345678"]
        );
        let phones = texts_of(text, entities, EntityType::Phone);
        assert!(!phones.contains(&"4012 345678".to_string()));
        assert!(phones.contains(&"+7 (912) 000-00-00".to_string()));
        assert!(phones.contains(&"+44 20 7946 0958".to_string()));
        assert_eq!(
            texts_of(text, entities, EntityType::Email),
            vec!["john.doe@example.com"]
        );

        let starts: Vec<_> = entities.iter().map(|c| (c.start, c.end)).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_anonymize_payloads() {
        let analyzer = analyzer();

        let out = analyzer
            .anonymize("ИНН 500100732259, паспорт 4012 345678", Some("ru"), None)
            .unwrap();
        assert!(!out.anonymized.text.contains("500100732259"));
        assert!(!out.anonymized.text.contains("4012 345678"));
        assert!(!out.anonymized.text.contains("345678"));

        let out = analyzer.anonymize(EN_PAYLOAD, Some("en"), None).unwrap();
        let text = &out.anonymized.text;
        assert!(!text.contains("+44 20 7946 0958"));
        assert!(!text.contains("7946"));
        assert!(!text.contains("912"));
        assert!(!text.contains("john.doe@example.com"));
        assert!(text.starts_with("John Doe from London"));
    }

    #[test]
    fn test_blank_engine_status() {
        let status = analyzer().status();
        assert!(status.initialized);
        assert!(status.fallback_used);
    }
}
