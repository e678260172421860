//! Candidate generation
//!
//! Defines the [`EntityRecognizer`] seam shared by pattern rules and the
//! statistical engine, and the regex-based [`PatternRecognizer`].
//!
//! Pattern recognizers are deliberately weak: their base scores are low and
//! only context keywords raise them. Checksums and disambiguation happen
//! later, in the post-validation pipeline.

use crate::error::{Error, Result};
use crate::language::Language;
use regex::Regex;

use super::entity::{Candidate, EntityType, LanguageScope, Source};
use super::text::SourceText;

/// Produces candidate spans for a text.
pub trait EntityRecognizer: Send + Sync {
    /// Recognizer name (used in logs)
    fn name(&self) -> &str;

    /// Entity types this recognizer can emit
    fn supported_entities(&self) -> Vec<EntityType>;

    /// Whether the recognizer runs for `language`
    fn supports_language(&self, language: Language) -> bool;

    /// Detect candidates. Offsets are character offsets into `text`.
    fn analyze(&self, text: &SourceText<'_>, language: Language) -> Vec<Candidate>;
}

/// A single regex rule with its base confidence.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: String,
    pub pattern: String,
    pub score: f64,
    /// Reject matches touching another digit on either side
    pub digit_bounded: bool,
    /// Minimum number of separator characters inside the match
    pub min_separators: usize,
}

impl PatternRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            score,
            digit_bounded: false,
            min_separators: 0,
        }
    }

    /// Require that the match is not preceded or followed by a digit.
    pub fn digit_bounded(mut self) -> Self {
        self.digit_bounded = true;
        self
    }

    pub fn min_separators(mut self, count: usize) -> Self {
        self.min_separators = count;
        self
    }
}

/// Score boost applied when a context keyword precedes a match.
#[derive(Debug, Clone, Copy)]
pub struct ContextEnhancement {
    /// Added to the base score
    pub boost: f64,
    /// Floor for a boosted score
    pub min_score: f64,
    /// How many preceding words are searched
    pub prefix_words: usize,
}

impl Default for ContextEnhancement {
    fn default() -> Self {
        Self {
            boost: 0.35,
            min_score: 0.4,
            prefix_words: 5,
        }
    }
}

struct CompiledRule {
    name: String,
    regex: Regex,
    score: f64,
    digit_bounded: bool,
    min_separators: usize,
}

/// Regex recognizer for one entity type.
pub struct PatternRecognizer {
    name: String,
    entity_type: EntityType,
    rules: Vec<CompiledRule>,
    context: Vec<String>,
    languages: LanguageScope,
    enhancement: ContextEnhancement,
}

impl PatternRecognizer {
    /// Compile `rules` for `entity_type`. Language applicability defaults to
    /// the registry's scope for the type.
    pub fn new(entity_type: EntityType, rules: Vec<PatternRule>, context: &[&str]) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).map_err(|source| Error::Pattern {
                    rule: rule.name.clone(),
                    source,
                })?;
                Ok(CompiledRule {
                    name: rule.name,
                    regex,
                    score: rule.score,
                    digit_bounded: rule.digit_bounded,
                    min_separators: rule.min_separators,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: format!("{}_recognizer", entity_type.as_str().to_lowercase()),
            languages: entity_type.languages(),
            entity_type,
            rules,
            context: context.iter().map(|k| k.to_lowercase()).collect(),
            enhancement: ContextEnhancement::default(),
        })
    }

    pub fn with_languages(mut self, languages: LanguageScope) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_enhancement(mut self, enhancement: ContextEnhancement) -> Self {
        self.enhancement = enhancement;
        self
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Byte ranges of all matches of `rule`, with digit boundaries and
    /// separator counts enforced.
    fn find_matches(rule: &CompiledRule, text: &str) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let Some(m) = rule.regex.find_at(text, pos) else {
                break;
            };

            if rule.digit_bounded && touches_digit(text, m.start(), m.end()) {
                // Retry one character further so a shorter alignment inside
                // the same run can still be found.
                pos = next_char_boundary(text, m.start());
                continue;
            }

            if separator_count(m.as_str()) >= rule.min_separators {
                out.push((m.start(), m.end()));
            }
            pos = if m.end() > m.start() {
                m.end()
            } else {
                next_char_boundary(text, m.end())
            };
        }

        out
    }

    fn has_context(&self, text: &SourceText<'_>, start: usize) -> bool {
        if self.context.is_empty() || self.enhancement.prefix_words == 0 {
            return false;
        }

        let before = text.slice(0, start).unwrap_or("");
        before
            .split_whitespace()
            .rev()
            .take(self.enhancement.prefix_words)
            .map(|word| {
                word.trim_matches(|c: char| !c.is_alphanumeric() && c != '/')
                    .to_lowercase()
            })
            .any(|word| {
                !word.is_empty() && self.context.iter().any(|kw| word.starts_with(kw.as_str()))
            })
    }

    fn enhanced_score(&self, base: f64, boosted: bool) -> f64 {
        if !boosted {
            return base;
        }
        (base + self.enhancement.boost)
            .max(self.enhancement.min_score)
            .min(1.0)
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_entities(&self) -> Vec<EntityType> {
        vec![self.entity_type.clone()]
    }

    fn supports_language(&self, language: Language) -> bool {
        self.languages.includes(language)
    }

    fn analyze(&self, text: &SourceText<'_>, language: Language) -> Vec<Candidate> {
        if !self.supports_language(language) {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for rule in &self.rules {
            for (byte_start, byte_end) in Self::find_matches(rule, text.as_str()) {
                let start = text.char_offset(byte_start);
                let end = text.char_offset(byte_end);
                let score = self.enhanced_score(rule.score, self.has_context(text, start));

                candidates.push(
                    Candidate::new(self.entity_type.clone(), start, end)
                        .with_score(score)
                        .with_source(Source::Pattern {
                            rule: rule.name.clone(),
                        }),
                );
            }
        }

        candidates
    }
}

fn touches_digit(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back().is_some_and(|c| c.is_ascii_digit());
    let after = text[end..].chars().next().is_some_and(|c| c.is_ascii_digit());
    before || after
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len() + 1)
}

fn separator_count(s: &str) -> usize {
    s.chars()
        .filter(|c| c.is_whitespace() || *c == '-')
        .count()
}
