//! Post-detection validation
//!
//! Candidate spans from pattern rules and the statistical engine are noisy:
//! a bare 10-digit run is an INN, a passport and a phone number at once.
//! [`PostValidator`] filters them down to spans that pass the checksum,
//! context and disambiguation gates registered for their type, then
//! deduplicates.
//!
//! The pipeline only ever removes candidates. It never fails: a span it
//! cannot interpret is dropped.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::checksum::{account_checksum_ok, bik_ok, find_all_biks};
use super::entity::{Candidate, EntityType, Gate};
use super::text::{digits_of, SourceText};

const PASSPORT_KEYWORDS: &[&str] = &["паспорт", "passport"];

const PHONE_KEYWORDS: &[&str] = &["phone", "tel", "mobile", "cell", "тел", "телефон", "моб"];

/// Tunables of the validation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Minimum score for PERSON / ORGANIZATION / LOCATION / GPE
    pub score_threshold: f64,
    /// Characters searched for a passport keyword before the span
    pub passport_window_before: usize,
    /// Characters searched for a passport keyword after the span
    pub passport_window_after: usize,
    /// Characters searched for a phone keyword on either side
    pub phone_window: usize,
    /// Sort the output by `(start, end)`
    pub sort_results: bool,
    /// Entity types that are always dropped
    pub reject_types: Vec<EntityType>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            score_threshold: 0.55,
            passport_window_before: 24,
            passport_window_after: 16,
            phone_window: 16,
            sort_results: true,
            reject_types: vec![EntityType::UsDriverLicense],
        }
    }
}

/// Why a candidate was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MalformedSpan,
    LowConfidence,
    ChecksumFailed,
    NotPassport,
    NoMatchingBik,
    UrlInEmail,
    ImplausiblePhone,
    Rejected,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MalformedSpan => "malformed span",
            Self::LowConfidence => "low confidence",
            Self::ChecksumFailed => "checksum failed",
            Self::NotPassport => "no passport context",
            Self::NoMatchingBik => "no matching BIK",
            Self::UrlInEmail => "url inside email",
            Self::ImplausiblePhone => "implausible phone",
            Self::Rejected => "rejected type",
        };
        f.write_str(s)
    }
}

/// Per-request data shared by all gates.
pub struct ValidationContext<'a> {
    text: SourceText<'a>,
    /// 9-digit tokens passing the BIK structural check
    biks: Vec<String>,
    /// Character ranges of EMAIL candidates
    email_ranges: Vec<(usize, usize)>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(text: &'a str, candidates: &[Candidate]) -> Self {
        let biks = find_all_biks(text)
            .into_iter()
            .filter(|b| bik_ok(b))
            .collect();
        let email_ranges = candidates
            .iter()
            .filter(|c| c.entity_type == EntityType::Email)
            .map(|c| (c.start, c.end))
            .collect();

        Self {
            text: SourceText::new(text),
            biks,
            email_ranges,
        }
    }

    pub fn text(&self) -> &SourceText<'a> {
        &self.text
    }

    pub fn biks(&self) -> &[String] {
        &self.biks
    }
}

/// The configured validation pipeline.
#[derive(Debug, Clone, Default)]
pub struct PostValidator {
    settings: ValidationSettings,
}

impl PostValidator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// Filter `candidates` found in `text`.
    ///
    /// Returns the surviving candidates, deduplicated by
    /// `(start, end, entity_type)` with the first occurrence kept.
    pub fn validate(&self, text: &str, candidates: &[Candidate]) -> Vec<Candidate> {
        let ctx = ValidationContext::new(text, candidates);

        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for candidate in candidates {
            if let Err(reason) = self.check(&ctx, candidate) {
                tracing::debug!(
                    "Dropped {} [{}..{}]: {}",
                    candidate.entity_type,
                    candidate.start,
                    candidate.end,
                    reason
                );
                continue;
            }
            if seen.insert(candidate.key()) {
                out.push(candidate.clone());
            }
        }

        if self.settings.sort_results {
            out.sort_by_key(|c| (c.start, c.end));
        }
        out
    }

    /// Run every gate that applies to `candidate`.
    pub fn check(&self, ctx: &ValidationContext<'_>, candidate: &Candidate) -> Result<(), Rejection> {
        let span = ctx
            .text
            .is_valid_span(candidate.start, candidate.end)
            .then(|| ctx.text.slice(candidate.start, candidate.end))
            .flatten()
            .ok_or(Rejection::MalformedSpan)?;

        for gate in candidate.entity_type.gates() {
            let passed = match gate {
                Gate::Confidence => self.confident(candidate),
                Gate::Checksum => candidate
                    .entity_type
                    .checksum()
                    .map_or(true, |validator| validator(span)),
                Gate::PassportContext => self.is_passport(ctx, candidate, span),
                Gate::AccountBik => has_matching_bik(ctx, candidate, span),
                Gate::UrlDisambiguation => !url_in_email(ctx, candidate, span),
                Gate::PhonePlausibility => self.is_plausible_phone(ctx, candidate, span),
                Gate::FixedReject => false,
            };
            if !passed {
                return Err(gate_rejection(*gate));
            }
        }

        if self.settings.reject_types.contains(&candidate.entity_type) {
            return Err(Rejection::Rejected);
        }

        Ok(())
    }

    fn confident(&self, candidate: &Candidate) -> bool {
        match candidate.score {
            Some(score) => !score.is_nan() && score >= self.settings.score_threshold,
            None => true,
        }
    }

    fn is_passport(&self, ctx: &ValidationContext<'_>, candidate: &Candidate, span: &str) -> bool {
        let digits = digits_of(span);
        if digits.len() != 10 || digits.bytes().all(|b| b == b'0') {
            return false;
        }

        let before = ctx
            .text
            .window_before(candidate.start, self.settings.passport_window_before)
            .to_lowercase();
        let after = ctx
            .text
            .window_after(candidate.end, self.settings.passport_window_after)
            .to_lowercase();

        PASSPORT_KEYWORDS
            .iter()
            .any(|kw| before.contains(kw) || after.contains(kw))
    }

    fn is_plausible_phone(
        &self,
        ctx: &ValidationContext<'_>,
        candidate: &Candidate,
        span: &str,
    ) -> bool {
        let trimmed = span.trim_start();
        if trimmed.starts_with('+') || trimmed.starts_with("00") {
            return true;
        }

        let digits = digits_of(span);
        if digits.len() == 11 && digits.starts_with('8') {
            return true;
        }

        let width = self.settings.phone_window;
        has_word(ctx.text.window_before(candidate.start, width), PHONE_KEYWORDS)
            || has_word(ctx.text.window_after(candidate.end, width), PHONE_KEYWORDS)
    }
}

fn gate_rejection(gate: Gate) -> Rejection {
    match gate {
        Gate::Confidence => Rejection::LowConfidence,
        Gate::Checksum => Rejection::ChecksumFailed,
        Gate::PassportContext => Rejection::NotPassport,
        Gate::AccountBik => Rejection::NoMatchingBik,
        Gate::UrlDisambiguation => Rejection::UrlInEmail,
        Gate::PhonePlausibility => Rejection::ImplausiblePhone,
        Gate::FixedReject => Rejection::Rejected,
    }
}

fn has_matching_bik(ctx: &ValidationContext<'_>, candidate: &Candidate, span: &str) -> bool {
    let is_corr = candidate.entity_type == EntityType::RuKs;
    ctx.biks
        .iter()
        .any(|bik| account_checksum_ok(span, bik, is_corr))
}

fn url_in_email(ctx: &ValidationContext<'_>, candidate: &Candidate, span: &str) -> bool {
    span.contains('@')
        || ctx
            .email_ranges
            .iter()
            .any(|&(start, end)| candidate.overlaps(start, end))
}

/// Whether `window` contains one of `keywords` as a whole word,
/// case-insensitively.
fn has_word(window: &str, keywords: &[&str]) -> bool {
    window
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| {
            let w = w.to_lowercase();
            keywords.contains(&w.as_str())
        })
}

/// Validate with default settings.
pub fn validate(text: &str, candidates: &[Candidate]) -> Vec<Candidate> {
    PostValidator::default().validate(text, candidates)
}
