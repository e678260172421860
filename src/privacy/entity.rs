//! Entity type registry and candidate spans
//!
//! `EntityType` is the closed set of tags the analyzer understands. Each tag
//! carries its dispatch data: the checksum validator, the post-validation
//! gates that apply to it, its group and the languages its pattern rules run
//! for. Tags produced by an external engine that are not in the registry are
//! kept verbatim in [`EntityType::Other`].

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use super::checksum;

/// Entity type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Gpe,
    Email,
    Url,
    /// International / generic phone number
    Phone,
    /// Russian phone number (+7 / 8 prefixed)
    PhoneRu,
    /// Bank card PAN
    Card,
    RuPassport,
    RuSnils,
    RuInn,
    RuOgrn,
    RuOgrnip,
    RuBik,
    /// Settlement account (р/с)
    RuRs,
    /// Correspondent account (к/с)
    RuKs,
    /// Noisy class emitted by generic engines; never reported
    UsDriverLicense,
    /// Tag unknown to the registry
    Other(String),
}

/// Post-validation gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Drop defined scores below the configured threshold
    Confidence,
    /// Run the type's checksum validator on the span text
    Checksum,
    /// Ten digits plus a passport keyword nearby
    PassportContext,
    /// Account control sum against some BIK found in the text
    AccountBik,
    /// URL must not contain '@' or overlap an email
    UrlDisambiguation,
    /// International prefix, Russian trunk prefix or phone keyword nearby
    PhonePlausibility,
    /// Always drop
    FixedReject,
}

/// Coarse grouping of entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityGroup {
    /// Critical government identifiers
    GovernmentId,
    /// Bank identifiers, accounts and cards
    BankIdentifier,
    /// Names, organizations, locations, contacts
    GenericPii,
    /// Known-noisy or unknown classes
    Unsupported,
}

/// Languages a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageScope {
    Russian,
    English,
    Both,
}

impl LanguageScope {
    pub fn includes(self, language: Language) -> bool {
        matches!(
            (self, language),
            (Self::Both, _) | (Self::Russian, Language::Ru) | (Self::English, Language::En)
        )
    }
}

impl EntityType {
    /// Every registered tag, in registry order.
    pub const KNOWN: [EntityType; 18] = [
        Self::Person,
        Self::Organization,
        Self::Location,
        Self::Gpe,
        Self::Email,
        Self::Url,
        Self::Phone,
        Self::PhoneRu,
        Self::Card,
        Self::RuPassport,
        Self::RuSnils,
        Self::RuInn,
        Self::RuOgrn,
        Self::RuOgrnip,
        Self::RuBik,
        Self::RuRs,
        Self::RuKs,
        Self::UsDriverLicense,
    ];

    /// Canonical tag name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::Location => "LOCATION",
            Self::Gpe => "GPE",
            Self::Email => "EMAIL_ADDRESS",
            Self::Url => "URL",
            Self::Phone => "PHONE_NUMBER",
            Self::PhoneRu => "PHONE_NUMBER_RU",
            Self::Card => "CREDIT_CARD",
            Self::RuPassport => "RU_PASSPORT",
            Self::RuSnils => "RU_SNILS",
            Self::RuInn => "RU_INN",
            Self::RuOgrn => "RU_OGRN",
            Self::RuOgrnip => "RU_OGRNIP",
            Self::RuBik => "RU_BIK",
            Self::RuRs => "RU_RS",
            Self::RuKs => "RU_KS",
            Self::UsDriverLicense => "US_DRIVER_LICENSE",
            Self::Other(tag) => tag,
        }
    }

    /// Checksum validator for structured identifiers.
    pub fn checksum(&self) -> Option<fn(&str) -> bool> {
        match self {
            Self::RuSnils => Some(checksum::snils_checksum_ok),
            Self::RuInn => Some(checksum::inn_checksum_ok),
            Self::RuOgrn | Self::RuOgrnip => Some(checksum::ogrn_checksum_ok),
            Self::Card => Some(checksum::luhn_ok),
            Self::RuBik => Some(checksum::bik_ok),
            Self::Person
            | Self::Organization
            | Self::Location
            | Self::Gpe
            | Self::Email
            | Self::Url
            | Self::Phone
            | Self::PhoneRu
            | Self::RuPassport
            | Self::RuRs
            | Self::RuKs
            | Self::UsDriverLicense
            | Self::Other(_) => None,
        }
    }

    /// Gates applied to candidates of this type, in pipeline order.
    pub fn gates(&self) -> &'static [Gate] {
        match self {
            Self::Person | Self::Organization | Self::Location | Self::Gpe => &[Gate::Confidence],
            Self::RuSnils
            | Self::RuInn
            | Self::RuOgrn
            | Self::RuOgrnip
            | Self::Card
            | Self::RuBik => &[Gate::Checksum],
            Self::RuPassport => &[Gate::PassportContext],
            Self::RuRs | Self::RuKs => &[Gate::AccountBik],
            Self::Url => &[Gate::UrlDisambiguation],
            Self::Phone | Self::PhoneRu => &[Gate::PhonePlausibility],
            Self::UsDriverLicense => &[Gate::FixedReject],
            Self::Email | Self::Other(_) => &[],
        }
    }

    pub fn group(&self) -> EntityGroup {
        match self {
            Self::RuPassport | Self::RuSnils | Self::RuInn | Self::RuOgrn | Self::RuOgrnip => {
                EntityGroup::GovernmentId
            }
            Self::RuBik | Self::RuRs | Self::RuKs | Self::Card => EntityGroup::BankIdentifier,
            Self::Person
            | Self::Organization
            | Self::Location
            | Self::Gpe
            | Self::Email
            | Self::Url
            | Self::Phone
            | Self::PhoneRu => EntityGroup::GenericPii,
            Self::UsDriverLicense | Self::Other(_) => EntityGroup::Unsupported,
        }
    }

    /// Languages the built-in pattern rules for this type run for.
    pub fn languages(&self) -> LanguageScope {
        match self {
            Self::RuSnils
            | Self::RuInn
            | Self::RuOgrn
            | Self::RuOgrnip
            | Self::RuBik
            | Self::RuRs
            | Self::RuKs => LanguageScope::Russian,
            Self::UsDriverLicense => LanguageScope::English,
            Self::Person
            | Self::Organization
            | Self::Location
            | Self::Gpe
            | Self::Email
            | Self::Url
            | Self::Phone
            | Self::PhoneRu
            | Self::Card
            | Self::RuPassport
            | Self::Other(_) => LanguageScope::Both,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        let known = match tag.to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => Self::Person,
            "ORGANIZATION" | "ORG" => Self::Organization,
            "LOCATION" | "LOC" => Self::Location,
            "GPE" => Self::Gpe,
            "EMAIL_ADDRESS" | "EMAIL" => Self::Email,
            "URL" => Self::Url,
            "PHONE_NUMBER" | "PHONE" => Self::Phone,
            "PHONE_NUMBER_RU" | "PHONE_RU" => Self::PhoneRu,
            "CREDIT_CARD" | "CARD" => Self::Card,
            "RU_PASSPORT" => Self::RuPassport,
            "RU_SNILS" => Self::RuSnils,
            "RU_INN" => Self::RuInn,
            "RU_OGRN" => Self::RuOgrn,
            "RU_OGRNIP" => Self::RuOgrnip,
            "RU_BIK" => Self::RuBik,
            "RU_RS" => Self::RuRs,
            "RU_KS" => Self::RuKs,
            "US_DRIVER_LICENSE" => Self::UsDriverLicense,
            _ => Self::Other(tag.to_string()),
        };
        Ok(known)
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<String> for EntityType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<EntityType> for String {
    fn from(t: EntityType) -> Self {
        match t {
            EntityType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// Where a candidate came from. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// A pattern rule, by name
    Pattern { rule: String },
    /// The statistical NLP engine
    Statistical,
}

/// A detected, not yet verified occurrence of an entity.
///
/// `start` and `end` are half-open character offsets into the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub score: Option<f64>,
    pub source: Source,
}

impl Candidate {
    /// Candidate from the statistical engine without a score.
    pub fn new(entity_type: impl Into<EntityType>, start: usize, end: usize) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score: None,
            source: Source::Statistical,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Deduplication key.
    pub fn key(&self) -> (usize, usize, &EntityType) {
        (self.start, self.end, &self.entity_type)
    }

    /// Half-open interval overlap.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        !(self.end <= start || self.start >= end)
    }
}
