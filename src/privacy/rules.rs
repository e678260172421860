//! Built-in pattern rules
//!
//! Three rule sets: Russian critical identifiers (passport, full names,
//! SNILS, INN, OGRN, phones, email, cards), Russian bank identifiers (BIK and
//! accounts) and generic rules shared by both languages (international
//! phones). Base scores are intentionally low for bare digit runs; the
//! post-validation pipeline decides what survives.

use crate::error::Result;

use super::entity::{EntityType, LanguageScope};
use super::recognizer::{ContextEnhancement, EntityRecognizer, PatternRecognizer, PatternRule};

const SURNAME_SUFFIXES: &[&str] = &[
    "ов", "ова", "ев", "ева", "ёв", "ёва", "ин", "ина", "ын", "ына", "ский", "ская", "цкий",
    "цкая", "ской", "цкой", "кий", "кая", "ко", "енко", "ук", "юк", "чук", "щук", "нюк", "ян",
    "иан", "янц", "дзе", "швили", "ашвили",
];

const PATRONYMIC_SUFFIXES: &[&str] = &[
    "ович", "евич", "вич", "овна", "евна", "ична", "вна", "оглы", "кызы", "улы", "гулы", "уулу",
    "кизи", "ич",
];

/// Separator class used inside phone numbers.
const SEP: &str = r"[\s\x{00A0}-]";

fn alternation(words: &[&str]) -> String {
    format!("(?:{})", words.join("|"))
}

fn surname_pattern() -> String {
    format!(
        "[А-ЯЁ][а-яё]+?(?:-[А-ЯЁ][а-яё]+?)*{}",
        alternation(SURNAME_SUFFIXES)
    )
}

fn patronymic_pattern() -> String {
    format!("[А-ЯЁ][а-яё]+?{}", alternation(PATRONYMIC_SUFFIXES))
}

/// Russian full-name rules: surname + name + patronymic, surname + name, and
/// name + surname.
fn fio_rules() -> Vec<PatternRule> {
    let surname = surname_pattern();
    let patronymic = patronymic_pattern();
    vec![
        PatternRule::new(
            "ru_fio_three",
            format!(r"\b{surname}\s+[А-ЯЁ][а-яё]+\s+{patronymic}\b"),
            0.9,
        ),
        PatternRule::new("ru_fio_two", format!(r"\b{surname}\s+[А-ЯЁ][а-яё]+\b"), 0.75),
        PatternRule::new(
            "ru_fio_reversed",
            format!(r"\b[А-ЯЁ][а-яё]+\s+{surname}\b"),
            0.6,
        ),
    ]
}

fn phone_ru_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new(
            "phone_ru",
            format!(r"(?:\+7|8)\s*\(?\d{{3}}\)?{SEP}*\d{{3}}{SEP}*\d{{2}}{SEP}*\d{{2}}"),
            0.7,
        )
        .digit_bounded(),
        PatternRule::new("phone_ru_compact", format!(r"(?:\+7|8){SEP}*\d{{10}}"), 0.55)
            .digit_bounded(),
    ]
}

fn boxed(rec: PatternRecognizer, enhancement: ContextEnhancement) -> Box<dyn EntityRecognizer> {
    Box::new(rec.with_enhancement(enhancement))
}

/// Passport, full names, SNILS, INN, OGRN/OGRNIP, Russian phones, email and
/// card numbers.
pub fn build_ru_critical_recognizers(
    enhancement: ContextEnhancement,
) -> Result<Vec<Box<dyn EntityRecognizer>>> {
    let mut recs = Vec::new();

    // Series (4 digits) + number (6 digits)
    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::RuPassport,
            vec![PatternRule::new(
                "russian_passport",
                r"\b\d{2}\s?\d{2}\s?\d{6}\b",
                0.3,
            )],
            &["паспорт", "серия", "номер", "passport"],
        )?,
        enhancement,
    ));

    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::Person,
            fio_rules(),
            &["гражданин", "клиент", "сотрудник", "фио"],
        )?
        .with_languages(LanguageScope::Russian),
        enhancement,
    ));

    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::RuSnils,
            vec![
                PatternRule::new("snils_hyphen", r"\b\d{3}-\d{3}-\d{3}\s?\d{2}\b", 0.2),
                PatternRule::new("snils_compact", r"\d{11}", 0.05).digit_bounded(),
            ],
            &["снилс"],
        )?,
        enhancement,
    ));

    // Longer alternative first so a 12-digit run is not cut to 10.
    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::RuInn,
            vec![PatternRule::new("inn_10_12", r"\d{12}|\d{10}", 0.2).digit_bounded()],
            &["инн"],
        )?,
        enhancement,
    ));

    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::RuOgrn,
            vec![PatternRule::new("ogrn_13", r"\d{13}", 0.15).digit_bounded()],
            &["огрн"],
        )?,
        enhancement,
    ));
    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::RuOgrnip,
            vec![PatternRule::new("ogrnip_15", r"\d{15}", 0.15).digit_bounded()],
            &["огрнип"],
        )?,
        enhancement,
    ));

    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::PhoneRu,
            phone_ru_rules(),
            &["тел", "моб", "телефон", "phone", "tel"],
        )?,
        enhancement,
    ));

    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::Email,
            vec![PatternRule::new(
                "email_simple",
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                0.2,
            )],
            &["email", "e-mail", "почта"],
        )?,
        enhancement,
    ));

    // 13-19 digits with optional single separators; never ends on one
    recs.push(boxed(
        PatternRecognizer::new(
            EntityType::Card,
            vec![PatternRule::new("card_pan", r"\b\d(?:[ -]?\d){12,18}\b", 0.1)],
            &["card", "карта", "visa", "mastercard"],
        )?,
        enhancement,
    ));

    Ok(recs)
}

/// BIK, settlement and correspondent accounts.
pub fn build_ru_bank_recognizers(
    enhancement: ContextEnhancement,
) -> Result<Vec<Box<dyn EntityRecognizer>>> {
    Ok(vec![
        boxed(
            PatternRecognizer::new(
                EntityType::RuBik,
                vec![PatternRule::new("bik_9", r"[0-9]{9}", 0.1).digit_bounded()],
                &["бик"],
            )?,
            enhancement,
        ),
        boxed(
            PatternRecognizer::new(
                EntityType::RuRs,
                vec![PatternRule::new("rs_20", r"[0-9]{20}", 0.05).digit_bounded()],
                &["р/с", "расчет", "расчёт", "счет", "счёт"],
            )?,
            enhancement,
        ),
        boxed(
            PatternRecognizer::new(
                EntityType::RuKs,
                vec![PatternRule::new("ks_20", r"[0-9]{20}", 0.05).digit_bounded()],
                &["к/с", "корр", "корреспондентский"],
            )?,
            enhancement,
        ),
    ])
}

/// International phone numbers for both languages. A match needs a country
/// prefix (`+` or `00`) and at least two separators.
pub fn build_generic_recognizers(
    enhancement: ContextEnhancement,
) -> Result<Vec<Box<dyn EntityRecognizer>>> {
    let pattern = format!(
        r"(?:\+\d{{1,3}}|00\d{{1,3}}){SEP}?(?:\(?\d{{2,4}}\)?{SEP}?){{2,4}}\d{{2,4}}"
    );

    Ok(vec![boxed(
        PatternRecognizer::new(
            EntityType::Phone,
            vec![PatternRule::new("phone_international", pattern, 0.5)
                .digit_bounded()
                .min_separators(2)],
            &["phone", "tel", "mobile", "cell", "тел", "телефон", "моб"],
        )?,
        enhancement,
    )])
}

/// Every built-in rule set.
pub fn build_default_recognizers(
    enhancement: ContextEnhancement,
) -> Result<Vec<Box<dyn EntityRecognizer>>> {
    let mut recs = build_ru_critical_recognizers(enhancement)?;
    recs.extend(build_ru_bank_recognizers(enhancement)?);
    recs.extend(build_generic_recognizers(enhancement)?);
    Ok(recs)
}
