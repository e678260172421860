//! Anonymization rendering
//!
//! Applies policy operators to validated entity spans. When spans overlap
//! the earliest one wins, and the longest among equal starts; the others are
//! left out of the output.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::entity::{Candidate, EntityType};
use super::policy::{AnonymizationPolicy, Operator};
use super::text::SourceText;

/// One rendered span. Offsets are character offsets into the anonymized
/// text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymizedItem {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub operator: &'static str,
    pub text: String,
}

/// Output of [`anonymize`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymizedText {
    pub text: String,
    pub items: Vec<AnonymizedItem>,
}

impl Operator {
    /// Render `original` (the span text) with this operator.
    pub fn apply(&self, original: &str, entity_type: &EntityType) -> String {
        match self {
            Self::Replace { new_value } => new_value
                .clone()
                .unwrap_or_else(|| format!("<{}>", entity_type)),
            Self::Mask {
                masking_char,
                chars_to_mask,
                from_end,
            } => mask(original, *masking_char, *chars_to_mask, *from_end),
            Self::Redact => String::new(),
            Self::Hash => format!("{:x}", Sha256::digest(original.as_bytes())),
            Self::Keep => original.to_string(),
        }
    }
}

fn mask(original: &str, masking_char: char, chars_to_mask: usize, from_end: bool) -> String {
    let len = original.chars().count();
    let count = chars_to_mask.min(len);
    let (lo, hi) = if from_end {
        (len - count, len)
    } else {
        (0, count)
    };

    original
        .chars()
        .enumerate()
        .map(|(i, c)| if i >= lo && i < hi { masking_char } else { c })
        .collect()
}

/// Non-overlapping subset of `entities` in text order.
fn resolve_overlaps<'a>(entities: impl IntoIterator<Item = &'a Candidate>) -> Vec<&'a Candidate> {
    let mut sorted: Vec<&Candidate> = entities.into_iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<&Candidate> = Vec::with_capacity(sorted.len());
    for entity in sorted {
        match kept.last() {
            Some(last) if entity.start < last.end => continue,
            _ => kept.push(entity),
        }
    }
    kept
}

/// Render `text` with every entity replaced according to `policy`.
///
/// Entities with offsets outside the text are ignored.
pub fn anonymize(text: &str, entities: &[Candidate], policy: &AnonymizationPolicy) -> AnonymizedText {
    let source = SourceText::new(text);
    let spans = resolve_overlaps(
        entities
            .iter()
            .filter(|c| source.is_valid_span(c.start, c.end)),
    );

    let rendered: Vec<(&Candidate, &'static str, String)> = spans
        .iter()
        .map(|c| {
            let op = policy.operator_for(&c.entity_type);
            let original = source.slice(c.start, c.end).unwrap_or("");
            (*c, op.name(), op.apply(original, &c.entity_type))
        })
        .collect();

    // Right to left so earlier byte offsets stay valid.
    let mut out = text.to_string();
    for (c, _, replacement) in rendered.iter().rev() {
        let range = source.byte_offset(c.start)..source.byte_offset(c.end);
        out.replace_range(range, replacement);
    }

    let mut items = Vec::with_capacity(rendered.len());
    let mut shift: isize = 0;
    for (c, operator, replacement) in rendered {
        let new_len = replacement.chars().count();
        let start = (c.start as isize + shift) as usize;
        items.push(AnonymizedItem {
            entity_type: c.entity_type.clone(),
            start,
            end: start + new_len,
            operator,
            text: replacement,
        });
        shift += new_len as isize - (c.end - c.start) as isize;
    }

    AnonymizedText { text: out, items }
}
