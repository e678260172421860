//! Character-offset view over source text
//!
//! Candidate spans carry character offsets, while `str` slicing and `regex`
//! work in bytes. `SourceText` keeps the byte position of every character so
//! spans and context windows can be cut out in O(1).

/// Source text indexed by character position.
#[derive(Debug, Clone)]
pub struct SourceText<'a> {
    text: &'a str,
    /// Byte offset of each char, plus a trailing `text.len()` sentinel.
    boundaries: Vec<usize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    /// The underlying text.
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Whether `start..end` is a non-empty range inside the text.
    pub fn is_valid_span(&self, start: usize, end: usize) -> bool {
        start < end && end <= self.char_len()
    }

    /// Slice by character offsets. `None` when the range is out of bounds or
    /// reversed.
    pub fn slice(&self, start: usize, end: usize) -> Option<&'a str> {
        if start > end || end > self.char_len() {
            return None;
        }
        Some(&self.text[self.boundaries[start]..self.boundaries[end]])
    }

    /// Up to `width` characters immediately before `start`.
    pub fn window_before(&self, start: usize, width: usize) -> &'a str {
        let start = start.min(self.char_len());
        self.slice(start.saturating_sub(width), start).unwrap_or("")
    }

    /// Up to `width` characters immediately after `end`.
    pub fn window_after(&self, end: usize, width: usize) -> &'a str {
        let end = end.min(self.char_len());
        let stop = end.saturating_add(width).min(self.char_len());
        self.slice(end, stop).unwrap_or("")
    }

    /// Convert a byte offset (as produced by `regex`) to a character offset.
    ///
    /// Offsets that fall inside a multi-byte character resolve to the
    /// character containing them.
    pub fn char_offset(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        }
    }

    /// Byte offset of a character offset, clamped to the end of the text.
    pub fn byte_offset(&self, char_idx: usize) -> usize {
        self.boundaries[char_idx.min(self.char_len())]
    }
}

/// Digits of `s`, in order. Only ASCII `0-9` count.
pub fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_cyrillic() {
        let src = SourceText::new("ИНН 7736050003");
        assert_eq!(src.char_len(), 14);
        assert_eq!(src.slice(0, 3), Some("ИНН"));
        assert_eq!(src.slice(4, 14), Some("7736050003"));
        assert_eq!(src.slice(4, 15), None);
        assert_eq!(src.slice(5, 4), None);
    }

    #[test]
    fn test_windows_clamp_to_text() {
        let src = SourceText::new("паспорт 4012 345678");
        assert_eq!(src.window_before(8, 24), "паспорт ");
        assert_eq!(src.window_after(19, 16), "");
        assert_eq!(src.window_after(12, 3), " 34");
    }

    #[test]
    fn test_byte_char_conversion() {
        let text = "тел +7";
        let src = SourceText::new(text);
        let byte = text.find('+').unwrap();
        assert_eq!(byte, 7);
        assert_eq!(src.char_offset(byte), 4);
        assert_eq!(src.byte_offset(4), 7);
        assert_eq!(src.char_offset(text.len()), src.char_len());
    }

    #[test]
    fn test_valid_span() {
        let src = SourceText::new("abc");
        assert!(src.is_valid_span(0, 3));
        assert!(!src.is_valid_span(2, 2));
        assert!(!src.is_valid_span(1, 4));
    }

    #[test]
    fn test_digits_of() {
        assert_eq!(digits_of("+7 (912) 000-00-00"), "79120000000");
        assert_eq!(digits_of("no digits"), "");
    }
}
