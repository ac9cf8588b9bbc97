//! The rich-text value record.
//!
//! A [`Value`] is plain text plus two arrays parallel to it, indexed by
//! `char` offset:
//!
//! - `formats[i]` lists the formats active at offset `i`, outermost first.
//!   Adjacent slots of one run hold clones of the same [`Format`] handles.
//! - `replacements[i]` is set at reserved characters only: an embedded object
//!   at [`OBJECT_REPLACEMENT`], the list nesting at [`LINE_SEPARATOR`].
//!
//! Every operation in [`crate::editing`] returns a new `Value`.

mod create;
mod format;

pub use create::{CreateOptions, Source, create, create_from_markup};
pub use format::{Attributes, Format, FormatData, Formats, Replacement};

pub(crate) use format::equal_neighbour;

use serde::Serialize;

/// Delimits lines (list items, multiline blocks) inside one text stream.
pub const LINE_SEPARATOR: char = '\u{2028}';

/// Placeholder for an embedded non-text payload.
pub const OBJECT_REPLACEMENT: char = '\u{fffc}';

/// Zero-width padding inserted into the editable tree so empty lines keep a caret.
pub const ZWNBSP: char = '\u{feff}';

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    pub text: String,
    pub formats: Vec<Formats>,
    pub replacements: Vec<Option<Replacement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    /// Formats the next typed character inherits at a collapsed caret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_formats: Option<Vec<Format>>,
}

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unformatted text, taken verbatim.
    pub fn from_text(text: &str) -> Self {
        let len = text.chars().count();
        Self {
            text: text.to_string(),
            formats: vec![Vec::new(); len],
            replacements: vec![None; len],
            ..Self::default()
        }
    }

    pub fn with_selection(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Length in `char`s.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn chars(&self) -> Vec<char> {
        self.text.chars().collect()
    }

    /// Both ends of the selection, when there is one.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.start.zip(self.end)
    }

    /// `None` without a selection, otherwise whether it is a caret.
    pub fn is_collapsed(&self) -> Option<bool> {
        self.selection().map(|(start, end)| start == end)
    }

    /// Whether the caret sits on a line with no content.
    pub fn is_empty_line(&self) -> bool {
        if self.start != self.end {
            return false;
        }
        let chars = self.chars();
        if chars.is_empty() {
            return true;
        }
        let Some(start) = self.start else {
            return false;
        };
        if start == 0 && chars[0] == LINE_SEPARATOR {
            return true;
        }
        if start == chars.len() && chars[start - 1] == LINE_SEPARATOR {
            return true;
        }
        start > 0
            && start < chars.len()
            && chars[start - 1] == LINE_SEPARATOR
            && chars[start] == LINE_SEPARATOR
    }

    /// Plain text: objects dropped, line separators as `\n`.
    pub fn text_content(&self) -> String {
        self.text
            .chars()
            .filter(|c| *c != OBJECT_REPLACEMENT)
            .map(|c| if c == LINE_SEPARATOR { '\n' } else { c })
            .collect()
    }

    /// Nesting markers of the line separator at `index`, empty at depth 0.
    pub fn markers_at(&self, index: usize) -> &[Format] {
        match self.replacements.get(index) {
            Some(Some(replacement)) => replacement.markers(),
            _ => &[],
        }
    }

    pub fn object_at(&self, index: usize) -> Option<&Format> {
        self.replacements
            .get(index)
            .and_then(Option::as_ref)
            .and_then(Replacement::as_object)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::from_text(&text)
    }
}

/// Byte offset of the `char_index`th char, or `text.len()` past the end.
pub(crate) fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Substring by `char` offsets.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn from_text_has_parallel_arrays() {
        let value = Value::from_text("héllo");
        assert_eq!(value.len(), 5);
        assert_eq!(value.formats.len(), 5);
        assert_eq!(value.replacements.len(), 5);
        assert!(value.formats.iter().all(Vec::is_empty));
    }

    #[test]
    fn is_collapsed_without_selection_is_undefined() {
        assert_eq!(Value::from_text("ab").is_collapsed(), None);
        assert_eq!(
            Value::from_text("ab").with_selection(1, 1).is_collapsed(),
            Some(true)
        );
        assert_eq!(
            Value::from_text("ab").with_selection(0, 1).is_collapsed(),
            Some(false)
        );
    }

    #[rstest]
    #[case("", 0, true)]
    #[case("\u{2028}a", 0, true)]
    #[case("a\u{2028}", 2, true)]
    #[case("a\u{2028}\u{2028}b", 2, true)]
    #[case("a\u{2028}b", 2, false)]
    #[case("ab", 1, false)]
    fn empty_line_detection(#[case] text: &str, #[case] caret: usize, #[case] expected: bool) {
        let value = Value::from_text(text).with_selection(caret, caret);
        assert_eq!(value.is_empty_line(), expected);
    }

    #[test]
    fn text_content_maps_reserved_characters() {
        let value = Value::from_text("a\u{fffc}b\u{2028}c");
        assert_eq!(value.text_content(), "ab\nc");
    }

    #[test]
    fn char_slicing_handles_multibyte() {
        assert_eq!(char_slice("añb😀c", 1, 4), "ñb😀");
        assert_eq!(char_slice("abc", 2, 10), "c");
        assert_eq!(byte_offset("ñ", 1), 2);
    }

    #[test]
    fn serializes_camel_case() {
        let value = Value::from_text("a").with_selection(0, 1);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"text":"a","formats":[[]],"replacements":[null],"start":0,"end":1}"#
        );
    }
}
