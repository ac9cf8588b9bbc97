//! Text-level edits. Every other edit reduces to these.

use regex::{Captures, Regex};

use crate::value::{
    Format, LINE_SEPARATOR, OBJECT_REPLACEMENT, Replacement, Value, char_slice,
};

/// Clamp `start..end` into `0..=len` with `start <= end`.
fn clamp(value: &Value, start: usize, end: usize) -> (usize, usize) {
    let end = end.min(value.len());
    (start.min(end), end)
}

/// `[start, end)` of `value`, without a selection.
pub fn slice(value: &Value, start: usize, end: usize) -> Value {
    let (start, end) = clamp(value, start, end);
    Value {
        text: char_slice(&value.text, start, end).to_string(),
        formats: value.formats[start..end].to_vec(),
        replacements: value.replacements[start..end].to_vec(),
        ..Value::default()
    }
}

/// Append values in order. Runs are not merged across the joins.
pub fn concat<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut result = Value::new();
    for value in values {
        append(&mut result, value);
    }
    result
}

fn append(acc: &mut Value, value: &Value) {
    acc.text.push_str(&value.text);
    acc.formats.extend(value.formats.iter().cloned());
    acc.replacements.extend(value.replacements.iter().cloned());
}

/// Replace `[start, end)` with `payload` and put the caret after it.
pub fn insert(value: &Value, payload: impl Into<Value>, start: usize, end: usize) -> Value {
    let payload = payload.into();
    let (start, end) = clamp(value, start, end);
    let caret = start + payload.len();
    let mut result = concat([
        &slice(value, 0, start),
        &payload,
        &slice(value, end, value.len()),
    ]);
    result.start = Some(caret);
    result.end = Some(caret);
    result
}

pub fn remove(value: &Value, start: usize, end: usize) -> Value {
    insert(value, Value::new(), start, end)
}

/// Insert one object character carrying `format`.
pub fn insert_object(value: &Value, format: Format, start: usize, end: usize) -> Value {
    let object = Value {
        text: OBJECT_REPLACEMENT.to_string(),
        formats: vec![Vec::new()],
        replacements: vec![Some(Replacement::Object(format))],
        ..Value::default()
    };
    insert(value, object, start, end)
}

/// Insert a line separator at the depth of the line it splits.
pub fn insert_line_separator(value: &Value, start: usize, end: usize) -> Value {
    let (start, _) = clamp(value, start, end);
    let markers = value
        .text
        .chars()
        .take(start)
        .collect::<Vec<_>>()
        .iter()
        .rposition(|c| *c == LINE_SEPARATOR)
        .and_then(|index| value.replacements[index].clone());
    let separator = Value {
        text: LINE_SEPARATOR.to_string(),
        formats: vec![Vec::new()],
        replacements: vec![markers],
        ..Value::default()
    };
    insert(value, separator, start, end)
}

/// Backspace (`backward`) or delete next to a line separator.
///
/// A nested separator at a caret loses its innermost marker instead of being
/// removed. `None` when no separator is adjacent.
pub fn remove_line_separator(value: &Value, backward: bool) -> Option<Value> {
    let (start, end) = value.selection()?;
    let collapsed = start == end;
    let (index, remove_start, remove_end) = if backward {
        let index = start.checked_sub(1)?;
        (index, if collapsed { index } else { start }, end)
    } else {
        (end, start, if collapsed { end + 1 } else { end })
    };

    if value.text.chars().nth(index) != Some(LINE_SEPARATOR) {
        return None;
    }

    let markers = value.markers_at(index);
    if collapsed && !markers.is_empty() {
        let mut result = value.clone();
        let outer = &markers[..markers.len() - 1];
        result.replacements[index] =
            (!outer.is_empty()).then(|| Replacement::Markers(outer.to_vec()));
        return Some(result);
    }
    Some(remove(value, remove_start, remove_end))
}

/// Split on every occurrence of `separator`, like `str::split`.
///
/// A selection boundary goes to the segment whose span, separator included,
/// holds it. The first segment loses a leading line separator and the last
/// one a trailing line separator.
pub fn split_by_separator(value: &Value, separator: &str) -> Vec<Value> {
    if separator.is_empty() {
        return vec![slice(value, 0, value.len())];
    }
    let separator_len = separator.chars().count();
    let mut next_start = 0;
    let mut segments: Vec<Value> = value
        .text
        .split(separator)
        .map(|substring| {
            let start_index = next_start;
            let len = substring.chars().count();
            let mut segment = slice(value, start_index, start_index + len);
            next_start += len + separator_len;

            if let Some((start, end)) = value.selection() {
                if start >= start_index && start < next_start {
                    segment.start = Some((start - start_index).min(len));
                } else if start < start_index && end > start_index {
                    segment.start = Some(0);
                }
                if end >= start_index && end < next_start {
                    segment.end = Some((end - start_index).min(len));
                } else if start < next_start && end > next_start {
                    segment.end = Some(len);
                }
            }
            segment
        })
        .collect();

    if let Some(first) = segments.first_mut() {
        if first.text.starts_with(LINE_SEPARATOR) {
            *first = shifted(slice(first, 1, first.len()), first, 1);
        }
    }
    if let Some(last) = segments.last_mut() {
        if last.text.ends_with(LINE_SEPARATOR) {
            let len = last.len();
            *last = shifted(slice(last, 0, len - 1), last, 0);
        }
    }
    segments
}

/// Carry `from`'s selection onto a trimmed copy, moved left by `by`.
fn shifted(mut trimmed: Value, from: &Value, by: usize) -> Value {
    let len = trimmed.len();
    trimmed.start = from.start.map(|s| s.saturating_sub(by).min(len));
    trimmed.end = from.end.map(|e| e.saturating_sub(by).min(len));
    trimmed
}

/// Split around `[start, end)`, dropping it. Line separators at the cut are
/// trimmed; `after` gets a caret at 0.
pub fn split_at(value: &Value, start: usize, end: usize) -> (Value, Value) {
    let (start, end) = clamp(value, start, end);
    let mut before = slice(value, 0, start);
    let mut after = slice(value, end, value.len());

    let trailing = before
        .text
        .chars()
        .rev()
        .take_while(|c| *c == LINE_SEPARATOR)
        .count();
    if trailing > 0 {
        before = slice(&before, 0, before.len() - trailing);
    }
    let leading = after
        .text
        .chars()
        .take_while(|c| *c == LINE_SEPARATOR)
        .count();
    if leading > 0 {
        after = slice(&after, leading, after.len());
    }
    (before, after.with_selection(0, 0))
}

/// Concatenate with `separator` between every pair. No selection.
pub fn join(values: &[Value], separator: impl Into<Value>) -> Value {
    let separator = separator.into();
    let mut result = Value::new();
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            append(&mut result, &separator);
        }
        append(&mut result, value);
    }
    result
}

/// What a match is replaced with.
pub enum Substitution<'a> {
    /// Inherits the formats at the match start.
    Text(&'a str),
    /// Spliced in with its own formats and replacements.
    Value(&'a Value),
    /// Computed per match; treated like [`Substitution::Text`].
    With(&'a dyn Fn(&Captures<'_>) -> String),
}

/// Replace every match of `pattern` in the text.
///
/// An endpoint inside a match moves to the end of its replacement; one
/// after it shifts by the length change.
pub fn replace(value: &Value, pattern: &Regex, substitution: Substitution<'_>) -> Value {
    let mut result = Value::new();
    let mut consumed = 0;
    let (mut start, mut end) = (value.start, value.end);
    let mut delta: isize = 0;

    for captures in pattern.captures_iter(&value.text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let match_start = value.text[..whole.start()].chars().count();
        let match_end = match_start + whole.as_str().chars().count();

        append(&mut result, &slice(value, consumed, match_start));

        let piece = match &substitution {
            Substitution::Value(payload) => (*payload).clone(),
            Substitution::Text(text) => uniform(value, match_start, text),
            Substitution::With(compute) => uniform(value, match_start, &compute(&captures)),
        };
        let new_end = result.len() + piece.len();
        append(&mut result, &piece);

        let change = piece.len() as isize - (match_end - match_start) as isize;
        let map = |orig: Option<usize>, current: &mut Option<usize>| {
            if let Some(p) = orig {
                if p > match_start && p <= match_end {
                    *current = Some(new_end);
                } else if p > match_end {
                    *current = Some((p as isize + delta + change) as usize);
                }
            }
        };
        map(value.start, &mut start);
        map(value.end, &mut end);

        delta += change;
        consumed = match_end;
    }

    append(&mut result, &slice(value, consumed, value.len()));
    result.start = start;
    result.end = end;
    result
}

/// `text` with the formats found at `at` on every character.
fn uniform(value: &Value, at: usize, text: &str) -> Value {
    let inherited = value.formats.get(at).cloned().unwrap_or_default();
    let mut piece = Value::from_text(text);
    for slot in &mut piece.formats {
        *slot = inherited.clone();
    }
    piece
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn emphasised(text: &str, start: usize, end: usize) -> Value {
        let em = Format::new("em");
        let mut value = Value::from_text(text);
        for slot in &mut value.formats[start..end] {
            slot.push(em.clone());
        }
        value
    }

    fn without_selection(mut value: Value) -> Value {
        value.start = None;
        value.end = None;
        value
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(5)]
    #[case(8)]
    fn slice_then_concat_is_identity(#[case] k: usize) {
        let value = emphasised("one\u{fffc}two😀!", 2, 6);
        let len = value.len();
        let joined = concat([&slice(&value, 0, k), &slice(&value, k, len)]);
        assert_eq!(joined, value);
        assert!(joined
            .formats
            .iter()
            .flatten()
            .all(|f| Format::same(f, &value.formats[2][0])));
    }

    #[test]
    fn slice_drops_selection() {
        let value = Value::from_text("abc").with_selection(1, 2);
        assert_eq!(slice(&value, 1, 3).selection(), None);
        assert_eq!(slice(&value, 2, 10).text, "c");
    }

    #[test]
    fn insert_places_caret_after_payload() {
        let value = Value::from_text("abcd");
        let result = insert(&value, "XY", 1, 3);
        assert_eq!(result.text, "aXYd");
        assert_eq!(result.selection(), Some((3, 3)));
    }

    #[test]
    fn insert_then_remove_is_identity() {
        let value = emphasised("hello world", 0, 5);
        let payload = emphasised("big ", 0, 3);
        let inserted = insert(&value, payload.clone(), 6, 6);
        assert_eq!(inserted.text, "hello big world");
        let removed = remove(&inserted, 6, 6 + payload.len());
        assert_eq!(without_selection(removed), value);
    }

    #[test]
    fn insert_object_adds_replacement() {
        let img = Format::with_attributes("img", [("src", "x")]);
        let result = insert_object(&Value::from_text("ab"), img.clone(), 1, 1);
        assert_eq!(result.text, "a\u{fffc}b");
        assert_eq!(result.object_at(1), Some(&img));
    }

    #[test]
    fn line_separator_keeps_depth() {
        let ul = Format::new("ul");
        let mut value = Value::from_text("a\u{2028}b");
        value.replacements[1] = Some(Replacement::Markers(vec![ul.clone()]));
        let result = insert_line_separator(&value, 3, 3);
        assert_eq!(result.text, "a\u{2028}b\u{2028}");
        assert_eq!(result.markers_at(3), [ul]);
        assert!(insert_line_separator(&Value::from_text("a"), 1, 1)
            .markers_at(1)
            .is_empty());
    }

    #[test]
    fn backspace_after_nested_separator_outdents() {
        let (ul, ol) = (Format::new("ul"), Format::new("ol"));
        let mut value = Value::from_text("a\u{2028}b").with_selection(2, 2);
        value.replacements[1] = Some(Replacement::Markers(vec![ul.clone(), ol]));

        let once = remove_line_separator(&value, true).unwrap();
        assert_eq!(once.markers_at(1), [ul]);
        let twice = remove_line_separator(&once, true).unwrap();
        assert_eq!(twice.replacements[1], None);
        assert_eq!(twice.text, "a\u{2028}b");
        let thrice = remove_line_separator(&twice, true).unwrap();
        assert_eq!(thrice.text, "ab");
        assert_eq!(thrice.selection(), Some((1, 1)));
    }

    #[test]
    fn delete_before_separator() {
        let value = Value::from_text("a\u{2028}b").with_selection(1, 1);
        let result = remove_line_separator(&value, false).unwrap();
        assert_eq!(result.text, "ab");
        assert!(remove_line_separator(&value, true).is_none());
        assert!(remove_line_separator(&Value::from_text("a\u{2028}"), true).is_none());
    }

    #[test]
    fn split_by_separator_distributes_selection() {
        let value = Value::from_text("one two three").with_selection(2, 9);
        let parts = split_by_separator(&value, " ");
        let texts: Vec<_> = parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert_eq!(parts[0].selection(), Some((2, 3)));
        assert_eq!(parts[1].selection(), Some((0, 3)));
        assert_eq!(parts[2].selection(), Some((0, 1)));
    }

    #[test]
    fn split_by_separator_clamps_points_inside_separator() {
        let value = Value::from_text("ab--cd").with_selection(3, 5);
        let parts = split_by_separator(&value, "--");
        assert_eq!(parts[0].selection(), Some((2, 2)));
        assert_eq!(parts[1].selection(), Some((0, 1)));
    }

    #[test]
    fn split_by_separator_trims_edge_line_separators() {
        let value = Value::from_text("\u{2028}a|b\u{2028}");
        let parts = split_by_separator(&value, "|");
        assert_eq!(parts[0].text, "a");
        assert_eq!(parts[1].text, "b");
    }

    #[test]
    fn split_at_trims_separators_and_sets_caret() {
        let value = emphasised("ab\u{2028}\u{2028}cd", 0, 2);
        let (before, after) = split_at(&value, 3, 3);
        assert_eq!(before.text, "ab");
        assert_eq!(after.text, "cd");
        assert_eq!(after.selection(), Some((0, 0)));
        assert_eq!(before.selection(), None);
    }

    #[test]
    fn join_with_separator() {
        let joined = join(&[Value::from_text("a"), Value::from_text("b")], "\u{2028}");
        assert_eq!(joined.text, "a\u{2028}b");
        assert_eq!(joined.len(), 3);
        assert_eq!(join(&[], ""), Value::new());
    }

    #[test]
    fn replace_text_inherits_formats() {
        let value = emphasised("a--b", 0, 4).with_selection(4, 4);
        let pattern = Regex::new("--").unwrap();
        let result = replace(&value, &pattern, Substitution::Text("\u{2013}"));
        assert_eq!(result.text, "a\u{2013}b");
        assert!(result
            .formats
            .iter()
            .all(|slot| Format::same(&slot[0], &value.formats[0][0])));
        assert_eq!(result.selection(), Some((3, 3)));
    }

    #[test]
    fn replace_moves_caret_inside_match_to_its_end() {
        let value = Value::from_text("x:-)y").with_selection(2, 2);
        let pattern = Regex::new(r":-\)").unwrap();
        let result = replace(&value, &pattern, Substitution::Text("🙂"));
        assert_eq!(result.text, "x🙂y");
        assert_eq!(result.selection(), Some((2, 2)));
    }

    #[test]
    fn replace_with_value_splices_formats() {
        let strong = Format::new("strong");
        let mut payload = Value::from_text("B");
        payload.formats[0].push(strong.clone());
        let result = replace(
            &Value::from_text("abc"),
            &Regex::new("b").unwrap(),
            Substitution::Value(&payload),
        );
        assert_eq!(result.text, "aBc");
        assert_eq!(result.formats[1], vec![strong]);
        assert!(result.formats[0].is_empty());
    }

    #[test]
    fn replace_with_captures() {
        let pattern = Regex::new(r"(\w+)@").unwrap();
        let upper = |caps: &Captures<'_>| caps[1].to_uppercase();
        let result = replace(
            &Value::from_text("hi@ there@"),
            &pattern,
            Substitution::With(&upper),
        );
        assert_eq!(result.text, "HI THERE");
        assert_eq!(result.len(), 8);
    }
}
