//! Apply, remove and query formats.
//!
//! Range operations write one handle into every slot they touch, so the
//! resulting run renders as one element. Where the slot next to the range
//! already holds an equal format at the same depth, that handle is reused
//! and the run grows instead of splitting.

use crate::value::{Format, Formats, Value, equal_neighbour};

/// The formats that typed text would pick up.
///
/// A caret honours `active_formats`, else takes the shorter of the formats
/// on either side. A range keeps the formats present at every offset.
pub fn get_active_formats(value: &Value) -> Vec<Format> {
    let Some((start, end)) = value.selection() else {
        return Vec::new();
    };

    if start == end {
        if let Some(active) = &value.active_formats {
            return active.clone();
        }
        let before = start
            .checked_sub(1)
            .and_then(|i| value.formats.get(i))
            .map_or(&[][..], Vec::as_slice);
        let after = value.formats.get(start).map_or(&[][..], Vec::as_slice);
        return if before.len() < after.len() {
            before.to_vec()
        } else {
            after.to_vec()
        };
    }

    let Some(first) = value.formats.get(start) else {
        return Vec::new();
    };
    let mut active = first.clone();
    for slot in value.formats[start..end.min(value.len())].iter().rev() {
        active.retain(|format| slot.iter().any(|f| f == format));
        if active.is_empty() {
            break;
        }
    }
    active
}

/// The active format of one type.
pub fn get_active_format(value: &Value, type_name: &str) -> Option<Format> {
    get_active_formats(value)
        .into_iter()
        .find(|f| f.type_name == type_name)
}

/// `active` without `type_name`.
fn without_type(active: Vec<Format>, type_name: &str) -> Vec<Format> {
    active
        .into_iter()
        .filter(|f| f.type_name != type_name)
        .collect()
}

fn current_active(value: &Value) -> Vec<Format> {
    value
        .active_formats
        .clone()
        .unwrap_or_else(|| get_active_formats(value))
}

/// Apply `format` over `[start, end)`.
///
/// At a caret the run of the same type next to it is replaced in place, and
/// `active_formats` always ends with `format`.
pub fn apply_format(value: &Value, format: &Format, start: usize, end: usize) -> Value {
    let len = value.len();
    let end = end.min(len);
    let start = start.min(end);
    let mut formats = value.formats.clone();

    if start == end {
        replace_run_at_caret(&mut formats, format, start);
    } else {
        for slot in &mut formats[start..end] {
            slot.retain(|f| f.type_name != format.type_name);
        }
        let shared = equal_neighbour(
            start.checked_sub(1).and_then(|i| formats.get(i)),
            None,
            formats[start].len(),
            format,
        )
        .or_else(|| equal_neighbour(None, formats.get(end), formats[end - 1].len(), format))
        .cloned()
        .unwrap_or_else(|| format.clone());

        for slot in &mut formats[start..end] {
            slot.push(shared.clone());
        }
    }

    let mut active = without_type(current_active(value), &format.type_name);
    active.push(format.clone());

    Value {
        formats,
        active_formats: Some(active),
        ..value.clone()
    }
}

/// Swap the same-type run touching the caret for `format`, keeping its depth.
fn replace_run_at_caret(formats: &mut [Formats], format: &Format, caret: usize) {
    let probes = [Some(caret), caret.checked_sub(1)];
    let Some((probe, depth, existing)) = probes.into_iter().flatten().find_map(|probe| {
        let slot = formats.get(probe)?;
        let depth = slot.iter().position(|f| f.type_name == format.type_name)?;
        Some((probe, depth, slot[depth].clone()))
    }) else {
        return;
    };

    let holds = |slot: &Formats| slot.get(depth).is_some_and(|f| Format::same(f, &existing));

    let mut first = probe;
    while first > 0 && holds(&formats[first - 1]) {
        first -= 1;
    }
    let mut last = probe;
    while last + 1 < formats.len() && holds(&formats[last + 1]) {
        last += 1;
    }
    for slot in &mut formats[first..=last] {
        slot[depth] = format.clone();
    }
}

/// Strip `type_name` from `[start, end)`.
///
/// At a caret the whole run of the format after it is stripped.
pub fn remove_format(value: &Value, type_name: &str, start: usize, end: usize) -> Value {
    let len = value.len();
    let end = end.min(len);
    let mut start = start.min(end);
    let mut end = end;
    let mut formats = value.formats.clone();

    if start == end {
        let found = formats
            .get(start)
            .and_then(|slot| slot.iter().find(|f| f.type_name == type_name))
            .cloned();
        if let Some(format) = found {
            let holds = |slot: &Formats| slot.iter().any(|f| Format::same(f, &format));
            while start > 0 && holds(&formats[start - 1]) {
                start -= 1;
            }
            while end < len && holds(&formats[end]) {
                end += 1;
            }
        }
    }

    for slot in &mut formats[start..end] {
        slot.retain(|f| f.type_name != type_name);
    }
    unify_runs(&mut formats, start, end);

    Value {
        formats,
        active_formats: Some(without_type(current_active(value), type_name)),
        ..value.clone()
    }
}

/// Re-share equal neighbours across every boundary in `[start, end]`.
fn unify_runs(formats: &mut [Formats], start: usize, end: usize) {
    let len = formats.len();
    for boundary in start.max(1)..=end.min(len.saturating_sub(1)) {
        let depth = formats[boundary - 1].len().min(formats[boundary].len());
        for d in 0..depth {
            let left = formats[boundary - 1][d].clone();
            let right = formats[boundary][d].clone();
            if Format::same(&left, &right) || left != right {
                continue;
            }
            let mut k = boundary;
            while k < len && formats[k].get(d).is_some_and(|f| Format::same(f, &right)) {
                formats[k][d] = left.clone();
                k += 1;
            }
        }
    }
}

/// Outcome of [`toggle_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Applied,
    Removed,
    Unchanged,
}

/// Remove `format`'s type if it is active at the selection, else apply it.
pub fn toggle_format(value: &Value, format: &Format) -> (Value, Toggle) {
    let Some((start, end)) = value.selection() else {
        return (value.clone(), Toggle::Unchanged);
    };
    if get_active_format(value, &format.type_name).is_some() {
        (
            remove_format(value, &format.type_name, start, end),
            Toggle::Removed,
        )
    } else {
        (apply_format(value, format, start, end), Toggle::Applied)
    }
}

/// Write `formats` into every slot of `[start, end)`, in place.
///
/// Entries equal to the neighbouring slot's entry at the same depth take over
/// that handle. The result is also stored as `active_formats`.
pub fn update_formats(value: &mut Value, start: usize, end: usize, formats: &[Format]) {
    let min = start.min(end);
    let max = start.max(end);
    let before = min.checked_sub(1).and_then(|i| value.formats.get(i));
    let after = value.formats.get(max);

    let active: Vec<Format> = formats
        .iter()
        .enumerate()
        .map(|(index, format)| {
            match before.and_then(|slot| slot.get(index)) {
                Some(candidate) if candidate == format => candidate.clone(),
                Some(_) => format.clone(),
                None => after
                    .and_then(|slot| slot.get(index))
                    .filter(|candidate| *candidate == format)
                    .cloned()
                    .unwrap_or_else(|| format.clone()),
            }
        })
        .collect();

    let end = end.min(value.len());
    if start < end {
        for slot in &mut value.formats[start..end] {
            *slot = active.clone();
        }
    }
    value.active_formats = Some(active);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn formatted(text: &str, runs: &[(&Format, usize, usize)]) -> Value {
        let mut value = Value::from_text(text);
        for (format, start, end) in runs {
            for slot in &mut value.formats[*start..*end] {
                slot.push((*format).clone());
            }
        }
        value
    }

    fn types(slot: &Formats) -> Vec<&str> {
        slot.iter().map(|f| f.type_name.as_str()).collect()
    }

    #[test]
    fn apply_at_format_boundary() {
        let em = Format::new("em");
        let strong = Format::new("strong");
        let value = formatted("one two three", &[(&em, 4, 7)]);

        let result = apply_format(&value, &strong, 3, 6);

        let expected: Vec<Vec<&str>> = vec![
            vec![],
            vec![],
            vec![],
            vec!["strong"],
            vec!["em", "strong"],
            vec!["em", "strong"],
            vec!["em"],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        ];
        assert_eq!(result.formats.iter().map(types).collect::<Vec<_>>(), expected);
        assert_eq!(result.formats.iter().filter(|s| !s.is_empty()).count(), 4);
        assert!(Format::same(&result.formats[3][0], &result.formats[4][1]));
        assert!(Format::same(&result.formats[4][1], &result.formats[5][1]));
        assert!(Format::same(&result.formats[4][0], &em));
        assert_eq!(result.text, value.text);
    }

    #[test]
    fn apply_then_remove_restores_formats() {
        let em = Format::new("em");
        let strong = Format::new("strong");
        let value = formatted("one two three", &[(&em, 4, 7)]);
        let applied = apply_format(&value, &strong, 3, 6);
        let removed = remove_format(&applied, "strong", 3, 6);
        assert_eq!(removed.formats, value.formats);
        assert_eq!(removed.replacements, value.replacements);
    }

    #[test]
    fn apply_replaces_same_type() {
        let old = Format::with_attributes("a", [("href", "#old")]);
        let new = Format::with_attributes("a", [("href", "#new")]);
        let value = formatted("link", &[(&old, 0, 4)]);
        let result = apply_format(&value, &new, 1, 3);
        assert!(Format::same(&result.formats[0][0], &old));
        assert!(Format::same(&result.formats[1][0], &new));
        assert_eq!(result.formats[1].len(), 1);
        assert!(Format::same(&result.formats[3][0], &old));
    }

    #[test]
    fn apply_extends_equal_neighbour() {
        let em = Format::new("em");
        let value = formatted("abcd", &[(&em, 0, 2)]);
        let result = apply_format(&value, &Format::new("em"), 2, 4);
        assert!(result.formats.iter().all(|slot| Format::same(&slot[0], &em)));
    }

    #[test]
    fn collapsed_apply_updates_run_in_place() {
        let old = Format::with_attributes("a", [("href", "#old")]);
        let new = Format::with_attributes("a", [("href", "#new")]);
        let value = formatted("a link b", &[(&old, 2, 6)]).with_selection(4, 4);
        let result = apply_format(&value, &new, 4, 4);
        for slot in &result.formats[2..6] {
            assert!(Format::same(&slot[0], &new));
        }
        assert!(result.formats[6].is_empty());
        assert_eq!(result.active_formats, Some(vec![new]));
    }

    #[test]
    fn collapsed_apply_at_run_end_uses_slot_before() {
        let old = Format::with_attributes("a", [("href", "#old")]);
        let new = Format::with_attributes("a", [("href", "#new")]);
        let value = formatted("link", &[(&old, 0, 4)]).with_selection(4, 4);
        let result = apply_format(&value, &new, 4, 4);
        assert!(result.formats.iter().all(|slot| Format::same(&slot[0], &new)));
    }

    #[test]
    fn collapsed_apply_without_run_only_sets_active() {
        let strong = Format::new("strong");
        let value = Value::from_text("ab").with_selection(1, 1);
        let result = apply_format(&value, &strong, 1, 1);
        assert_eq!(result.formats, value.formats);
        assert_eq!(result.active_formats, Some(vec![strong]));
    }

    #[test]
    fn collapsed_remove_expands_to_run() {
        let em = Format::new("em");
        let value = formatted("a emph b", &[(&em, 2, 6)]).with_selection(3, 3);
        let result = remove_format(&value, "em", 3, 3);
        assert!(result.formats.iter().all(Vec::is_empty));
        assert_eq!(result.active_formats, Some(vec![]));
    }

    #[test]
    fn remove_reshares_equal_siblings() {
        let em1 = Format::new("em");
        let em2 = Format::new("em");
        let strong = Format::new("strong");
        let mut value = Value::from_text("ab");
        value.formats[0] = vec![em1.clone()];
        value.formats[1] = vec![strong, em2];
        let result = remove_format(&value, "strong", 1, 2);
        assert!(Format::same(&result.formats[1][0], &em1));
    }

    #[test]
    fn remove_absent_format_is_noop_on_text() {
        let value = Value::from_text("abc");
        let result = remove_format(&value, "em", 0, 3);
        assert_eq!(result.formats, value.formats);
    }

    #[test]
    fn active_formats_at_caret_prefers_outside() {
        let em = Format::new("em");
        let value = formatted("ab", &[(&em, 0, 1)]).with_selection(1, 1);
        assert_eq!(get_active_formats(&value), vec![]);

        let inside = formatted("abc", &[(&em, 0, 2)]).with_selection(1, 1);
        assert_eq!(get_active_formats(&inside), vec![em.clone()]);

        let overridden = Value {
            active_formats: Some(vec![em.clone()]),
            ..value
        };
        assert_eq!(get_active_formats(&overridden), vec![em]);
    }

    #[test]
    fn active_formats_over_range_intersects() {
        let em = Format::new("em");
        let strong = Format::new("strong");
        let mut value = formatted("abc", &[(&em, 0, 3), (&strong, 0, 2)]);
        value = value.with_selection(0, 3);
        assert_eq!(get_active_formats(&value), vec![em.clone()]);
        assert_eq!(get_active_format(&value, "em"), Some(em));
        assert_eq!(get_active_format(&value, "strong"), None);
        assert_eq!(get_active_formats(&Value::from_text("abc")), vec![]);
    }

    #[test]
    fn toggle_applies_then_removes() {
        let strong = Format::new("strong");
        let value = Value::from_text("abc").with_selection(0, 3);
        let (applied, first) = toggle_format(&value, &strong);
        assert_eq!(first, Toggle::Applied);
        let (removed, second) = toggle_format(&applied, &strong);
        assert_eq!(second, Toggle::Removed);
        assert!(removed.formats.iter().all(Vec::is_empty));
        assert_eq!(
            toggle_format(&Value::from_text("a"), &strong).1,
            Toggle::Unchanged
        );
    }

    #[test]
    fn update_formats_reuses_neighbour_handles() {
        let em = Format::new("em");
        let mut value = formatted("abc", &[(&em, 0, 1)]);
        update_formats(&mut value, 1, 3, &[Format::new("em")]);
        assert!(value.formats.iter().all(|slot| Format::same(&slot[0], &em)));
        assert!(Format::same(&value.active_formats.unwrap()[0], &em));
    }

    #[test]
    fn update_formats_backwards_writes_nothing() {
        let mut value = Value::from_text("abc");
        update_formats(&mut value, 2, 1, &[Format::new("em")]);
        assert!(value.formats.iter().all(Vec::is_empty));
    }
}
