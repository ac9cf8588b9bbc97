//! Nested lists inside one text stream.
//!
//! Lines are delimited by [`LINE_SEPARATOR`]. The separator that opens a line
//! carries the line's list ancestry as markers, outermost first, so its depth
//! is the number of markers. The first line has no separator and depth 0.

use crate::value::{Format, LINE_SEPARATOR, Replacement, Value};

fn is_separator(chars: &[char], index: usize) -> bool {
    chars.get(index) == Some(&LINE_SEPARATOR)
}

fn depth(value: &Value, line_index: Option<usize>) -> usize {
    line_index.map_or(0, |index| value.markers_at(index).len())
}

fn markers(value: &Value, line_index: Option<usize>) -> Vec<Format> {
    line_index.map_or_else(Vec::new, |index| value.markers_at(index).to_vec())
}

fn set_markers(replacements: &mut [Option<Replacement>], index: usize, markers: Vec<Format>) {
    replacements[index] = (!markers.is_empty()).then_some(Replacement::Markers(markers));
}

/// The separator opening the line that holds `from`, strictly before it.
pub fn get_line_index(value: &Value, from: usize) -> Option<usize> {
    value
        .text
        .chars()
        .take(from)
        .collect::<Vec<_>>()
        .iter()
        .rposition(|c| *c == LINE_SEPARATOR)
}

/// The nearest earlier separator one level shallower than `line_index`.
pub fn get_parent_line_index(value: &Value, line_index: usize) -> Option<usize> {
    let wanted = value.markers_at(line_index).len().checked_sub(1)?;
    let chars = value.chars();
    (0..line_index)
        .rev()
        .filter(|&i| is_separator(&chars, i))
        .find(|&i| value.markers_at(i).len() == wanted)
}

/// The last separator after `line_index` that is at least as deep, stopping
/// at the first shallower one. `line_index` itself when there is none.
pub fn get_last_child_index(value: &Value, line_index: Option<usize>) -> Option<usize> {
    let line_depth = depth(value, line_index);
    let chars = value.chars();
    let mut child = line_index;
    for index in line_index.unwrap_or(0)..chars.len() {
        if !is_separator(&chars, index) {
            continue;
        }
        if value.markers_at(index).len() >= line_depth {
            child = Some(index);
        } else {
            break;
        }
    }
    child
}

/// A line can be indented while it is no deeper than the line above it.
pub fn can_indent_list_items(value: &Value) -> bool {
    let Some(start) = value.start else {
        return false;
    };
    let Some(line_index) = get_line_index(value, start) else {
        return false;
    };
    let previous = get_line_index(value, line_index);
    depth(value, Some(line_index)) <= depth(value, previous)
}

pub fn can_outdent_list_items(value: &Value) -> bool {
    value
        .start
        .is_some_and(|start| depth(value, get_line_index(value, start)) > 0)
}

/// The nearest earlier line exactly one level deeper, searching back only
/// through deeper lines.
fn get_target_level_line_index(value: &Value, line_index: usize) -> Option<usize> {
    let line_depth = value.markers_at(line_index).len();
    let chars = value.chars();
    for index in (0..line_index).rev() {
        if !is_separator(&chars, index) {
            continue;
        }
        let found = value.markers_at(index).len();
        if found == line_depth + 1 {
            return Some(index);
        }
        if found <= line_depth {
            return None;
        }
    }
    None
}

/// Indent every selected line one level.
///
/// A line joins an existing child list of the line above when there is one,
/// otherwise it opens a new list using the previous line's innermost marker,
/// or `root_format` at the top level.
pub fn indent_list_items(value: &Value, root_format: &Format) -> Value {
    if !can_indent_list_items(value) {
        return value.clone();
    }
    let (Some(start), Some(end)) = (value.start, value.end) else {
        return value.clone();
    };
    let Some(line_index) = get_line_index(value, start) else {
        return value.clone();
    };
    let previous = get_line_index(value, line_index);
    let target = get_target_level_line_index(value, line_index);
    let chars = value.chars();
    let mut replacements = value.replacements.clone();

    for index in line_index..end.min(chars.len()) {
        if !is_separator(&chars, index) {
            continue;
        }
        let own = match &replacements[index] {
            Some(replacement) => replacement.markers().to_vec(),
            None => Vec::new(),
        };
        let nesting = match target {
            Some(target) => {
                let target_markers = value.markers_at(target);
                let keep = target_markers.len().saturating_sub(1);
                let mut nesting = target_markers.to_vec();
                nesting.extend(own.iter().skip(keep).cloned());
                nesting
            }
            None => {
                let previous_markers = markers(value, previous);
                let last = previous_markers
                    .last()
                    .cloned()
                    .unwrap_or_else(|| root_format.clone());
                let keep = previous_markers.len();
                let mut nesting = previous_markers;
                nesting.push(last);
                nesting.extend(own.iter().skip(keep).cloned());
                nesting
            }
        };
        set_markers(&mut replacements, index, nesting);
    }

    Value {
        replacements,
        ..value.clone()
    }
}

/// Outdent the selected lines, and the children of the last one, by one level.
pub fn outdent_list_items(value: &Value) -> Value {
    if !can_outdent_list_items(value) {
        return value.clone();
    }
    let (Some(start), Some(end)) = (value.start, value.end) else {
        return value.clone();
    };
    let Some(starting_line) = get_line_index(value, start) else {
        return value.clone();
    };
    let parent_markers = markers(value, get_parent_line_index(value, starting_line));
    let Some(last_child) = get_last_child_index(value, get_line_index(value, end)) else {
        return value.clone();
    };
    let chars = value.chars();
    let mut replacements = value.replacements.clone();

    for index in starting_line..=last_child.min(chars.len().saturating_sub(1)) {
        if !is_separator(&chars, index) {
            continue;
        }
        let current = value.markers_at(index);
        let mut nesting = parent_markers.clone();
        nesting.extend(current.iter().skip(parent_markers.len() + 1).cloned());
        set_markers(&mut replacements, index, nesting);
    }

    Value {
        replacements,
        ..value.clone()
    }
}

/// Swap the list format of the selected lines for `new_format`.
///
/// Only the levels between the start line and the end line are touched;
/// the walk stops at the first line no deeper than the start line's parent.
pub fn change_list_type(value: &Value, new_format: &Format) -> Value {
    let (Some(start), Some(end)) = (value.start, value.end) else {
        return value.clone();
    };
    let starting_line = get_line_index(value, start);
    let start_count = depth(value, starting_line) as isize - 1;
    let end_count = depth(value, get_line_index(value, end)) as isize - 1;
    let from = starting_line
        .and_then(|line| get_parent_line_index(value, line))
        .map_or(0, |parent| parent + 1);

    let chars = value.chars();
    let mut replacements = value.replacements.clone();
    let mut changed = false;

    for index in from..chars.len() {
        if !is_separator(&chars, index) {
            continue;
        }
        let current = value.markers_at(index);
        if current.len() as isize <= start_count {
            break;
        }
        if current.is_empty() {
            continue;
        }
        changed = true;
        let nesting = current
            .iter()
            .enumerate()
            .map(|(i, format)| {
                let i = i as isize;
                if i < start_count || i > end_count {
                    format.clone()
                } else {
                    new_format.clone()
                }
            })
            .collect();
        set_markers(&mut replacements, index, nesting);
    }

    if !changed {
        return value.clone();
    }
    Value {
        replacements,
        ..value.clone()
    }
}

/// Whether the list around the caret's line is a `tag` list. Lines at depth
/// 0 belong to `root_tag`.
pub fn is_active_list_type(value: &Value, tag: &str, root_tag: &str) -> bool {
    let line_index = value.start.and_then(|start| get_line_index(value, start));
    match line_index.map(|index| value.markers_at(index)) {
        Some([.., innermost]) => innermost.type_name == tag,
        _ => tag == root_tag,
    }
}
