//! Building a [`Value`] from markup, plain text or a live element tree.

use std::sync::OnceLock;

use regex::Regex;

use super::{
    Attributes, Format, FormatData, Formats, LINE_SEPARATOR, OBJECT_REPLACEMENT, Replacement, Value,
    ZWNBSP, char_slice,
};
use crate::registry::FormatRegistry;
use crate::surface::{Dom, DomRange, NodeData, NodeId};

fn line_break_pattern() -> &'static Regex {
    static LINE_BREAK_REGEX: OnceLock<Regex> = OnceLock::new();
    LINE_BREAK_REGEX
        .get_or_init(|| Regex::new(r"[\n\r\t\x0C]+ *").expect("Invalid line break regex"))
}

fn space_run_pattern() -> &'static Regex {
    static SPACE_RUN_REGEX: OnceLock<Regex> = OnceLock::new();
    SPACE_RUN_REGEX.get_or_init(|| Regex::new(r" {2,}").expect("Invalid space run regex"))
}

const DISABLED_PREFIX: &str = "data-disable-rich-text-";
const INTERNAL_PREFIX: &str = "data-rich-text-";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Read only children with this tag, one line each.
    pub multiline_tag: Option<String>,
    /// Elements inside a line that open a nested level of lines.
    pub multiline_wrapper_tags: Vec<String>,
    pub preserve_white_space: bool,
    /// The source is the live surface: padding `br`s are skipped.
    pub is_editable_tree: bool,
}

impl CreateOptions {
    /// Lines of `tag`; `li` lines nest through `ul` and `ol`.
    pub fn multiline(tag: &str) -> Self {
        let multiline_wrapper_tags = if tag == "li" {
            vec!["ul".to_string(), "ol".to_string()]
        } else {
            Vec::new()
        };
        Self {
            multiline_tag: Some(tag.to_string()),
            multiline_wrapper_tags,
            ..Self::default()
        }
    }
}

/// Where a value is read from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Empty,
    /// Taken verbatim.
    Text(&'a str),
    /// Parsed, with whitespace collapsed unless it is preserved.
    Markup(&'a str),
    /// An existing tree, optionally with a range to map to `start`/`end`.
    Element {
        dom: &'a Dom,
        root: NodeId,
        range: Option<&'a DomRange>,
    },
}

pub fn create(source: Source<'_>, options: &CreateOptions, registry: &FormatRegistry) -> Value {
    match source {
        Source::Empty => Value::new(),
        Source::Text(text) => Value::from_text(text),
        Source::Markup("") => Value::new(),
        Source::Markup(markup) => {
            let dom = Dom::parse(markup);
            let reader = Reader {
                dom: &dom,
                options,
                registry,
                collapse: !options.preserve_white_space,
            };
            reader.read(dom.root(), None)
        }
        Source::Element { dom, root, range } => {
            let reader = Reader {
                dom,
                options,
                registry,
                collapse: false,
            };
            reader.read(root, range.copied())
        }
    }
}

pub fn create_from_markup(markup: &str, options: &CreateOptions, registry: &FormatRegistry) -> Value {
    create(Source::Markup(markup), options, registry)
}

struct Reader<'a> {
    dom: &'a Dom,
    options: &'a CreateOptions,
    registry: &'a FormatRegistry,
    collapse: bool,
}

impl Reader<'_> {
    fn read(&self, root: NodeId, mut range: Option<DomRange>) -> Value {
        match &self.options.multiline_tag {
            Some(_) => self.lines(root, &mut range, &[]),
            None => self.element(root, &mut range, &[], true),
        }
    }

    fn element(
        &self,
        element: NodeId,
        range: &mut Option<DomRange>,
        wrappers: &[Format],
        is_root: bool,
    ) -> Value {
        let mut acc = Value::new();
        let children = self.dom.children(element);
        if children.is_empty() {
            accumulate_selection(&mut acc, self.dom, element, range.as_ref(), &Value::new());
            return acc;
        }

        let last = children.len() - 1;
        for (index, &node) in children.iter().enumerate() {
            match self.dom.data(node) {
                NodeData::Text(raw) => {
                    let trim_start = is_root && index == 0;
                    let trim_end = is_root && index == last;
                    let text = self.filter(raw, trim_start, trim_end);
                    if let Some(r) = range.as_mut() {
                        let text_len = text.chars().count();
                        let adjust = |offset: usize| {
                            let prefix = char_slice(raw, 0, offset);
                            self.filter(prefix, trim_start, false)
                                .chars()
                                .count()
                                .min(text_len)
                        };
                        if r.start.node == node {
                            r.start.offset = adjust(r.start.offset);
                        }
                        if r.end.node == node {
                            r.end.offset = adjust(r.end.offset);
                        }
                    }
                    let piece = Value::from_text(&text);
                    accumulate_selection(&mut acc, self.dom, node, range.as_ref(), &piece);
                    merge(&mut acc, piece);
                }
                NodeData::Comment(data) => {
                    let piece = comment_piece(data);
                    accumulate_selection(&mut acc, self.dom, node, range.as_ref(), &piece);
                    merge(&mut acc, piece);
                }
                NodeData::Element(_) => self.child_element(&mut acc, node, range, wrappers),
                NodeData::Fragment => {}
            }
        }
        acc
    }

    fn child_element(
        &self,
        acc: &mut Value,
        node: NodeId,
        range: &mut Option<DomRange>,
        wrappers: &[Format],
    ) {
        let dom = self.dom;
        let tag = dom.tag(node).unwrap_or_default();

        if tag == "span" {
            if let Some(data) = dom.attribute(node, "data-rich-text-comment") {
                let piece = comment_piece(data);
                accumulate_selection(acc, dom, node, range.as_ref(), &piece);
                merge(acc, piece);
                return;
            }
        }

        if tag == "br" {
            accumulate_selection(acc, dom, node, range.as_ref(), &Value::new());
            let padding = self.options.is_editable_tree
                && dom.attribute(node, "data-rich-text-line-break").is_none();
            if !padding {
                merge(acc, Value::from_text("\n"));
            }
            return;
        }

        if tag == "script" {
            let source = match dom.attribute(node, "data-rich-text-script") {
                Some(encoded) => encoded.to_string(),
                None => urlencoding::encode(&dom.inner_html(node)).into_owned(),
            };
            let piece = object_piece(Format::with_attributes(
                "script",
                [("data-rich-text-script", source)],
            ));
            accumulate_selection(acc, dom, node, range.as_ref(), &piece);
            merge(acc, piece);
            return;
        }

        let (format, editable) = self.to_format(tag, get_attributes(dom, node));

        if !editable {
            accumulate_selection(acc, dom, node, range.as_ref(), &Value::new());
            let mut data = format.data().clone();
            data.inner_html = Some(dom.inner_html(node));
            merge(acc, object_piece(Format::from_data(data)));
            return;
        }

        if self
            .options
            .multiline_wrapper_tags
            .iter()
            .any(|wrapper| wrapper == tag)
        {
            let mut nested = wrappers.to_vec();
            nested.push(format);
            let value = self.lines(node, range, &nested);
            accumulate_selection(acc, dom, node, range.as_ref(), &value);
            merge(acc, value);
            return;
        }

        let mut value = self.element(node, range, &[], false);
        accumulate_selection(acc, dom, node, range.as_ref(), &value);

        if dom.attribute(node, "data-rich-text-placeholder").is_some() {
            merge(acc, value);
        } else if value.text.is_empty() {
            if format.attributes.is_some() {
                merge(acc, object_piece(format));
            }
        } else {
            for slot in &mut value.formats {
                slot.insert(0, format.clone());
            }
            if let Some(previous) = acc.formats.last() {
                share_with_previous(previous, &mut value.formats);
            }
            merge(acc, value);
        }
    }

    /// Lines of `element`, separated by line separators carrying `wrappers`.
    fn lines(&self, element: NodeId, range: &mut Option<DomRange>, wrappers: &[Format]) -> Value {
        let mut acc = Value::new();
        let Some(line_tag) = self.options.multiline_tag.as_deref() else {
            return self.element(element, range, wrappers, true);
        };

        let mut first = true;
        for &node in self.dom.children(element) {
            if self.dom.tag(node) != Some(line_tag) {
                continue;
            }
            let value = self.element(node, range, wrappers, true);
            if !first || !wrappers.is_empty() {
                let markers = (!wrappers.is_empty()).then(|| Replacement::Markers(wrappers.to_vec()));
                acc.text.push(LINE_SEPARATOR);
                acc.formats.push(Vec::new());
                acc.replacements.push(markers);
            }
            first = false;
            accumulate_selection(&mut acc, self.dom, node, range.as_ref(), &value);
            merge(&mut acc, value);
        }
        acc
    }

    /// Map an element to a format through the registry. The flag is `false`
    /// for non-editable format types.
    fn to_format(&self, tag: &str, attributes: Option<Attributes>) -> (Format, bool) {
        let mut attributes = attributes;

        let by_class = attributes
            .as_ref()
            .and_then(|attrs| attrs.get("class"))
            .and_then(|class| self.registry.get_format_type_for_class_name(class));
        if let (Some(format_type), Some(attrs)) = (by_class, attributes.as_mut()) {
            if let (Some(class), Some(class_name)) =
                (attrs.get("class"), format_type.class_name.as_deref())
            {
                let remaining = format!(" {class} ")
                    .replacen(&format!(" {class_name} "), " ", 1)
                    .trim()
                    .to_string();
                if remaining.is_empty() {
                    attrs.remove("class");
                } else {
                    attrs.insert("class".to_string(), remaining);
                }
            }
        }

        let Some(format_type) =
            by_class.or_else(|| self.registry.get_format_type_for_bare_element(tag))
        else {
            let data = FormatData {
                type_name: tag.to_string(),
                attributes,
                ..FormatData::default()
            };
            return (Format::from_data(data), true);
        };

        let Some(mut rest) = attributes else {
            return (Format::new(format_type.name.clone()), format_type.editable);
        };

        let mut registered = Attributes::new();
        for (key, name) in &format_type.attributes {
            if let Some(value) = rest.remove(name) {
                registered.insert(key.clone(), value);
            }
        }
        if !format_type.editable {
            rest.remove("contenteditable");
        }

        let data = FormatData {
            type_name: format_type.name.clone(),
            attributes: Some(registered),
            unregistered_attributes: Some(rest),
            inner_html: None,
        };
        (Format::from_data(data), format_type.editable)
    }

    /// Drop reserved characters and, for markup, collapse whitespace.
    fn filter(&self, text: &str, trim_start: bool, trim_end: bool) -> String {
        let mut text: String = text
            .chars()
            .filter(|c| *c != OBJECT_REPLACEMENT && *c != ZWNBSP)
            .collect();
        if !self.collapse {
            return text;
        }
        if line_break_pattern().is_match(&text) {
            text = line_break_pattern().replace_all(&text, " ").into_owned();
        }
        if text.contains("  ") {
            text = space_run_pattern().replace_all(&text, " ").into_owned();
        }
        if trim_start && text.starts_with(' ') {
            text.remove(0);
        }
        if trim_end && text.ends_with(' ') {
            text.pop();
        }
        text
    }
}

/// Surviving attributes of an element, `None` if nothing survives.
///
/// Editor markers are dropped and event handlers are renamed so they never run.
fn get_attributes(dom: &Dom, node: NodeId) -> Option<Attributes> {
    let mut attributes: Option<Attributes> = None;
    for (name, value) in dom.attributes(node) {
        if name.starts_with(INTERNAL_PREFIX) {
            continue;
        }
        let safe_name = if name.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("on")) {
            format!("{DISABLED_PREFIX}{name}")
        } else {
            name.clone()
        };
        attributes
            .get_or_insert_with(Attributes::new)
            .insert(safe_name, value.clone());
    }
    attributes
}

fn object_piece(format: Format) -> Value {
    Value {
        text: OBJECT_REPLACEMENT.to_string(),
        formats: vec![Vec::new()],
        replacements: vec![Some(Replacement::Object(format))],
        ..Value::default()
    }
}

fn comment_piece(data: &str) -> Value {
    object_piece(Format::with_attributes(
        "#comment",
        [("data-rich-text-comment", data)],
    ))
}

/// Continue the runs of `previous` into `formats` wherever the leading slot
/// matches it structurally, depth by depth from the outside in.
fn share_with_previous(previous: &[Format], formats: &mut [Formats]) {
    let Some(first) = formats.first().cloned() else {
        return;
    };
    for (depth, (left, right)) in previous.iter().zip(&first).enumerate() {
        if left != right {
            break;
        }
        if Format::same(left, right) {
            continue;
        }
        for slot in formats.iter_mut() {
            match slot.get_mut(depth) {
                Some(format) if Format::same(format, right) => *format = left.clone(),
                _ => break,
            }
        }
    }
}
fn merge(acc: &mut Value, piece: Value) {
    acc.text.push_str(&piece.text);
    acc.formats.extend(piece.formats);
    acc.replacements.extend(piece.replacements);
}

/// Map the range boundaries that concern `node` onto offsets in `acc`.
///
/// `value` is what `node` contributes; a selection already found inside it
/// takes precedence.
fn accumulate_selection(
    acc: &mut Value,
    dom: &Dom,
    node: NodeId,
    range: Option<&DomRange>,
    value: &Value,
) {
    let Some(range) = range else {
        return;
    };
    let parent = dom.parent(node);
    let current = acc.len();
    let value_len = value.len();
    let is_text = dom.is_text(node);
    let child_at = |container: NodeId, index: Option<usize>| {
        parent == Some(container) && index.and_then(|i| dom.child(container, i)) == Some(node)
    };

    let (container, offset) = (range.start.node, range.start.offset);
    if let Some(start) = value.start {
        acc.start = Some(current + start);
    } else if node == container && is_text {
        acc.start = Some(current + offset);
    } else if child_at(container, Some(offset)) {
        acc.start = Some(current);
    } else if child_at(container, offset.checked_sub(1)) {
        acc.start = Some(current + value_len);
    } else if node == container {
        acc.start = Some(current);
    }

    let (container, offset) = (range.end.node, range.end.offset);
    if let Some(end) = value.end {
        acc.end = Some(current + end);
    } else if node == container && is_text {
        acc.end = Some(current + offset);
    } else if child_at(container, offset.checked_sub(1)) {
        acc.end = Some(current + value_len);
    } else if child_at(container, Some(offset)) {
        acc.end = Some(current);
    } else if node == container {
        acc.end = Some(current + offset);
    }
}
