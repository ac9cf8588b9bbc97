//! Value → nested element tree.
//!
//! [`build_tree`] walks the value one offset at a time and keeps a pointer to
//! the deepest open node. At each offset it compares the effective format
//! list with the previous offset's list, entry by entry, by handle identity:
//! an unbroken prefix of identical handles descends into elements that are
//! already open, the first mismatch opens a new element at that depth.
//!
//! The builder only talks to a [`TreeSink`]. [`markup::HtmlTree`] serializes
//! to a string; the surface reconciler builds straight into a [`Dom`].
//!
//! [`Dom`]: crate::surface::Dom

pub mod markup;

use crate::editing::get_active_formats;
use crate::registry::FormatRegistry;
use crate::value::{Format, LINE_SEPARATOR, OBJECT_REPLACEMENT, Value, ZWNBSP};

pub use markup::{HtmlTree, to_html_string};

/// An element to create, already mapped through the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub namespace: Option<String>,
    /// Objects never receive children from the builder.
    pub object: bool,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }
}

/// Node factory and navigation the builder needs.
pub trait TreeSink {
    type Node: Clone + PartialEq;

    fn root(&self) -> Self::Node;
    fn append_element(&mut self, parent: &Self::Node, element: ElementSpec) -> Self::Node;
    fn append_text(&mut self, parent: &Self::Node, text: &str) -> Self::Node;
    /// Trusted markup, inserted verbatim.
    fn append_html(&mut self, parent: &Self::Node, html: &str);
    fn append_comment(&mut self, parent: &Self::Node, data: &str);
    fn last_child(&self, node: &Self::Node) -> Option<Self::Node>;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn is_text(&self, node: &Self::Node) -> bool;
    /// Length in chars; 0 for anything but text.
    fn text_len(&self, node: &Self::Node) -> usize;
    fn push_text(&mut self, node: &Self::Node, c: char);
    fn remove(&mut self, node: &Self::Node);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeOptions {
    pub multiline_tag: Option<String>,
    pub preserve_white_space: bool,
    /// Build for the live surface: padding, boundary marker, `contenteditable`.
    pub is_editable_tree: bool,
}

/// A text node and a char offset inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePoint<N> {
    pub node: N,
    pub offset: usize,
}

/// Where the value's selection ended up in the built tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSelection<N> {
    pub start: Option<TreePoint<N>>,
    pub end: Option<TreePoint<N>>,
}

impl<N> Default for TreeSelection<N> {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
        }
    }
}

/// Whether `a` and `b` hold the same handles at every depth up to `index`.
fn is_equal_until(a: &[Format], b: &[Format], index: usize) -> bool {
    (0..=index).all(|k| match (a.get(k), b.get(k)) {
        (Some(x), Some(y)) => Format::same(x, y),
        _ => false,
    })
}

struct Builder<'a, S: TreeSink> {
    sink: &'a mut S,
    tree: S::Node,
    selection: TreeSelection<S::Node>,
}

impl<S: TreeSink> Builder<'_, S> {
    fn parent_of(&self, node: &S::Node) -> S::Node {
        self.sink.parent(node).unwrap_or_else(|| self.tree.clone())
    }

    /// Follow last children down to a text node.
    fn deepest_text(&self, mut node: S::Node) -> Option<S::Node> {
        while !self.sink.is_text(&node) {
            node = self.sink.last_child(&node)?;
        }
        Some(node)
    }

    fn point(&self, node: &S::Node) -> TreePoint<S::Node> {
        TreePoint {
            node: node.clone(),
            offset: self.sink.text_len(node),
        }
    }

    /// Move selection points off a text node that was dropped.
    fn retarget(&mut self, removed: &S::Node, replacement: &S::Node) {
        for point in [&mut self.selection.start, &mut self.selection.end]
            .into_iter()
            .flatten()
        {
            if point.node == *removed {
                *point = TreePoint {
                    node: replacement.clone(),
                    offset: 0,
                };
            }
        }
    }

    fn mark_selection(&mut self, value: &Value, index: usize, node: &S::Node) {
        if value.start == Some(index) {
            self.selection.start = Some(self.point(node));
        }
        if value.end == Some(index) {
            self.selection.end = Some(self.point(node));
        }
    }
}

/// Build `value` into `sink` and report where the selection landed.
pub fn build_tree<S: TreeSink>(
    value: &Value,
    options: &TreeOptions,
    registry: &FormatRegistry,
    sink: &mut S,
) -> TreeSelection<S::Node> {
    let chars = value.chars();
    let len = chars.len();
    let editable = options.is_editable_tree;
    let tree = sink.root();
    let mut b = Builder {
        sink,
        tree: tree.clone(),
        selection: TreeSelection::default(),
    };

    let multiline_format = options.multiline_tag.as_deref().map(Format::new);
    let deepest_active = if editable {
        get_active_formats(value).last().cloned()
    } else {
        None
    };

    let mut last_separator_formats: Vec<Format> = Vec::new();
    let mut last_character_formats: Option<Vec<Format>> = None;
    let mut last_character: Option<char> = None;

    match &multiline_format {
        Some(container) => {
            let line = b
                .sink
                .append_element(&tree, ElementSpec::new(container.type_name.clone()));
            b.sink.append_text(&line, "");
            last_separator_formats = vec![container.clone()];
            last_character_formats = Some(last_separator_formats.clone());
        }
        None => {
            b.sink.append_text(&tree, "");
        }
    }

    for i in 0..=len {
        let character = chars.get(i).copied();
        let should_insert_padding = editable
            && matches!(last_character, None | Some(LINE_SEPARATOR) | Some('\n'));
        let mut character_formats: Vec<Format> = value.formats.get(i).cloned().unwrap_or_default();

        if let Some(container) = &multiline_format {
            if character == Some(LINE_SEPARATOR) {
                let mut list = vec![container.clone()];
                for marker in value.markers_at(i) {
                    list.push(marker.clone());
                    list.push(container.clone());
                }
                last_separator_formats = list.clone();
                character_formats = list;
            } else {
                let mut list = last_separator_formats.clone();
                list.extend(character_formats);
                character_formats = list;
            }
        }

        let mut pointer = b.sink.last_child(&tree).unwrap_or_else(|| tree.clone());

        if should_insert_padding && character == Some(LINE_SEPARATOR) {
            if let Some(node) = b.deepest_text(pointer.clone()) {
                let parent = b.parent_of(&node);
                b.sink.append_text(&parent, &ZWNBSP.to_string());
            }
        }

        if last_character == Some(LINE_SEPARATOR) {
            if let Some(node) = b.deepest_text(pointer.clone()) {
                b.mark_selection(value, i, &node);
            }
        }

        for (format_index, format) in character_formats.iter().enumerate() {
            let continues = last_character_formats.as_ref().is_some_and(|last| {
                is_equal_until(&character_formats, last, format_index)
            }) && (character != Some(LINE_SEPARATOR)
                || character_formats.len() - 1 != format_index);

            if continues {
                if let Some(child) = b.sink.last_child(&pointer) {
                    pointer = child;
                    continue;
                }
            }

            let boundary = editable
                && character != Some(LINE_SEPARATOR)
                && deepest_active
                    .as_ref()
                    .is_some_and(|active| Format::same(active, format));
            let parent = b.parent_of(&pointer);
            let spec = element_for_format(format, boundary, false, registry, editable);
            let new_node = b.sink.append_element(&parent, spec);

            let stale = b.sink.is_text(&pointer) && b.sink.text_len(&pointer) == 0;
            if stale {
                b.sink.remove(&pointer);
            }

            let text = b.sink.append_text(&new_node, "");
            if stale {
                b.retarget(&pointer, &text);
            }
            pointer = text;
        }

        if character == Some(LINE_SEPARATOR) {
            last_character_formats = Some(character_formats);
            last_character = character;
            continue;
        }

        if i == 0 {
            b.mark_selection(value, 0, &pointer);
        }

        match character {
            Some(OBJECT_REPLACEMENT) => {
                let parent = b.parent_of(&pointer);
                if let Some(format) = value.object_at(i) {
                    append_object(&mut b, &parent, format, registry, editable);
                }
                pointer = b.sink.append_text(&parent, "");
            }
            Some('\n') if !options.preserve_white_space => {
                let parent = b.parent_of(&pointer);
                let mut br = ElementSpec::new("br");
                br.object = true;
                if editable {
                    br.set_attribute("data-rich-text-line-break", "true");
                }
                b.sink.append_element(&parent, br);
                pointer = b.sink.append_text(&parent, "");
            }
            Some(c) => {
                if b.sink.is_text(&pointer) {
                    b.sink.push_text(&pointer, c);
                } else {
                    let parent = b.parent_of(&pointer);
                    pointer = b.sink.append_text(&parent, &c.to_string());
                }
            }
            None => {
                if !b.sink.is_text(&pointer) {
                    let parent = b.parent_of(&pointer);
                    pointer = b.sink.append_text(&parent, "");
                }
            }
        }

        b.mark_selection(value, i + 1, &pointer);

        if should_insert_padding && i == len {
            let parent = b.parent_of(&pointer);
            b.sink.append_text(&parent, &ZWNBSP.to_string());
        }

        last_character_formats = Some(character_formats);
        last_character = character;
    }

    b.selection
}

fn append_object<S: TreeSink>(
    b: &mut Builder<'_, S>,
    parent: &S::Node,
    format: &Format,
    registry: &FormatRegistry,
    editable: bool,
) {
    match format.type_name.as_str() {
        "script" if !editable => {
            let source = format
                .attribute("data-rich-text-script")
                .map(|encoded| {
                    urlencoding::decode(encoded)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| encoded.to_string())
                })
                .unwrap_or_default();
            let script = b.sink.append_element(parent, ElementSpec::new("script"));
            b.sink.append_html(&script, &source);
        }
        "#comment" => {
            let data = format.attribute("data-rich-text-comment").unwrap_or_default();
            if editable {
                let mut outer = ElementSpec::new("span");
                outer.set_attribute("data-rich-text-comment", data);
                outer.set_attribute("contenteditable", "false");
                let span = b.sink.append_element(parent, outer);
                let inner = b.sink.append_element(&span, ElementSpec::new("span"));
                b.sink.append_text(&inner, data);
            } else {
                b.sink.append_comment(parent, data);
            }
        }
        _ => {
            let object = format.inner_html.is_none();
            let spec = element_for_format(format, false, object, registry, editable);
            let node = b.sink.append_element(parent, spec);
            if let Some(html) = &format.inner_html {
                b.sink.append_html(&node, html);
            }
        }
    }
}

/// Map a format back to an element through the registry.
pub fn element_for_format(
    format: &Format,
    boundary: bool,
    object: bool,
    registry: &FormatRegistry,
    editable: bool,
) -> ElementSpec {
    let mut spec = ElementSpec {
        object,
        ..ElementSpec::default()
    };

    match registry.get_format_type(&format.type_name) {
        None => {
            spec.tag = format.type_name.clone();
            if let Some(attributes) = &format.attributes {
                for (name, value) in attributes {
                    spec.set_attribute(name, value);
                }
            }
            if boundary {
                spec.set_attribute("data-rich-text-format-boundary", "true");
            }
        }
        Some(format_type) => {
            spec.tag = format_type.tag_name.clone();
            spec.namespace = format_type.namespace.clone();
            if let Some(unregistered) = &format.unregistered_attributes {
                for (name, value) in unregistered {
                    spec.set_attribute(name, value);
                }
            }
            if boundary {
                spec.set_attribute("data-rich-text-format-boundary", "true");
            }
            if let Some(attributes) = &format.attributes {
                for (key, value) in attributes {
                    let name = format_type
                        .attributes
                        .get(key)
                        .map_or(key.as_str(), String::as_str);
                    spec.set_attribute(name, value);
                }
            }
            if let Some(class_name) = &format_type.class_name {
                let class = match spec.attributes.iter().find(|(n, _)| n == "class") {
                    Some((_, existing)) => format!("{class_name} {existing}"),
                    None => class_name.clone(),
                };
                spec.set_attribute("class", &class);
            }
            if editable && !format_type.editable {
                spec.set_attribute("contenteditable", "false");
            }
        }
    }

    if !editable {
        restore_on_attributes(&mut spec.attributes);
    }
    spec
}

const DISABLED_PREFIX: &str = "data-disable-rich-text-";

/// `data-disable-rich-text-onclick` → `onclick`.
fn restore_on_attributes(attributes: &mut [(String, String)]) {
    for (name, _) in attributes.iter_mut() {
        if let Some(original) = name.strip_prefix(DISABLED_PREFIX) {
            *name = original.to_string();
        }
    }
}
