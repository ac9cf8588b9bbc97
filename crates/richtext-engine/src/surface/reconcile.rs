//! Bring the live surface in line with a value while touching as little of
//! it as possible.
//!
//! [`render`] builds the value into a scratch [`Dom`] and records the
//! selection as index paths. [`patch`] walks the live subtree and the scratch
//! tree side by side, by child index, and only replaces what differs.
//! [`restore_selection`] resolves the paths against the patched live tree.

use super::dom::{Dom, DomPoint, DomRange, ElementData, NodeData, NodeId};
use crate::registry::FormatRegistry;
use crate::tree::{ElementSpec, TreeOptions, TreePoint, TreeSink, build_tree};
use crate::value::Value;

/// Builds straight into a [`Dom`] below `root`.
struct DomSink<'a> {
    dom: &'a mut Dom,
    root: NodeId,
}

impl TreeSink for DomSink<'_> {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn append_element(&mut self, parent: &NodeId, element: ElementSpec) -> NodeId {
        let id = self.dom.create_element_ns(ElementData {
            tag: element.tag,
            attributes: element.attributes,
            namespace: element.namespace,
        });
        self.dom.append_child(*parent, id);
        id
    }

    fn append_text(&mut self, parent: &NodeId, text: &str) -> NodeId {
        let id = self.dom.create_text(text);
        self.dom.append_child(*parent, id);
        id
    }

    fn append_html(&mut self, parent: &NodeId, html: &str) {
        self.dom.append_markup(*parent, html);
    }

    fn append_comment(&mut self, parent: &NodeId, data: &str) {
        let id = self.dom.create_comment(data);
        self.dom.append_child(*parent, id);
    }

    fn last_child(&self, node: &NodeId) -> Option<NodeId> {
        self.dom.last_child(*node)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.dom.parent(*node)
    }

    fn is_text(&self, node: &NodeId) -> bool {
        self.dom.is_text(*node)
    }

    fn text_len(&self, node: &NodeId) -> usize {
        self.dom.text(*node).map_or(0, |text| text.chars().count())
    }

    fn push_text(&mut self, node: &NodeId, c: char) {
        self.dom.push_text(*node, c);
    }

    fn remove(&mut self, node: &NodeId) {
        self.dom.detach(*node);
    }
}

/// Child indices from the rendered root down to a text node, then the char
/// offset inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPaths {
    pub start: Vec<usize>,
    pub end: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub body: NodeId,
    pub selection: Option<SelectionPaths>,
}

/// Build `value` into `scratch`, which is cleared first.
pub fn render(
    value: &Value,
    options: &TreeOptions,
    registry: &FormatRegistry,
    scratch: &mut Dom,
) -> Rendered {
    scratch.reset();
    let body = scratch.root();
    let mut sink = DomSink {
        dom: &mut *scratch,
        root: body,
    };
    let selection = build_tree(value, options, registry, &mut sink);

    let to_path = |point: TreePoint<NodeId>| {
        let mut path = path_to(scratch, body, point.node)?;
        path.push(point.offset);
        Some(path)
    };
    let selection = match (selection.start, selection.end) {
        (Some(start), Some(end)) => to_path(start)
            .zip(to_path(end))
            .map(|(start, end)| SelectionPaths { start, end }),
        _ => None,
    };
    Rendered { body, selection }
}

/// Child indices leading from `root` to `node`, if `node` lies below it.
fn path_to(dom: &Dom, root: NodeId, node: NodeId) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = node;
    while current != root {
        path.push(dom.index_in_parent(current)?);
        current = dom.parent(current)?;
    }
    path.reverse();
    Some(path)
}

/// Patch `current_node`'s children in `current` to match `future_node`'s in
/// `future`.
///
/// A child that is structurally equal is left alone. One with the same name
/// is updated in place, attributes first, then its children. Anything else
/// is replaced by a copy of the future node. Extra children are removed.
pub fn patch(future: &Dom, future_node: NodeId, current: &mut Dom, current_node: NodeId) {
    let future_children = future.children(future_node).to_vec();
    for (index, &future_child) in future_children.iter().enumerate() {
        let Some(current_child) = current.child(current_node, index) else {
            let copy = current.import(future, future_child);
            current.append_child(current_node, copy);
            continue;
        };

        if current.is_equal_node(current_child, future, future_child) {
            continue;
        }

        if needs_replacement(current.data(current_child), future.data(future_child)) {
            let copy = current.import(future, future_child);
            current.replace_child(current_node, copy, current_child);
            current.release(current_child);
            continue;
        }

        let current_attributes = current.attributes(current_child).to_vec();
        for (name, _) in &current_attributes {
            if future.attribute(future_child, name).is_none() {
                current.remove_attribute(current_child, name);
            }
        }
        for (name, value) in future.attributes(future_child) {
            if current.attribute(current_child, name) != Some(value.as_str()) {
                current.set_attribute(current_child, name, value);
            }
        }
        patch(future, future_child, current, current_child);
    }

    while let Some(extra) = current.child(current_node, future_children.len()) {
        current.release(extra);
    }
}

fn needs_replacement(current: &NodeData, future: &NodeData) -> bool {
    match (current, future) {
        (NodeData::Element(a), NodeData::Element(b)) => {
            a.tag != b.tag || a.namespace != b.namespace
        }
        (NodeData::Text(a), NodeData::Text(b)) => a != b,
        (NodeData::Comment(a), NodeData::Comment(b)) => a != b,
        (NodeData::Fragment, NodeData::Fragment) => false,
        _ => true,
    }
}

fn resolve(dom: &Dom, root: NodeId, path: &[usize]) -> Option<DomPoint> {
    let (offset, steps) = path.split_last()?;
    let node = steps
        .iter()
        .try_fold(root, |node, &index| dom.child(node, index))?;
    Some(DomPoint::new(node, *offset))
}

/// Select `paths` in the live tree below `root`.
///
/// Nothing is written when a path does not resolve or the selection is
/// already there, and focus stays where it was. Returns whether the
/// selection was written.
pub fn restore_selection(paths: &SelectionPaths, current: &mut Dom, root: NodeId) -> bool {
    let (Some(start), Some(end)) = (
        resolve(current, root, &paths.start),
        resolve(current, root, &paths.end),
    ) else {
        log::debug!("selection path no longer resolves: {paths:?}");
        return false;
    };
    let range = DomRange::new(start, end);
    if current.selection() == Some(&range) {
        return false;
    }

    let focused = current.active_element();
    current.set_selection(range);
    if let Some(previous) = focused {
        if current.active_element() != Some(previous) {
            current.focus(previous);
        }
    }
    true
}

/// Render `value`, patch it into `root`, then restore the selection unless
/// the value has none or only the tree should change.
pub fn apply(
    value: &Value,
    current: &mut Dom,
    root: NodeId,
    options: &TreeOptions,
    registry: &FormatRegistry,
    scratch: &mut Dom,
    dom_only: bool,
) {
    let rendered = render(value, options, registry, scratch);
    patch(scratch, rendered.body, current, root);
    if value.start.is_none() || dom_only {
        return;
    }
    if let Some(paths) = &rendered.selection {
        restore_selection(paths, current, root);
    }
}
