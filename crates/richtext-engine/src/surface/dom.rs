//! Arena-backed element tree standing in for the live editable surface.
//!
//! Nodes are addressed by [`NodeId`] and never move, so a node that a diff
//! leaves alone keeps its identity. Detached nodes stay in the arena until
//! [`Dom::release`] hands their slots back for reuse.
//!
//! The `Dom` also carries the selection host: the current [`DomRange`], the
//! focused node, and a counter of selection writes.

use richtext_markup::ast::{self, Child};

use crate::tree::markup::{escape_text, is_raw_text, write_end_tag, write_start_tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    pub tag: String,
    /// In source order.
    pub attributes: Vec<(String, String)>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Fragment,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A boundary point: a char offset in a text node, a child index elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: DomPoint,
    pub end: DomPoint,
}

impl DomRange {
    pub fn new(start: DomPoint, end: DomPoint) -> Self {
        Self { start, end }
    }

    pub fn collapsed(point: DomPoint) -> Self {
        Self::new(point, point)
    }
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    selection: Option<DomRange>,
    active_element: Option<NodeId>,
    selection_writes: usize,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Fragment,
                parent: None,
                children: Vec::new(),
            }],
            free: Vec::new(),
            root: NodeId(0),
            selection: None,
            active_element: None,
            selection_writes: 0,
        }
    }

    /// Parse a markup fragment under a fresh root. Never fails.
    pub fn parse(markup: &str) -> Self {
        let mut dom = Self::new();
        let root = dom.root;
        dom.append_markup(root, markup);
        dom
    }

    /// Parse `markup` and append the resulting nodes to `parent`.
    pub fn append_markup(&mut self, parent: NodeId, markup: &str) {
        let tree = richtext_markup::parse(markup);
        self.lower(parent, ast::children(&tree));
    }

    fn lower(&mut self, parent: NodeId, children: Vec<Child>) {
        for child in children {
            let id = match child {
                Child::Element(element) => {
                    let attributes = element
                        .attributes()
                        .iter()
                        .map(|attr| (attr.name(), attr.value()))
                        .collect();
                    let id = self.create_element(element.name(), attributes);
                    self.append_child(parent, id);
                    self.lower(id, element.children());
                    continue;
                }
                Child::Text(text) | Child::RawText(text) => self.create_text(text),
                Child::Comment(data) => self.create_comment(data),
            };
            self.append_child(parent, id);
        }
    }

    /// Drop every node and start over with an empty root.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Slots in the arena, live or free.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    pub fn create_element(
        &mut self,
        tag: impl Into<String>,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        self.alloc(NodeData::Element(ElementData {
            tag: tag.into(),
            attributes,
            namespace: None,
        }))
    }

    pub fn create_element_ns(&mut self, element: ElementData) -> NodeId {
        self.alloc(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(data.into()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Lowercase tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// `#text`, `#comment`, `#fragment` or the tag name.
    pub fn node_name(&self, id: NodeId) -> &str {
        match self.data(id) {
            NodeData::Fragment => "#fragment",
            NodeData::Element(element) => &element.tag,
            NodeData::Text(_) => "#text",
            NodeData::Comment(_) => "#comment",
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeData::Text(text) = &mut self.node_mut(id).data {
            *text = value.into();
        }
    }

    pub fn push_text(&mut self, id: NodeId, c: char) {
        if let NodeData::Text(text) = &mut self.node_mut(id).data {
            text.push(c);
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id).map_or(&[], |e| e.attributes.as_slice())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(element) = &mut self.node_mut(id).data {
            match element.attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => element
                    .attributes
                    .push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(element) = &mut self.node_mut(id).data {
            element.attributes.retain(|(n, _)| n != name);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Whether `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Unlink `id` from its parent. The node stays valid.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|c| *c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Detach `id` and free its whole subtree. Ids into it must not be used
    /// afterwards; a selection or focus inside it is dropped.
    pub fn release(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let inside = |node: NodeId| self.contains(id, node);
        let drop_selection = self
            .selection
            .is_some_and(|range| inside(range.start.node) || inside(range.end.node));
        let drop_focus = self.active_element.is_some_and(inside);
        if drop_selection {
            self.selection = None;
        }
        if drop_focus {
            self.active_element = None;
        }
        self.detach(id);

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let node = self.node_mut(next);
            pending.append(&mut node.children);
            node.data = NodeData::Fragment;
            node.parent = None;
            self.free.push(next);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    pub fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) {
        self.detach(new_child);
        let Some(index) = self.children(parent).iter().position(|c| *c == old_child) else {
            return;
        };
        self.node_mut(parent).children[index] = new_child;
        self.node_mut(new_child).parent = Some(parent);
        self.node_mut(old_child).parent = None;
    }

    /// Deep-copy `id` from `other` into this arena, detached.
    pub fn import(&mut self, other: &Dom, id: NodeId) -> NodeId {
        let copy = self.alloc(other.data(id).clone());
        for &child in other.children(id) {
            let child_copy = self.import(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Structural equality of two subtrees. Attribute order is ignored.
    pub fn is_equal_node(&self, id: NodeId, other: &Dom, other_id: NodeId) -> bool {
        let same_data = match (self.data(id), other.data(other_id)) {
            (NodeData::Element(a), NodeData::Element(b)) => {
                a.tag == b.tag
                    && a.namespace == b.namespace
                    && a.attributes.len() == b.attributes.len()
                    && a.attributes.iter().all(|attr| b.attributes.contains(attr))
            }
            (a, b) => a == b,
        };
        same_data
            && self.children(id).len() == other.children(other_id).len()
            && self
                .children(id)
                .iter()
                .zip(other.children(other_id))
                .all(|(&a, &b)| self.is_equal_node(a, other, b))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(_) => {}
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let namespace = self.element(id).and_then(|e| e.namespace.as_deref());
        let raw = self.tag(id).is_some_and(is_raw_text);
        for &child in self.children(id) {
            self.write_node(child, &mut out, namespace, raw);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out, None, false);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String, namespace: Option<&str>, raw: bool) {
        match self.data(id) {
            NodeData::Text(text) if raw => out.push_str(text),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Comment(data) => {
                out.push_str("<!--");
                out.push_str(data);
                out.push_str("-->");
            }
            NodeData::Fragment => {
                for &child in self.children(id) {
                    self.write_node(child, out, namespace, raw);
                }
            }
            NodeData::Element(element) => {
                let own = element.namespace.as_deref();
                let xmlns = own.filter(|ns| Some(*ns) != namespace);
                write_start_tag(out, &element.tag, &element.attributes, xmlns);
                let child_namespace = own.or(namespace);
                let raw = is_raw_text(&element.tag);
                for &child in self.children(id) {
                    self.write_node(child, out, child_namespace, raw);
                }
                write_end_tag(out, &element.tag, self.has_children(id));
            }
        }
    }

    pub fn selection(&self) -> Option<&DomRange> {
        self.selection.as_ref()
    }

    /// Replace the selection. Like a browser, this focuses the editing host
    /// that holds the range.
    pub fn set_selection(&mut self, range: DomRange) {
        self.selection = Some(range);
        self.selection_writes += 1;
        self.active_element = Some(self.editing_host(range.start.node));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// How many times the selection was written.
    pub fn selection_writes(&self) -> usize {
        self.selection_writes
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn focus(&mut self, id: NodeId) {
        self.active_element = Some(id);
    }

    /// Nearest `contenteditable="true"` ancestor, else the topmost one.
    fn editing_host(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            if self.attribute(current, "contenteditable") == Some("true") {
                return current;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }
}
