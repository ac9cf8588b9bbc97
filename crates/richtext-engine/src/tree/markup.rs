//! String backend for the tree builder.

use richtext_markup::is_void;

use super::{ElementSpec, TreeOptions, TreeSink, build_tree};
use crate::registry::FormatRegistry;
use crate::value::Value;

/// Serialize a value to markup.
pub fn to_html_string(value: &Value, multiline_tag: Option<&str>, registry: &FormatRegistry) -> String {
    let options = TreeOptions {
        multiline_tag: multiline_tag.map(str::to_string),
        preserve_white_space: false,
        is_editable_tree: false,
    };
    let mut tree = HtmlTree::new();
    build_tree(value, &options, registry, &mut tree);
    tree.to_html()
}

#[derive(Debug, Clone)]
enum HtmlNode {
    Root,
    Element(ElementSpec),
    Text(String),
    Html(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Entry {
    node: HtmlNode,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// A throwaway tree that only knows how to print itself.
#[derive(Debug, Clone)]
pub struct HtmlTree {
    entries: Vec<Entry>,
}

impl Default for HtmlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlTree {
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                node: HtmlNode::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn push(&mut self, parent: usize, node: HtmlNode) -> usize {
        let id = self.entries.len();
        self.entries.push(Entry {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.entries[parent].children.push(id);
        id
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write(0, &mut out, None);
        out
    }

    fn write(&self, id: usize, out: &mut String, namespace: Option<&str>) {
        let entry = &self.entries[id];
        match &entry.node {
            HtmlNode::Root => {
                for &child in &entry.children {
                    self.write(child, out, namespace);
                }
            }
            HtmlNode::Text(text) => out.push_str(&escape_text(text)),
            HtmlNode::Html(html) => out.push_str(html),
            HtmlNode::Comment(data) => {
                out.push_str("<!--");
                out.push_str(data);
                out.push_str("-->");
            }
            HtmlNode::Element(element) => {
                let own = element.namespace.as_deref();
                let xmlns = own.filter(|ns| Some(*ns) != namespace);
                write_start_tag(out, &element.tag, &element.attributes, xmlns);
                let child_namespace = own.or(namespace);
                for &child in &entry.children {
                    self.write(child, out, child_namespace);
                }
                let has_content = entry.children.iter().any(|&c| !self.is_empty_text(c));
                write_end_tag(out, &element.tag, has_content);
            }
        }
    }

    fn is_empty_text(&self, id: usize) -> bool {
        matches!(&self.entries[id].node, HtmlNode::Text(t) if t.is_empty())
    }
}

impl TreeSink for HtmlTree {
    type Node = usize;

    fn root(&self) -> usize {
        0
    }

    fn append_element(&mut self, parent: &usize, element: ElementSpec) -> usize {
        self.push(*parent, HtmlNode::Element(element))
    }

    fn append_text(&mut self, parent: &usize, text: &str) -> usize {
        self.push(*parent, HtmlNode::Text(text.to_string()))
    }

    fn append_html(&mut self, parent: &usize, html: &str) {
        self.push(*parent, HtmlNode::Html(html.to_string()));
    }

    fn append_comment(&mut self, parent: &usize, data: &str) {
        self.push(*parent, HtmlNode::Comment(data.to_string()));
    }

    fn last_child(&self, node: &usize) -> Option<usize> {
        self.entries[*node].children.last().copied()
    }

    fn parent(&self, node: &usize) -> Option<usize> {
        self.entries[*node].parent
    }

    fn is_text(&self, node: &usize) -> bool {
        matches!(self.entries[*node].node, HtmlNode::Text(_))
    }

    fn text_len(&self, node: &usize) -> usize {
        match &self.entries[*node].node {
            HtmlNode::Text(text) => text.chars().count(),
            _ => 0,
        }
    }

    fn push_text(&mut self, node: &usize, c: char) {
        if let HtmlNode::Text(text) = &mut self.entries[*node].node {
            text.push(c);
        }
    }

    fn remove(&mut self, node: &usize) {
        if let Some(parent) = self.entries[*node].parent.take() {
            self.entries[parent].children.retain(|c| c != node);
        }
    }
}

/// Escape `&`, `<` and `>` in character data.
pub(crate) fn escape_text(text: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Elements whose content is written without escaping.
pub(crate) fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

/// Attribute names a parser would read back as one name.
pub(crate) fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace()
                || c.is_control()
                || matches!(c, '"' | '\'' | '>' | '/' | '=' | '<')
                || ('\u{fdd0}'..='\u{fdef}').contains(&c)
        })
}

pub(crate) fn write_start_tag(
    out: &mut String,
    tag: &str,
    attributes: &[(String, String)],
    xmlns: Option<&str>,
) {
    out.push('<');
    out.push_str(tag);
    if let Some(namespace) = xmlns {
        if !attributes.iter().any(|(name, _)| name == "xmlns") {
            write_attribute(out, "xmlns", namespace);
        }
    }
    for (name, value) in attributes {
        if is_valid_attribute_name(name) {
            write_attribute(out, name, value);
        }
    }
    out.push('>');
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

/// Void elements without content get no end tag.
pub(crate) fn write_end_tag(out: &mut String, tag: &str, has_content: bool) {
    if has_content || !is_void(tag) {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Format, LINE_SEPARATOR, Replacement};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn html(value: &Value) -> String {
        to_html_string(value, None, &FormatRegistry::new())
    }

    #[test]
    fn merges_runs_sharing_handles() {
        let em = Format::new("em");
        let mut value = Value::from_text("test");
        for slot in &mut value.formats {
            slot.push(em.clone());
        }
        assert_eq!(html(&value), "<em>test</em>");
    }

    #[test]
    fn equal_but_distinct_handles_open_new_elements() {
        let mut value = Value::from_text("ab");
        value.formats[0] = vec![Format::new("em")];
        value.formats[1] = vec![Format::new("em")];
        assert_eq!(html(&value), "<em>a</em><em>b</em>");
    }

    #[test]
    fn escapes_text_and_attributes() {
        let link = Format::with_attributes("a", [("title", "\"q\" & <x>"), ("bad name", "v")]);
        let mut value = Value::from_text("<&>");
        for slot in &mut value.formats {
            slot.push(link.clone());
        }
        assert_snapshot!(html(&value), @r#"<a title="&quot;q&quot; &amp; &lt;x&gt;">&lt;&amp;&gt;</a>"#);
    }

    #[test]
    fn line_breaks_and_objects() {
        let mut value = Value::from_text("a\n\u{fffc}");
        value.replacements[2] = Some(Replacement::Object(Format::with_attributes(
            "img",
            [("src", "x.png")],
        )));
        assert_eq!(html(&value), r#"a<br><img src="x.png">"#);
    }

    #[test]
    fn comment_object() {
        let mut value = Value::from_text("\u{fffc}");
        value.replacements[0] = Some(Replacement::Object(Format::with_attributes(
            "#comment",
            [("data-rich-text-comment", " note ")],
        )));
        assert_eq!(html(&value), "<!-- note -->");
    }

    #[test]
    fn script_is_decoded() {
        let mut value = Value::from_text("\u{fffc}");
        value.replacements[0] = Some(Replacement::Object(Format::with_attributes(
            "script",
            [("data-rich-text-script", "alert%28%221%22%29")],
        )));
        assert_eq!(html(&value), r#"<script>alert("1")</script>"#);
    }

    #[test]
    fn multiline_nested_list() {
        let ul = Format::new("ul");
        let mut value = Value::from_text(&format!("one{LINE_SEPARATOR}two"));
        value.replacements[3] = Some(Replacement::Markers(vec![ul]));
        assert_eq!(
            to_html_string(&value, Some("li"), &FormatRegistry::new()),
            "<li>one<ul><li>two</li></ul></li>"
        );
    }

    #[test]
    fn multiline_flat_lines() {
        let value = Value::from_text(&format!("a{LINE_SEPARATOR}b{LINE_SEPARATOR}"));
        assert_eq!(
            to_html_string(&value, Some("p"), &FormatRegistry::new()),
            "<p>a</p><p>b</p><p></p>"
        );
    }

    #[test]
    fn namespace_emitted_where_it_changes() {
        let mut tree = HtmlTree::new();
        let svg = tree.append_element(
            &0,
            ElementSpec {
                tag: "svg".into(),
                namespace: Some("http://www.w3.org/2000/svg".into()),
                ..ElementSpec::default()
            },
        );
        tree.append_element(
            &svg,
            ElementSpec {
                tag: "g".into(),
                namespace: Some("http://www.w3.org/2000/svg".into()),
                ..ElementSpec::default()
            },
        );
        assert_eq!(
            tree.to_html(),
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g></g></svg>"#
        );
    }

    #[test]
    fn attribute_name_validation() {
        assert!(is_valid_attribute_name("data-x"));
        assert!(!is_valid_attribute_name("a b"));
        assert!(!is_valid_attribute_name("a\"b"));
        assert!(!is_valid_attribute_name(""));
    }
}
