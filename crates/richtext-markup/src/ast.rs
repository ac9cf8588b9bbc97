//! Typed views over the untyped CST.
//!
//! The CST keeps every byte; these wrappers answer the questions a consumer
//! actually asks: what is this element called, what are its attributes, what
//! text does it hold once entities are decoded.

use std::borrow::Cow;

use crate::syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// A child of the root or of an element, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(Element),
    /// Character data with entities decoded. Adjacent text tokens are merged.
    Text(String),
    /// Comment data, without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Raw text of `script`/`style`/`textarea`/`title`, undecoded.
    RawText(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(SyntaxNode);

impl Element {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::ELEMENT).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    fn start_tag(&self) -> Option<SyntaxNode> {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::START_TAG)
    }

    /// Lowercase tag name.
    pub fn name(&self) -> String {
        self.start_tag()
            .and_then(|tag| {
                tag.children_with_tokens()
                    .filter_map(SyntaxElement::into_token)
                    .find(|t| t.kind() == SyntaxKind::NAME)
            })
            .map(|t| t.text().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Attributes in source order. A repeated name keeps its first value.
    pub fn attributes(&self) -> Vec<Attribute> {
        let mut seen: Vec<String> = Vec::new();
        self.start_tag()
            .into_iter()
            .flat_map(|tag| tag.children())
            .filter_map(Attribute::cast)
            .filter(|attr| {
                let name = attr.name();
                if seen.contains(&name) {
                    false
                } else {
                    seen.push(name);
                    true
                }
            })
            .collect()
    }

    /// Whether the element was written as `<x/>`.
    pub fn is_self_closing(&self) -> bool {
        self.start_tag().is_some_and(|tag| {
            tag.children_with_tokens()
                .filter_map(SyntaxElement::into_token)
                .any(|t| t.kind() == SyntaxKind::SLASH_R_ANGLE)
        })
    }

    pub fn children(&self) -> Vec<Child> {
        children(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute(SyntaxNode);

impl Attribute {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::ATTRIBUTE).then_some(Self(node))
    }

    fn tokens(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.0
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
    }

    /// Lowercase attribute name.
    pub fn name(&self) -> String {
        self.tokens()
            .find(|t| t.kind() == SyntaxKind::NAME)
            .map(|t| t.text().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Decoded value; an attribute written without `=` has an empty value.
    pub fn value(&self) -> String {
        let mut after_eq = false;
        for token in self.tokens() {
            match token.kind() {
                SyntaxKind::EQ => after_eq = true,
                SyntaxKind::QUOTED if after_eq => {
                    return decode(unquote(token.text())).into_owned();
                }
                SyntaxKind::NAME if after_eq => return decode(token.text()).into_owned(),
                _ => {}
            }
        }
        String::new()
    }
}

fn unquote(raw: &str) -> &str {
    let quote = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return raw,
    };
    let inner = &raw[1..];
    inner.strip_suffix(quote).unwrap_or(inner)
}

fn decode(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Children of the root or an element.
///
/// Doctypes, stray end tags and the tags themselves are dropped.
pub fn children(node: &SyntaxNode) -> Vec<Child> {
    let mut out: Vec<Child> = Vec::new();
    let mut pending_text = String::new();

    for element in node.children_with_tokens() {
        let child = match element {
            SyntaxElement::Token(token) => match token.kind() {
                SyntaxKind::TEXT => {
                    pending_text.push_str(token.text());
                    continue;
                }
                SyntaxKind::COMMENT => Child::Comment(comment_data(token.text()).to_string()),
                SyntaxKind::BOGUS_COMMENT => match bogus_comment_data(token.text()) {
                    Some(data) => Child::Comment(data.to_string()),
                    None => continue,
                },
                SyntaxKind::RAW_TEXT => Child::RawText(token.text().to_string()),
                _ => continue,
            },
            SyntaxElement::Node(node) => match Element::cast(node) {
                Some(element) => Child::Element(element),
                None => continue,
            },
        };
        flush_text(&mut out, &mut pending_text);
        out.push(child);
    }
    flush_text(&mut out, &mut pending_text);

    out
}

fn flush_text(out: &mut Vec<Child>, pending: &mut String) {
    if !pending.is_empty() {
        out.push(Child::Text(decode(pending).into_owned()));
        pending.clear();
    }
}

fn comment_data(raw: &str) -> &str {
    let inner = raw.strip_prefix("<!--").unwrap_or(raw);
    inner.strip_suffix("-->").unwrap_or(inner)
}

/// `<//funky>` → `/funky`, `<?pi?>` → `?pi?`, `<!x>` → `x`. `</>` is dropped.
fn bogus_comment_data(raw: &str) -> Option<&str> {
    let inner = raw.strip_suffix('>').unwrap_or(raw);
    let data = if let Some(rest) = inner.strip_prefix("</") {
        rest
    } else if let Some(rest) = inner.strip_prefix("<!") {
        rest
    } else {
        inner.strip_prefix('<').unwrap_or(inner)
    };
    (raw != "</>").then_some(data)
}
