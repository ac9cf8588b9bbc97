//! # Grammar Rules
//!
//! Tree construction for HTML fragments. The rules are deliberately small:
//!
//! - Void elements and `/>` tags have no children.
//! - An end tag closes the nearest open element with the same name; the
//!   elements in between are closed implicitly.
//! - An end tag with no matching open element is wrapped in `ERROR`.
//! - `<li>` closes an open `<li>`, `<p>` closes an open `<p>`.
//!
//! Nothing here fails: every token ends up in the tree, so the fragment
//! prints back byte-for-byte.

mod element;

pub use element::{VOID_ELEMENTS, is_void};

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the root fragment.
pub fn root(p: &mut Parser<'_, '_>) {
    let m = p.start();
    // Nothing is open at the root, so content only stops at EOF
    content(p, &mut Vec::new());
    m.complete(p, SyntaxKind::ROOT);
}

/// Parse children until EOF or an end tag that closes one of `open`.
///
/// `open` holds the lowercase names of the enclosing elements, innermost last.
fn content(p: &mut Parser<'_, '_>, open: &mut Vec<String>) {
    loop {
        match p.current() {
            SyntaxKind::EOF => break,
            SyntaxKind::L_ANGLE => {
                if closes_implicitly(open, p.nth_text(1)) {
                    break;
                }
                element::element(p, open);
            }
            SyntaxKind::L_ANGLE_SLASH => {
                let name = p.nth_text(1);
                if open.iter().any(|o| o.eq_ignore_ascii_case(name)) {
                    break;
                }
                element::stray_end_tag(p);
            }
            _ => p.bump(),
        }
    }
}

/// Whether a new `<name>` start tag ends the innermost open element.
fn closes_implicitly(open: &[String], name: &str) -> bool {
    match open.last() {
        Some(last) => {
            (last == "li" && name.eq_ignore_ascii_case("li"))
                || (last == "p" && name.eq_ignore_ascii_case("p"))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::syntax_kind::{SyntaxKind, SyntaxNode};
    use pretty_assertions::assert_eq;

    fn kinds(node: &SyntaxNode) -> Vec<SyntaxKind> {
        node.children().map(|n| n.kind()).collect()
    }

    #[test]
    fn text_preservation() {
        let inputs = [
            "",
            "plain",
            "<em>a</em>",
            "<b><i>x</b></i>",
            "</stray>",
            "<ul><li>a<li>b</ul>",
            "<a href=x/y title='t'>l</a>",
            "<img src=\"\">",
            "<script>a < b</script>",
            "<p>unclosed",
        ];
        for input in inputs {
            assert_eq!(crate::parse(input).text().to_string(), input);
        }
    }

    #[test]
    fn void_elements_have_no_children() {
        let tree = parse("<br>a");
        let br = tree.children().next().unwrap();
        assert_eq!(kinds(&br), vec![SyntaxKind::START_TAG]);
        assert_eq!(br.text().to_string(), "<br>");
    }

    #[test]
    fn nested_elements() {
        let tree = parse("<b><i>x</i></b>");
        let b = tree.children().next().unwrap();
        assert_eq!(
            kinds(&b),
            vec![SyntaxKind::START_TAG, SyntaxKind::ELEMENT, SyntaxKind::END_TAG]
        );
    }

    #[test]
    fn misnested_end_tag_closes_outer() {
        // </b> closes both <i> and <b>; the trailing </i> is stray.
        let tree = parse("<b><i>x</b></i>");
        assert_eq!(kinds(&tree), vec![SyntaxKind::ELEMENT, SyntaxKind::ERROR]);
        let b = tree.children().next().unwrap();
        let i = b.children().nth(1).unwrap();
        assert_eq!(kinds(&i), vec![SyntaxKind::START_TAG]);
    }

    #[test]
    fn stray_end_tag_becomes_error() {
        let tree = parse("a</x>b");
        assert_eq!(kinds(&tree), vec![SyntaxKind::ERROR]);
        let error = tree.children().next().unwrap();
        assert_eq!(kinds(&error), vec![SyntaxKind::END_TAG]);
    }

    #[test]
    fn list_items_close_implicitly() {
        let tree = parse("<ul><li>a<li>b</ul>");
        let ul = tree.children().next().unwrap();
        assert_eq!(
            kinds(&ul),
            vec![
                SyntaxKind::START_TAG,
                SyntaxKind::ELEMENT,
                SyntaxKind::ELEMENT,
                SyntaxKind::END_TAG
            ]
        );
    }

    #[test]
    fn self_closing_tag() {
        let tree = parse("<span/>x");
        let span = tree.children().next().unwrap();
        assert_eq!(kinds(&span), vec![SyntaxKind::START_TAG]);
    }

    #[test]
    fn attributes_are_nodes() {
        let tree = parse("<a href=\"x\" hidden>");
        let start = tree.children().next().unwrap().children().next().unwrap();
        assert_eq!(
            kinds(&start),
            vec![SyntaxKind::ATTRIBUTE, SyntaxKind::ATTRIBUTE]
        );
    }
}
