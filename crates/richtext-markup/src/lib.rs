//! # richtext-markup
//!
//! A lossless HTML fragment syntax tree using [Rowan] + [Logos], following
//! the [rust-analyzer] architecture model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree → ast
//!               (Logos)          (Grammar)        (GreenNodeBuilder)
//! ```
//!
//! The tree keeps every byte, including malformed input: unclosed elements
//! are closed at the end of their parent, stray end tags land in `ERROR`
//! nodes, and a lone `<` is just text. Parsing never fails.
//!
//! The [`ast`] module gives typed access (element names, decoded attribute
//! values, decoded text) for consumers that build their own document model.
//!
//! ## Module Structure
//!
//! ```text
//! richtext-markup/
//! ├── lib.rs           # Public API and integration tests
//! ├── syntax_kind.rs   # SyntaxKind enum and Rowan integration
//! ├── lexer.rs         # Two-mode Logos tokenizer
//! ├── ast.rs           # Typed views: Element, Attribute, Child
//! └── parser/
//!     ├── mod.rs       # Parser, Marker system, parse()
//!     ├── event.rs     # Event enum
//!     ├── sink.rs      # Events → Rowan GreenNode
//!     └── grammar/     # Fragment and element rules
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use richtext_markup::{ast, parse, SyntaxKind};
//!
//! let tree = parse("a<em>b</em>");
//! assert_eq!(tree.text().to_string(), "a<em>b</em>");
//!
//! let children = ast::children(&tree);
//! assert_eq!(children.len(), 2);
//! assert!(matches!(&children[1], ast::Child::Element(e) if e.name() == "em"));
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use parser::{VOID_ELEMENTS, is_void, parse};
pub use syntax_kind::{HtmlLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    /// Format a syntax tree for snapshot testing.
    fn format_tree(node: &SyntaxNode, indent: usize) -> String {
        let mut result = String::new();
        let prefix = "  ".repeat(indent);

        result.push_str(&format!("{}{:?}\n", prefix, node.kind()));

        for child in node.children_with_tokens() {
            match child {
                rowan::NodeOrToken::Node(n) => {
                    result.push_str(&format_tree(&n, indent + 1));
                }
                rowan::NodeOrToken::Token(t) => {
                    result.push_str(&format!("{}  {:?} {:?}\n", prefix, t.kind(), t.text()));
                }
            }
        }

        result
    }

    #[test]
    fn snapshot_formatted_link() {
        let tree = parse(r#"<a href="x">y</a>"#);
        assert_snapshot!(format_tree(&tree, 0), @r#"
        ROOT
          ELEMENT
            START_TAG
              L_ANGLE "<"
              NAME "a"
              WHITESPACE " "
              ATTRIBUTE
                NAME "href"
                EQ "="
                QUOTED "\"x\""
              R_ANGLE ">"
            TEXT "y"
            END_TAG
              L_ANGLE_SLASH "</"
              NAME "a"
              R_ANGLE ">"
        "#);
    }

    #[test]
    fn snapshot_stray_end_tag() {
        let tree = parse("a</b>");
        assert_snapshot!(format_tree(&tree, 0), @r#"
        ROOT
          TEXT "a"
          ERROR
            END_TAG
              L_ANGLE_SLASH "</"
              NAME "b"
              R_ANGLE ">"
        "#);
    }

    // Real-world clipboard markup is messy; the tree must still hold every byte.
    #[test]
    fn messy_markup_roundtrips() {
        let inputs = [
            "<p>unclosed <b>bold <i>both</p> tail",
            "<<>><</>",
            "<a href=\"unterminated>text",
            "<img src=x onerror=alert(1)//>",
            "<!-- open comment",
            "<style>p { color: red }",
            "<ul><li>one<li>two<ul><li>nested</ul></ul>",
            "&amp; &bogus; &#x41;",
        ];

        for input in inputs {
            let tree = parse(input);
            assert_eq!(
                tree.text().to_string(),
                input,
                "Roundtrip failed for: {:?}",
                input
            );
        }
    }
}
