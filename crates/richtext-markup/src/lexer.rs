//! # Lexer - Tokenizing HTML Fragments
//!
//! Breaks markup into tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token. Nothing is skipped,
//! which is what lets a parsed fragment print back byte-for-byte:
//!
//! ```
//! use richtext_markup::lexer::lex;
//!
//! let input = "a <em class=\"x\">b</em>";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Two Modes
//!
//! HTML is not context free at the token level: `a = 'b'` is plain text
//! between tags but an attribute inside one. The lexer therefore runs two
//! Logos enums and switches between them:
//!
//! - [`ContentToken`] between tags: text runs, tag openers, comments and
//!   declarations.
//! - [`TagToken`] between `<name` and `>`: names, `=`, quoted values and
//!   whitespace.
//!
//! After the start tag of a raw-text element (`script`, `style`, `textarea`,
//! `title`) everything up to the matching end tag becomes one `RAW_TEXT`
//! token.
//!
//! ## Public API
//!
//! - [`lex`] - Tokenize input, returning `Vec<Token>`
//! - [`lex_with_spans`] - Tokenize with byte offset spans
//! - [`Token`] - A token with its kind and text slice

use std::ops::Range;

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

/// Elements whose content is not markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Tokens recognised between tags.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentToken {
    /// Character data
    #[regex(r"[^<]+")]
    Text,

    /// A `<` that does not open anything
    #[token("<")]
    LessThan,

    /// `<` followed by the tag name
    #[regex(r"<[a-zA-Z][^ \t\r\n\x0C/>]*")]
    StartTagOpen,

    /// `</` followed by the tag name
    #[regex(r"</[a-zA-Z][^ \t\r\n\x0C/>]*")]
    EndTagOpen,

    /// `<!--` through the next `-->`
    #[token("<!--", comment_body)]
    Comment,

    /// `<!doctype ...>` and other `<!...>` declarations
    #[regex(r"<![^-][^>]*>?")]
    Declaration,

    /// `<?...>`
    #[regex(r"<\?[^>]*>?")]
    ProcessingInstruction,

    /// `</` followed by something other than a letter, e.g. `<//funky>`
    #[regex(r"</[^a-zA-Z][^>]*>?")]
    BogusEndTag,
}

fn comment_body(lex: &mut logos::Lexer<ContentToken>) -> bool {
    let rest = lex.remainder();
    // `<!-->` and `<!--->` are complete, empty comments
    if rest.starts_with('>') {
        lex.bump(1);
    } else if rest.starts_with("->") {
        lex.bump(2);
    } else {
        match rest.find("-->") {
            Some(index) => lex.bump(index + 3),
            None => lex.bump(rest.len()),
        }
    }
    true
}

/// Tokens recognised inside a start or end tag.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagToken {
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    #[regex(r#"[^ \t\r\n\x0C"'>/=]+"#)]
    Name,

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*"?"#)]
    #[regex(r"'[^']*'?")]
    Quoted,

    #[token(">")]
    RAngle,

    #[token("/>")]
    SlashRAngle,

    #[token("/")]
    Slash,
}

impl TagToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::Name => SyntaxKind::NAME,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::Quoted => SyntaxKind::QUOTED,
            TagToken::RAngle => SyntaxKind::R_ANGLE,
            TagToken::SlashRAngle => SyntaxKind::SLASH_R_ANGLE,
            TagToken::Slash => SyntaxKind::SLASH,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut out = TokenSink { input, tokens: Vec::new() };
    let mut pos = 0;

    while pos < input.len() {
        pos = match lex_content(&mut out, pos) {
            None => input.len(),
            Some(open) => {
                let (after, closed) = lex_tag(&mut out, open.at);
                let raw = !open.end_tag
                    && closed
                    && RAW_TEXT_ELEMENTS
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(open.name));
                if raw {
                    lex_raw_text(&mut out, after, open.name)
                } else {
                    after
                }
            }
        };
    }

    out.tokens
}

struct TokenSink<'a> {
    input: &'a str,
    tokens: Vec<(Token<'a>, Range<usize>)>,
}

impl<'a> TokenSink<'a> {
    fn push(&mut self, kind: SyntaxKind, span: Range<usize>) {
        let text = &self.input[span.clone()];
        self.tokens.push((Token { kind, text }, span));
    }
}

/// Where content lexing stopped to hand over to the tag lexer.
struct TagOpen<'a> {
    at: usize,
    name: &'a str,
    end_tag: bool,
}

fn lex_content<'a>(out: &mut TokenSink<'a>, start: usize) -> Option<TagOpen<'a>> {
    let input = out.input;
    let mut lexer = ContentToken::lexer(&input[start..]);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let span = start + span.start..start + span.end;
        let kind = match result {
            Ok(ContentToken::StartTagOpen) => {
                out.push(SyntaxKind::L_ANGLE, span.start..span.start + 1);
                out.push(SyntaxKind::NAME, span.start + 1..span.end);
                return Some(TagOpen {
                    at: span.end,
                    name: &input[span.start + 1..span.end],
                    end_tag: false,
                });
            }
            Ok(ContentToken::EndTagOpen) => {
                out.push(SyntaxKind::L_ANGLE_SLASH, span.start..span.start + 2);
                out.push(SyntaxKind::NAME, span.start + 2..span.end);
                return Some(TagOpen {
                    at: span.end,
                    name: &input[span.start + 2..span.end],
                    end_tag: true,
                });
            }
            Ok(ContentToken::Declaration) => {
                let body = input[span.start + 2..span.end].as_bytes();
                if body.len() >= 7 && body[..7].eq_ignore_ascii_case(b"doctype") {
                    SyntaxKind::DOCTYPE
                } else {
                    SyntaxKind::BOGUS_COMMENT
                }
            }
            Ok(ContentToken::Comment) => SyntaxKind::COMMENT,
            Ok(ContentToken::ProcessingInstruction) | Ok(ContentToken::BogusEndTag) => {
                SyntaxKind::BOGUS_COMMENT
            }
            // Logos error means an unrecognised character - treat as TEXT
            Ok(ContentToken::Text) | Ok(ContentToken::LessThan) | Err(()) => SyntaxKind::TEXT,
        };
        out.push(kind, span);
    }

    None
}

/// Lex tag internals. Returns the position after the tag and whether it was
/// closed by a plain `>`.
fn lex_tag(out: &mut TokenSink<'_>, start: usize) -> (usize, bool) {
    let input = out.input;
    let mut lexer = TagToken::lexer(&input[start..]);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let span = start + span.start..start + span.end;
        let end = span.end;
        let kind = match result {
            Ok(token) => token.to_syntax_kind(),
            Err(()) => SyntaxKind::NAME,
        };
        out.push(kind, span);
        match kind {
            SyntaxKind::R_ANGLE => return (end, true),
            SyntaxKind::SLASH_R_ANGLE => return (end, false),
            _ => {}
        }
    }

    (input.len(), false)
}

fn lex_raw_text(out: &mut TokenSink<'_>, start: usize, name: &str) -> usize {
    let input = out.input;
    let end = find_end_tag(input, start, name).unwrap_or(input.len());
    if end > start {
        out.push(SyntaxKind::RAW_TEXT, start..end);
    }
    end
}

/// Find `</name` (ASCII case-insensitive) followed by a tag delimiter.
fn find_end_tag(input: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    input[from..]
        .match_indices("</")
        .map(|(index, _)| from + index)
        .find(|&at| {
            let name_start = at + 2;
            let name_end = name_start + name.len();
            let name_matches = bytes
                .get(name_start..name_end)
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
            let delimited = bytes
                .get(name_end)
                .is_none_or(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | b'/' | b'>'));
            name_matches && delimited
        })
}
