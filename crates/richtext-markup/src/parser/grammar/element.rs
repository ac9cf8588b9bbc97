//! Element, tag and attribute rules.

use super::content;
use crate::parser::{CompletedMarker, Parser};
use crate::syntax_kind::SyntaxKind;

/// Elements that never have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Parse `<name ...>`, its children and the matching end tag if present.
pub(super) fn element(p: &mut Parser<'_, '_>, open: &mut Vec<String>) {
    let m = p.start();
    let name = p.nth_text(1).to_ascii_lowercase();
    let self_closing = start_tag(p);

    if !self_closing && !is_void(&name) {
        open.push(name.clone());
        content(p, open);
        open.pop();

        if p.at(SyntaxKind::L_ANGLE_SLASH) && p.nth_text(1).eq_ignore_ascii_case(&name) {
            end_tag(p);
        }
    }

    m.complete(p, SyntaxKind::ELEMENT);
}

/// Parse a start tag. Returns true when it ended with `/>`.
fn start_tag(p: &mut Parser<'_, '_>) -> bool {
    let m = p.start();
    p.bump(); // <
    p.bump(); // name

    let mut self_closing = false;
    loop {
        match p.current() {
            SyntaxKind::NAME => attribute(p),
            SyntaxKind::R_ANGLE => {
                p.bump();
                break;
            }
            SyntaxKind::SLASH_R_ANGLE => {
                p.bump();
                self_closing = true;
                break;
            }
            kind if kind.is_tag_token() => p.bump(),
            _ => break,
        }
    }

    m.complete(p, SyntaxKind::START_TAG);
    self_closing
}

/// Parse `name`, `name=value`, `name = "value"`.
fn attribute(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // name

    let eq_ahead = p.at(SyntaxKind::EQ)
        || (p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::EQ);
    if eq_ahead {
        p.eat(SyntaxKind::WHITESPACE);
        p.bump(); // =
        p.eat(SyntaxKind::WHITESPACE);
        if p.at(SyntaxKind::QUOTED) {
            p.bump();
        } else {
            // Unquoted values may contain `/`, which the tag lexer splits off
            let mut n = 0;
            while matches!(p.nth(n), SyntaxKind::NAME | SyntaxKind::SLASH) {
                n += 1;
            }
            p.bump_n(n.min(u8::MAX as usize), SyntaxKind::NAME);
        }
    }

    m.complete(p, SyntaxKind::ATTRIBUTE);
}

/// Parse `</name ...>`.
fn end_tag(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let m = p.start();
    p.bump(); // </
    p.bump(); // name
    while p.current().is_tag_token() || p.at(SyntaxKind::SLASH_R_ANGLE) {
        p.bump();
    }
    p.eat(SyntaxKind::R_ANGLE);
    m.complete(p, SyntaxKind::END_TAG)
}

/// An end tag that closes nothing.
pub(super) fn stray_end_tag(p: &mut Parser<'_, '_>) {
    let end = end_tag(p);
    end.precede(p).complete(p, SyntaxKind::ERROR);
}
