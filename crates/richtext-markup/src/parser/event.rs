//! # Parser Events
//!
//! Events sit between parsing and tree building. The grammar never touches
//! rowan directly; it emits a flat sequence that the sink replays:
//!
//! ```text
//! Start(ELEMENT)
//!   Start(START_TAG)
//!     Token(L_ANGLE)
//!     Token(NAME)
//!     Token(R_ANGLE)
//!   Finish
//!   Token(TEXT)
//!   Start(END_TAG) ... Finish
//! Finish
//! ```
//!
//! `forward_parent` lets a completed node be wrapped after the fact. The
//! grammar uses it to wrap a stray end tag in an `ERROR` node once it knows
//! nothing was open to close.

use crate::syntax_kind::SyntaxKind;

/// An event emitted by the parser during tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new composite node.
    ///
    /// If `forward_parent` is set it points at another `Start` event that
    /// becomes this node's parent.
    Start {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },

    /// Add a token to the current node, gluing `n_raw_tokens` lexer tokens
    /// into one (used for unquoted attribute values such as `a/b`).
    Token { kind: SyntaxKind, n_raw_tokens: u8 },

    /// Finish the current node.
    Finish,

    /// Reserved slot for a node that may or may not be created.
    Placeholder,
}

impl Event {
    /// Create a start event with no forward parent.
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start {
            kind,
            forward_parent: None,
        }
    }

    /// Create a token event for a single raw token.
    pub fn token(kind: SyntaxKind) -> Self {
        Event::Token {
            kind,
            n_raw_tokens: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_start_creation() {
        assert_eq!(
            Event::start(SyntaxKind::ELEMENT),
            Event::Start {
                kind: SyntaxKind::ELEMENT,
                forward_parent: None
            }
        );
    }

    #[test]
    fn event_token_creation() {
        assert_eq!(
            Event::token(SyntaxKind::NAME),
            Event::Token {
                kind: SyntaxKind::NAME,
                n_raw_tokens: 1
            }
        );
    }
}
