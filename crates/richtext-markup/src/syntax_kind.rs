//! SyntaxKind enum for all tokens and nodes in the HTML CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the HTML CST.
///
/// `repr(u16)` keeps the kind compact inside rowan's green tree.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Whitespace between attributes inside a tag
    WHITESPACE,
    /// Character data between tags
    TEXT,
    /// `<` opening a start tag
    L_ANGLE,
    /// `</` opening an end tag
    L_ANGLE_SLASH,
    /// `>` closing a tag
    R_ANGLE,
    /// `/>` closing a self-closing tag
    SLASH_R_ANGLE,
    /// A stray `/` inside a tag
    SLASH,
    /// `=` between attribute name and value
    EQ,
    /// Tag name, attribute name or unquoted attribute value
    NAME,
    /// Single- or double-quoted attribute value, quotes included
    QUOTED,
    /// `<!-- ... -->`
    COMMENT,
    /// `<?...>`, `<!...>` and `</` followed by a non-letter
    BOGUS_COMMENT,
    /// `<!doctype ...>`
    DOCTYPE,
    /// Contents of `script`, `style`, `textarea` and `title`
    RAW_TEXT,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root fragment node
    ROOT,
    /// An element: start tag, children and optional end tag
    ELEMENT,
    /// `<name attr=value ...>`
    START_TAG,
    /// `</name>`
    END_TAG,
    /// `name`, `name=value` or `name="value"`
    ATTRIBUTE,

    /// Error recovery node (stray end tags)
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true for tokens that only appear between `<` and `>`.
    pub fn is_tag_token(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::SLASH | Self::EQ | Self::NAME | Self::QUOTED
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HtmlLang {}

impl rowan::Language for HtmlLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<HtmlLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<HtmlLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<HtmlLang>;
