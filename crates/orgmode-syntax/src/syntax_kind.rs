//! SyntaxKind enum for all tokens and nodes in the Org CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree. A handful of
//! token kinds are zero-width structural markers produced by the scanner
//! (`LIST_START`, `LIST_END`, `END_SECTION`); they appear in the token stream
//! but never as leaves of the tree.

/// All syntax kinds for the Org CST.
///
/// This enum represents both tokens (scanner output) and composite nodes (parser output).
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (scanner output) ===
    /// Horizontal whitespace (spaces, tabs)
    WHITESPACE,
    /// Line ending (LF or CRLF)
    NEWLINE,
    /// Run of `*` opening a heading; its length is the section level
    STARS,
    /// Zero-width marker closing a section
    END_SECTION,
    /// Heading keyword (`TODO`, `DONE`, or a configured keyword)
    TODO_KEYWORD,
    /// Priority cookie `[#A]`
    PRIORITY,
    /// `COMMENT` flag on a heading
    COMMENT_FLAG,
    /// `#+KEY:` of a keyword line
    KEYWORD_KEY,
    /// `#+begin_` (case-insensitive)
    BLOCK_BEGIN_MARKER,
    /// `#+end_` (case-insensitive)
    BLOCK_END_MARKER,
    /// Literal `#+begin:`
    DYNAMIC_BEGIN,
    /// Literal `#+end:`
    DYNAMIC_END,
    /// Name following a block begin marker
    BLOCK_BEGIN_NAME,
    /// Name following a block end marker
    BLOCK_END_NAME,
    /// `:NAME:` opening a drawer
    DRAWER_NAME,
    /// `:END:` closing a drawer
    DRAWER_END,
    /// `:NAME:` of a node property
    PROPERTY_NAME,
    /// Raw rest-of-line text (block parameters, property values)
    TEXT,
    /// List bullet (`-`, `+`, `*`, `1.`, `1)`)
    BULLET,
    /// Zero-width marker opening a list
    LIST_START,
    /// Zero-width marker closing a list
    LIST_END,
    /// `[ ]`, `[-]` or `[X]`
    CHECKBOX,
    /// A whitespace-delimited word
    WORD,
    /// Opening markup delimiter (`*`, `/`, `_`, `=`, `~`, `+`)
    MARKUP_START,
    /// Closing markup delimiter
    MARKUP_END,
    /// Delimiter that looked like a markup start but is never closed
    INTERRUPTED_DELIMITER,
    /// `[[`
    LINK_START,
    /// Link target between `[[` and `]` (the "pathreg")
    LINK_PATH,
    /// `][` between path and description
    LINK_SEPARATOR,
    /// `]]`
    LINK_END,
    /// Whole `# comment` line (without its newline)
    COMMENT,
    /// Input the scanner could not classify
    ERROR_SENTINEL,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// Heading plus its body and subsections
    SECTION,
    /// Heading line
    HEADING,
    /// Heading title objects
    TITLE,
    /// Sequence of elements (zeroth section, section body, block body)
    BODY,
    /// Contents of a drawer or dynamic block
    CONTENTS,
    /// Contents of a list item
    CONTENT,
    /// `#+KEY: value`
    KEYWORD,
    /// `#+begin_NAME ... #+end_NAME`
    GREATER_BLOCK,
    /// `#+begin: NAME ... #+end:`
    DYNAMIC_BLOCK,
    /// `:NAME: ... :END:`
    DRAWER,
    /// `:KEY: value` inside a drawer
    NODE_PROPERTY,
    /// Parameters or value following a name
    VALUE,
    /// List of items at one indentation level
    LIST,
    /// Bulleted list item
    LIST_ITEM,
    /// Single line of objects
    PARAGRAPH,
    /// `# comment` line
    COMMENT_LINE,
    /// Empty or whitespace-only line
    BLANK_LINE,
    /// `*bold*`
    BOLD,
    /// `/italic/`
    ITALIC,
    /// `_underline_`
    UNDERLINE,
    /// `=verbatim=`
    VERBATIM,
    /// `~code~`
    CODE,
    /// `+strikethrough+`
    STRIKETHROUGH,
    /// `[[path][description]]`
    REGULAR_LINK,
    /// Link description objects
    DESCRIPTION,
    /// Unclosed markup start followed by the objects it failed to wrap
    INTERRUPTED_START,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (scanner output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia (whitespace/newlines).
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::NEWLINE)
    }

    /// Zero-width tokens the scanner emits to mark structure.
    pub fn is_structural_marker(self) -> bool {
        matches!(self, Self::LIST_START | Self::LIST_END | Self::END_SECTION)
    }

    /// Members of the `element` supertype.
    pub fn is_element(self) -> bool {
        matches!(
            self,
            Self::KEYWORD
                | Self::GREATER_BLOCK
                | Self::DYNAMIC_BLOCK
                | Self::DRAWER
                | Self::NODE_PROPERTY
                | Self::LIST
                | Self::PARAGRAPH
                | Self::COMMENT_LINE
                | Self::BLANK_LINE
                | Self::ERROR
        )
    }

    /// Members of the `object` supertype. `WORD` is a token, the rest are nodes.
    pub fn is_object(self) -> bool {
        self.is_markup()
            || matches!(
                self,
                Self::WORD | Self::REGULAR_LINK | Self::INTERRUPTED_START
            )
    }

    pub fn is_markup(self) -> bool {
        matches!(
            self,
            Self::BOLD
                | Self::ITALIC
                | Self::UNDERLINE
                | Self::VERBATIM
                | Self::CODE
                | Self::STRIKETHROUGH
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
pub enum OrgLang {}

impl rowan::Language for OrgLang {
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
pub type SyntaxNode = rowan::SyntaxNode<OrgLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<OrgLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<OrgLang>;
