//! Typed views over the untyped Rowan tree.
//!
//! Each wrapper is a newtype around a [`SyntaxNode`] of one kind. Accessors
//! return `Option` because the tree is always error tolerant: a block without
//! its end line simply has no `end_name`.
//!
//! ```
//! use orgmode_syntax::ast::{AstNode, Document};
//!
//! let tree = orgmode_syntax::parse("* TODO [#A] Write docs\n");
//! let doc = Document::cast(tree.root_node()).unwrap();
//! let heading = doc.sections().next().unwrap().heading().unwrap();
//! assert_eq!(heading.keyword().unwrap().text(), "TODO");
//! assert_eq!(heading.priority(), Some('A'));
//! ```

use crate::scanner::MarkupKind;
use crate::syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
use crate::tree::NodeExt;

pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;

    fn cast(node: SyntaxNode) -> Option<Self>;

    fn syntax(&self) -> &SyntaxNode;

    fn text(&self) -> String {
        self.syntax().text().to_string()
    }
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                Self::can_cast(node.kind()).then(|| Self(node))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(
    /// The whole document.
    Document => ROOT
);
ast_node!(Section => SECTION);
ast_node!(Heading => HEADING);
ast_node!(Title => TITLE);
ast_node!(
    /// A run of elements: the zeroth section, a section body or a greater
    /// block body.
    Body => BODY
);
ast_node!(Contents => CONTENTS);
ast_node!(Content => CONTENT);
ast_node!(Keyword => KEYWORD);
ast_node!(GreaterBlock => GREATER_BLOCK);
ast_node!(DynamicBlock => DYNAMIC_BLOCK);
ast_node!(Drawer => DRAWER);
ast_node!(NodeProperty => NODE_PROPERTY);
ast_node!(Value => VALUE);
ast_node!(List => LIST);
ast_node!(ListItem => LIST_ITEM);
ast_node!(Paragraph => PARAGRAPH);
ast_node!(CommentLine => COMMENT_LINE);
ast_node!(BlankLine => BLANK_LINE);
ast_node!(RegularLink => REGULAR_LINK);
ast_node!(Description => DESCRIPTION);
ast_node!(InterruptedStart => INTERRUPTED_START);
ast_node!(ErrorNode => ERROR);

/// Any of the six markup kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Markup(SyntaxNode);

impl AstNode for Markup {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind.is_markup()
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        Self::can_cast(node.kind()).then(|| Self(node))
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.0
    }
}

fn children<N: AstNode>(node: &SyntaxNode) -> impl Iterator<Item = N> + use<N> {
    node.children().filter_map(N::cast)
}

fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

fn field_token(node: &SyntaxNode, name: &str) -> Option<SyntaxToken> {
    node.field(name)?.into_token()
}

fn field_node<N: AstNode>(node: &SyntaxNode, name: &str) -> Option<N> {
    node.field(name)?.into_node().and_then(N::cast)
}

fn elements(node: &SyntaxNode) -> impl Iterator<Item = Element> + use<> {
    node.children().filter_map(Element::cast)
}

fn objects(node: &SyntaxNode) -> impl Iterator<Item = Object> + use<> {
    node.children_with_tokens().filter_map(Object::cast)
}

impl Document {
    pub fn zeroth_section(&self) -> Option<Body> {
        field_node(&self.0, "zeroth_section")
    }

    pub fn sections(&self) -> impl Iterator<Item = Section> + use<> {
        children(&self.0)
    }
}

impl Section {
    pub fn heading(&self) -> Option<Heading> {
        field_node(&self.0, "heading")
    }

    pub fn body(&self) -> Option<Body> {
        field_node(&self.0, "body")
    }

    pub fn subsections(&self) -> impl Iterator<Item = Section> + use<> {
        children(&self.0)
    }

    pub fn level(&self) -> usize {
        self.heading().map_or(0, |h| h.level())
    }
}

impl Heading {
    pub fn stars(&self) -> Option<SyntaxToken> {
        field_token(&self.0, "stars")
    }

    pub fn level(&self) -> usize {
        self.stars().map_or(0, |s| s.text().len())
    }

    pub fn keyword(&self) -> Option<SyntaxToken> {
        field_token(&self.0, "keyword")
    }

    /// The letter or digit of a `[#X]` cookie.
    pub fn priority(&self) -> Option<char> {
        let cookie = field_token(&self.0, "priority")?;
        cookie.text().chars().nth(2)
    }

    /// The heading carries the `COMMENT` flag.
    pub fn is_commented(&self) -> bool {
        token(&self.0, SyntaxKind::COMMENT_FLAG).is_some()
    }

    pub fn title(&self) -> Option<Title> {
        field_node(&self.0, "title")
    }
}

impl Title {
    pub fn objects(&self) -> impl Iterator<Item = Object> + use<> {
        objects(&self.0)
    }
}

impl Body {
    pub fn elements(&self) -> impl Iterator<Item = Element> + use<> {
        elements(&self.0)
    }
}

impl Contents {
    pub fn elements(&self) -> impl Iterator<Item = Element> + use<> {
        elements(&self.0)
    }
}

impl Content {
    pub fn elements(&self) -> impl Iterator<Item = Element> + use<> {
        elements(&self.0)
    }
}

impl Keyword {
    /// `TITLE` for `#+TITLE:`.
    pub fn key(&self) -> Option<String> {
        let name = field_token(&self.0, "name")?;
        let key = name.text().strip_prefix("#+")?.strip_suffix(':')?;
        Some(key.to_string())
    }

    pub fn value(&self) -> Option<Value> {
        field_node(&self.0, "value")
    }
}

impl GreaterBlock {
    pub fn name(&self) -> Option<String> {
        field_token(&self.0, "name").map(|t| t.text().to_string())
    }

    pub fn params(&self) -> Option<Value> {
        field_node(&self.0, "params")
    }

    pub fn body(&self) -> Option<Body> {
        field_node(&self.0, "body")
    }

    pub fn end_name(&self) -> Option<String> {
        field_token(&self.0, "end_name").map(|t| t.text().to_string())
    }

    pub fn is_terminated(&self) -> bool {
        !self.0.is_missing()
    }
}

impl DynamicBlock {
    pub fn name(&self) -> Option<String> {
        field_token(&self.0, "name").map(|t| t.text().to_string())
    }

    pub fn params(&self) -> Option<Value> {
        field_node(&self.0, "params")
    }

    pub fn contents(&self) -> Option<Contents> {
        field_node(&self.0, "contents")
    }

    pub fn end_name(&self) -> Option<String> {
        field_token(&self.0, "end_name").map(|t| t.text().to_string())
    }

    pub fn is_terminated(&self) -> bool {
        !self.0.is_missing()
    }
}

impl Drawer {
    /// The name without its colons.
    pub fn name(&self) -> Option<String> {
        let token = field_token(&self.0, "name")?;
        Some(token.text().trim_matches(':').to_string())
    }

    pub fn is_property_drawer(&self) -> bool {
        self.name()
            .is_some_and(|n| n.eq_ignore_ascii_case("properties"))
    }

    pub fn contents(&self) -> Option<Contents> {
        field_node(&self.0, "contents")
    }

    pub fn properties(&self) -> impl Iterator<Item = NodeProperty> + use<> {
        self.contents()
            .into_iter()
            .flat_map(|c| children::<NodeProperty>(&c.0))
    }

    pub fn is_terminated(&self) -> bool {
        !self.0.is_missing()
    }
}

impl NodeProperty {
    /// The name without its colons, `+` suffix included.
    pub fn name(&self) -> Option<String> {
        let token = field_token(&self.0, "name")?;
        Some(token.text().trim_matches(':').to_string())
    }

    pub fn value(&self) -> Option<Value> {
        field_node(&self.0, "value")
    }
}

impl List {
    pub fn items(&self) -> impl Iterator<Item = ListItem> + use<> {
        children(&self.0)
    }
}

/// State of a `[ ]`, `[-]` or `[X]` box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkbox {
    Unchecked,
    InProgress,
    Checked,
}

impl Checkbox {
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "[ ]" => Some(Checkbox::Unchecked),
            "[-]" => Some(Checkbox::InProgress),
            "[X]" => Some(Checkbox::Checked),
            _ => None,
        }
    }
}

impl ListItem {
    pub fn bullet(&self) -> Option<SyntaxToken> {
        field_token(&self.0, "bullet")
    }

    pub fn checkbox(&self) -> Option<Checkbox> {
        field_token(&self.0, "checkbox").and_then(|t| Checkbox::from_text(t.text()))
    }

    pub fn content(&self) -> Option<Content> {
        field_node(&self.0, "content")
    }
}

impl Paragraph {
    pub fn objects(&self) -> impl Iterator<Item = Object> + use<> {
        objects(&self.0)
    }
}

impl Markup {
    pub fn kind(&self) -> MarkupKind {
        match self.0.kind() {
            SyntaxKind::BOLD => MarkupKind::Bold,
            SyntaxKind::ITALIC => MarkupKind::Italic,
            SyntaxKind::UNDERLINE => MarkupKind::Underline,
            SyntaxKind::VERBATIM => MarkupKind::Verbatim,
            SyntaxKind::CODE => MarkupKind::Code,
            _ => MarkupKind::Strikethrough,
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = Object> + use<> {
        objects(&self.0)
    }
}

impl RegularLink {
    pub fn path(&self) -> Option<String> {
        field_token(&self.0, "pathreg").map(|t| t.text().to_string())
    }

    pub fn description(&self) -> Option<Description> {
        field_node(&self.0, "description")
    }
}

impl Description {
    pub fn objects(&self) -> impl Iterator<Item = Object> + use<> {
        objects(&self.0)
    }
}

impl InterruptedStart {
    /// The delimiter that never found its closing partner.
    pub fn delimiter(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::INTERRUPTED_DELIMITER)
    }

    pub fn objects(&self) -> impl Iterator<Item = Object> + use<> {
        objects(&self.0)
    }
}

/// The `element` supertype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Keyword(Keyword),
    GreaterBlock(GreaterBlock),
    DynamicBlock(DynamicBlock),
    Drawer(Drawer),
    NodeProperty(NodeProperty),
    List(List),
    Paragraph(Paragraph),
    CommentLine(CommentLine),
    BlankLine(BlankLine),
    Error(ErrorNode),
}

impl AstNode for Element {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind.is_element()
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        Some(match node.kind() {
            SyntaxKind::KEYWORD => Element::Keyword(Keyword(node)),
            SyntaxKind::GREATER_BLOCK => Element::GreaterBlock(GreaterBlock(node)),
            SyntaxKind::DYNAMIC_BLOCK => Element::DynamicBlock(DynamicBlock(node)),
            SyntaxKind::DRAWER => Element::Drawer(Drawer(node)),
            SyntaxKind::NODE_PROPERTY => Element::NodeProperty(NodeProperty(node)),
            SyntaxKind::LIST => Element::List(List(node)),
            SyntaxKind::PARAGRAPH => Element::Paragraph(Paragraph(node)),
            SyntaxKind::COMMENT_LINE => Element::CommentLine(CommentLine(node)),
            SyntaxKind::BLANK_LINE => Element::BlankLine(BlankLine(node)),
            SyntaxKind::ERROR => Element::Error(ErrorNode(node)),
            _ => return None,
        })
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Element::Keyword(n) => n.syntax(),
            Element::GreaterBlock(n) => n.syntax(),
            Element::DynamicBlock(n) => n.syntax(),
            Element::Drawer(n) => n.syntax(),
            Element::NodeProperty(n) => n.syntax(),
            Element::List(n) => n.syntax(),
            Element::Paragraph(n) => n.syntax(),
            Element::CommentLine(n) => n.syntax(),
            Element::BlankLine(n) => n.syntax(),
            Element::Error(n) => n.syntax(),
        }
    }
}

/// The `object` supertype. Words are tokens, everything else is a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    Word(SyntaxToken),
    Markup(Markup),
    RegularLink(RegularLink),
    InterruptedStart(InterruptedStart),
}

impl Object {
    pub fn cast(element: SyntaxElement) -> Option<Self> {
        match element {
            SyntaxElement::Token(t) => (t.kind() == SyntaxKind::WORD).then_some(Object::Word(t)),
            SyntaxElement::Node(n) => match n.kind() {
                kind if kind.is_markup() => Some(Object::Markup(Markup(n))),
                SyntaxKind::REGULAR_LINK => Some(Object::RegularLink(RegularLink(n))),
                SyntaxKind::INTERRUPTED_START => {
                    Some(Object::InterruptedStart(InterruptedStart(n)))
                }
                _ => None,
            },
        }
    }

    pub fn text(&self) -> String {
        match self {
            Object::Word(t) => t.text().to_string(),
            Object::Markup(n) => n.text(),
            Object::RegularLink(n) => n.text(),
            Object::InterruptedStart(n) => n.text(),
        }
    }
}
