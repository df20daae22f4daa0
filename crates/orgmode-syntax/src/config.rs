//! Parser configuration and the declarative description of the grammar.
//!
//! Nothing here is global: a [`ParserConfig`] value is handed to the scanner
//! and parser when they are constructed, and [`LANGUAGE`] is plain data that
//! consumers can inspect.

use serde::{Deserialize, Serialize};

use crate::syntax_kind::SyntaxKind;

/// Runtime knobs for a parse session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum number of open frames on the scanner stack. Deeper nesting is
    /// scanned as literal text.
    pub max_depth: usize,
    /// Heading keywords marking an open task.
    pub todo_keywords: Vec<String>,
    /// Heading keywords marking a finished task.
    pub done_keywords: Vec<String>,
    /// Width of a tab when measuring list indentation.
    pub tab_width: usize,
    /// Record a scanner checkpoint every this many lines.
    pub checkpoint_interval: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            todo_keywords: vec!["TODO".to_string()],
            done_keywords: vec!["DONE".to_string()],
            tab_width: 8,
            checkpoint_interval: 1,
        }
    }
}

impl ParserConfig {
    pub fn is_heading_keyword(&self, word: &str) -> bool {
        self.todo_keywords
            .iter()
            .chain(&self.done_keywords)
            .any(|k| k == word)
    }

    /// Column reached after `indent`, expanding tabs to the next tab stop.
    pub fn indent_column(&self, indent: &str) -> usize {
        let width = self.tab_width.max(1);
        indent.chars().fold(0, |col, c| match c {
            '\t' => (col / width + 1) * width,
            _ => col + 1,
        })
    }
}

/// A named child of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub parent: SyntaxKind,
    pub name: &'static str,
    pub child: SyntaxKind,
    pub multiple: bool,
}

const fn field(parent: SyntaxKind, name: &'static str, child: SyntaxKind) -> FieldSpec {
    FieldSpec {
        parent,
        name,
        child,
        multiple: false,
    }
}

/// A named grouping of kinds that consumers can treat uniformly.
#[derive(Debug, Clone, Copy)]
pub struct Supertype {
    pub name: &'static str,
    members: fn(SyntaxKind) -> bool,
}

impl Supertype {
    pub fn contains(&self, kind: SyntaxKind) -> bool {
        (self.members)(kind)
    }
}

/// Static description of the grammar: supertypes, scanner-produced tokens,
/// extras and named fields.
#[derive(Debug)]
pub struct Language {
    pub name: &'static str,
    pub supertypes: &'static [Supertype],
    pub external_tokens: &'static [SyntaxKind],
    pub extras: &'static [SyntaxKind],
    pub fields: &'static [FieldSpec],
}

impl Language {
    pub fn field(&self, parent: SyntaxKind, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.parent == parent && f.name == name)
    }

    pub fn supertype(&self, name: &str) -> Option<&Supertype> {
        self.supertypes.iter().find(|s| s.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        let mut seen = Vec::new();
        self.fields.iter().filter_map(move |f| {
            if seen.contains(&f.name) {
                None
            } else {
                seen.push(f.name);
                Some(f.name)
            }
        })
    }
}

pub static LANGUAGE: Language = Language {
    name: "orgmode",
    supertypes: &[
        Supertype {
            name: "element",
            members: SyntaxKind::is_element,
        },
        Supertype {
            name: "object",
            members: SyntaxKind::is_object,
        },
    ],
    external_tokens: &[
        SyntaxKind::BLOCK_BEGIN_MARKER,
        SyntaxKind::BLOCK_END_MARKER,
        SyntaxKind::BLOCK_BEGIN_NAME,
        SyntaxKind::BLOCK_END_NAME,
        SyntaxKind::DRAWER_NAME,
        SyntaxKind::DRAWER_END,
        SyntaxKind::PROPERTY_NAME,
        SyntaxKind::STARS,
        SyntaxKind::END_SECTION,
        SyntaxKind::BULLET,
        SyntaxKind::LIST_START,
        SyntaxKind::LIST_END,
        SyntaxKind::MARKUP_START,
        SyntaxKind::MARKUP_END,
        SyntaxKind::INTERRUPTED_DELIMITER,
        SyntaxKind::WORD,
        SyntaxKind::ERROR_SENTINEL,
    ],
    extras: &[SyntaxKind::WHITESPACE],
    fields: &[
        field(SyntaxKind::ROOT, "zeroth_section", SyntaxKind::BODY),
        FieldSpec {
            parent: SyntaxKind::SECTION,
            name: "subsection",
            child: SyntaxKind::SECTION,
            multiple: true,
        },
        field(SyntaxKind::SECTION, "heading", SyntaxKind::HEADING),
        field(SyntaxKind::SECTION, "body", SyntaxKind::BODY),
        field(SyntaxKind::HEADING, "stars", SyntaxKind::STARS),
        field(SyntaxKind::HEADING, "keyword", SyntaxKind::TODO_KEYWORD),
        field(SyntaxKind::HEADING, "priority", SyntaxKind::PRIORITY),
        field(SyntaxKind::HEADING, "title", SyntaxKind::TITLE),
        field(SyntaxKind::KEYWORD, "name", SyntaxKind::KEYWORD_KEY),
        field(SyntaxKind::KEYWORD, "value", SyntaxKind::VALUE),
        field(SyntaxKind::GREATER_BLOCK, "name", SyntaxKind::BLOCK_BEGIN_NAME),
        field(SyntaxKind::GREATER_BLOCK, "params", SyntaxKind::VALUE),
        field(SyntaxKind::GREATER_BLOCK, "body", SyntaxKind::BODY),
        field(SyntaxKind::GREATER_BLOCK, "end_name", SyntaxKind::BLOCK_END_NAME),
        field(SyntaxKind::DYNAMIC_BLOCK, "name", SyntaxKind::BLOCK_BEGIN_NAME),
        field(SyntaxKind::DYNAMIC_BLOCK, "params", SyntaxKind::VALUE),
        field(SyntaxKind::DYNAMIC_BLOCK, "contents", SyntaxKind::CONTENTS),
        field(SyntaxKind::DYNAMIC_BLOCK, "end_name", SyntaxKind::BLOCK_END_NAME),
        field(SyntaxKind::DRAWER, "name", SyntaxKind::DRAWER_NAME),
        field(SyntaxKind::DRAWER, "contents", SyntaxKind::CONTENTS),
        field(SyntaxKind::NODE_PROPERTY, "name", SyntaxKind::PROPERTY_NAME),
        field(SyntaxKind::NODE_PROPERTY, "value", SyntaxKind::VALUE),
        field(SyntaxKind::LIST_ITEM, "bullet", SyntaxKind::BULLET),
        field(SyntaxKind::LIST_ITEM, "checkbox", SyntaxKind::CHECKBOX),
        field(SyntaxKind::LIST_ITEM, "content", SyntaxKind::CONTENT),
        field(SyntaxKind::REGULAR_LINK, "pathreg", SyntaxKind::LINK_PATH),
        field(SyntaxKind::REGULAR_LINK, "description", SyntaxKind::DESCRIPTION),
    ],
};
