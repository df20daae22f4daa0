//! # orgmode-syntax
//!
//! A lossless Org-mode syntax tree using [Rowan] + [Logos], following the
//! [rust-analyzer] architecture model, with a context-sensitive scanner in
//! front of the grammar and incremental reparsing on top.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## What is a Lossless CST?
//!
//! Unlike an Abstract Syntax Tree (AST) which discards formatting details, a
//! Concrete Syntax Tree (CST) preserves **every byte** of the original source:
//! indentation, blank lines, odd markup, half-finished blocks. The leaves of
//! the tree, read in order, are exactly the input.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Lexemes → Scanner → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)           (frame stack)      (Grammar)         (GreenNodeBuilder)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! [Logos] splits a line into context-free lexemes: whitespace, markup
//! delimiter characters, link brackets and text runs.
//!
//! ### 2. Scanner ([`scanner`] module)
//!
//! Org's structure is not context free: whether `** x` closes a section or
//! opens a child depends on the headings above it, and whether `- x` starts
//! a new list depends on the indentation of the open one. The scanner keeps
//! an explicit stack of open frames and turns each line into tokens,
//! including zero-width `END_SECTION`/`LIST_START`/`LIST_END` markers.
//!
//! ### 3. Parser ([`parser`] module)
//!
//! The parser pulls tokens from the scanner on demand and emits **events**
//! (Start, Token, Finish) through a **marker system**. Competing readings of
//! the same input are settled by the table in [`precedence`].
//!
//! ### 4. Sink ([`parser::sink`] module)
//!
//! The sink consumes events and builds a Rowan green tree, leaving the
//! zero-width markers out.
//!
//! ## Module Structure
//!
//! ```text
//! orgmode-syntax/
//! ├── lib.rs           # This file - public API and integration tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── lexer.rs         # Logos-based lexemes
//! ├── scanner/         # Context-sensitive tokens, frame stack, checkpoints
//! ├── precedence.rs    # Conflict resolution between productions
//! ├── parser/          # Parser, markers, events, sink and grammar rules
//! ├── tree.rs          # Tree, spans, points, field lookup
//! ├── ast.rs           # Typed wrappers over syntax nodes
//! ├── incremental.rs   # edit(): checkpoint restore and subtree reuse
//! ├── config.rs        # ParserConfig and the static LANGUAGE description
//! └── diagnostics.rs   # Diagnostic and error types
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use orgmode_syntax::{NodeExt, SyntaxKind, parse};
//!
//! let tree = parse("* TODO Write docs\nSome *bold* text.\n");
//!
//! // The tree preserves all text
//! assert_eq!(tree.root_node().text().to_string(), tree.text());
//!
//! // Navigate by named fields
//! let section = tree.root_node().first_child().unwrap();
//! assert_eq!(section.kind(), SyntaxKind::SECTION);
//! let heading = section.field("heading").unwrap().into_node().unwrap();
//! assert_eq!(heading.field("keyword").unwrap().to_string(), "TODO");
//!
//! // Reparse after an edit
//! let new_text = "* DONE Write docs\nSome *bold* text.\n";
//! let edited = orgmode_syntax::edit(&tree, 2, 6, 6, new_text).unwrap();
//! assert_eq!(edited.text(), new_text);
//! ```

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod incremental;
pub mod lexer;
pub mod parser;
pub mod precedence;
pub mod scanner;
pub mod syntax_kind;
pub mod tree;

pub use config::{LANGUAGE, Language, ParserConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, EditError};
pub use incremental::edit;
pub use syntax_kind::{OrgLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
pub use tree::{NodeExt, Point, Span, Tree, dump_tree};

/// Parse a document with the default configuration.
pub fn parse(text: &str) -> Tree {
    parse_with_config(text, &ParserConfig::default())
}

/// Parse a document. Never fails: problems are reported through
/// [`Tree::diagnostics`] and recovery nodes in the tree.
pub fn parse_with_config(text: &str, config: &ParserConfig) -> Tree {
    let scanner = scanner::Scanner::new(text, config);
    let parse = parser::Parser::new(text, scanner).parse();
    log::debug!(
        "parsed {} bytes into {} tokens, {} diagnostics",
        text.len(),
        parse.tokens.len(),
        parse.diagnostics.len() + parse.scan.diagnostics.len()
    );
    Tree::new(text.to_string(), config.clone(), parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Leaves in order must tile the input exactly.
    fn assert_covers(tree: &Tree) {
        let mut end = 0;
        for token in tree
            .root_node()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
        {
            let range = token.text_range();
            assert_eq!(usize::from(range.start()), end, "gap before {token:?}");
            assert!(!range.is_empty(), "empty token {token:?}");
            end = range.end().into();
        }
        assert_eq!(end, tree.text().len());
    }

    fn count(tree: &Tree, kind: SyntaxKind) -> usize {
        tree.tokens().iter().filter(|t| t.kind == kind).count()
    }

    /// Run the invariant checks on a `.org` fixture.
    /// Called by generated test functions (see build.rs).
    fn fixture_test(name: &str) {
        init_logging();
        let fixture_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("src/fixtures");
        let input = std::fs::read_to_string(fixture_dir.join(format!("{name}.org"))).unwrap();

        let tree = parse(&input);
        assert_eq!(tree.root_node().text().to_string(), input);
        assert_covers(&tree);
        assert_eq!(
            count(&tree, SyntaxKind::LIST_START),
            count(&tree, SyntaxKind::LIST_END)
        );

        // Appending a line reparses to the same tree as parsing from scratch.
        let appended = format!("{input}extra line\n");
        let edited = edit(&tree, input.len(), input.len(), appended.len(), &appended).unwrap();
        assert_eq!(
            dump_tree(&edited.root_node()),
            dump_tree(&parse(&appended).root_node())
        );
    }

    // Generated by build.rs - one test per .org file in fixtures/
    include!(concat!(env!("OUT_DIR"), "/fixture_tests.rs"));

    #[test]
    fn snapshot_heading_with_subsection() {
        let tree = parse("* TODO Heading 1\nbody text\n** Sub\nmore\n");
        assert_snapshot!(dump_tree(&tree.root_node()), @r#"
        ROOT@0..39
          SECTION@0..39
            HEADING@0..17
              STARS@0..1 "*"
              WHITESPACE@1..2 " "
              TODO_KEYWORD@2..6 "TODO"
              WHITESPACE@6..7 " "
              TITLE@7..16
                WORD@7..14 "Heading"
                WHITESPACE@14..15 " "
                WORD@15..16 "1"
              NEWLINE@16..17 "\n"
            BODY@17..27
              PARAGRAPH@17..27
                WORD@17..21 "body"
                WHITESPACE@21..22 " "
                WORD@22..26 "text"
                NEWLINE@26..27 "\n"
            SECTION@27..39
              HEADING@27..34
                STARS@27..29 "**"
                WHITESPACE@29..30 " "
                TITLE@30..33
                  WORD@30..33 "Sub"
                NEWLINE@33..34 "\n"
              BODY@34..39
                PARAGRAPH@34..39
                  WORD@34..38 "more"
                  NEWLINE@38..39 "\n"
        "#);
    }

    #[test]
    fn snapshot_unterminated_block() {
        let tree = parse("#+begin_src\nfoo\n");
        assert_snapshot!(dump_tree(&tree.root_node()), @r##"
        ROOT@0..16
          BODY@0..16
            GREATER_BLOCK@0..16
              BLOCK_BEGIN_MARKER@0..8 "#+begin_"
              BLOCK_BEGIN_NAME@8..11 "src"
              NEWLINE@11..12 "\n"
              BODY@12..16
                PARAGRAPH@12..16
                  WORD@12..15 "foo"
                  NEWLINE@15..16 "\n"
        "##);
        assert_eq!(tree.diagnostics().len(), 1);
        assert_eq!(
            tree.diagnostics()[0].kind,
            DiagnosticKind::UnterminatedConstruct
        );
    }

    #[test]
    fn snapshot_interrupted_markup_and_link() {
        let tree = parse("see [[a][b]] *x\n");
        assert_snapshot!(dump_tree(&tree.root_node()), @r#"
        ROOT@0..16
          BODY@0..16
            PARAGRAPH@0..16
              WORD@0..3 "see"
              WHITESPACE@3..4 " "
              REGULAR_LINK@4..12
                LINK_START@4..6 "[["
                LINK_PATH@6..7 "a"
                LINK_SEPARATOR@7..9 "]["
                DESCRIPTION@9..10
                  WORD@9..10 "b"
                LINK_END@10..12 "]]"
              WHITESPACE@12..13 " "
              INTERRUPTED_START@13..15
                INTERRUPTED_DELIMITER@13..14 "*"
                WORD@14..15 "x"
              NEWLINE@15..16 "\n"
        "#);
    }

    #[test]
    fn messy_input_still_covers_everything() {
        init_logging();
        let input = "\
#+TITLE: Draft
* TODO [#A] Half /finished *edit
:PROPERTIES:
:ID: 1
#+begin_quote
- [X] item
   #+end_example
:END:
** COMMENT Done [[broken
   - deep
\t- tabbed
#+begin: table
#+end_quote
";
        let tree = parse(input);
        assert_eq!(tree.root_node().text().to_string(), input);
        assert_covers(&tree);
        assert_eq!(
            count(&tree, SyntaxKind::LIST_START),
            count(&tree, SyntaxKind::LIST_END)
        );
        assert!(!tree.diagnostics().is_empty());
    }

    #[test]
    fn roundtrip_preserves_text() {
        let inputs = [
            "",
            "\n",
            "* Heading\n",
            "*bold* not a heading\n",
            "- item\n",
            "  + nested\n",
            "#+begin_src\ncode\n#+end_src\n",
            ":PROPERTIES:\n:ID: x\n:END:\n",
            "[[link]]\n",
            "a\r\nb\r\n",
            "no trailing newline",
            "** \n",
            "ünïcödé *wörds*\n",
        ];

        for input in inputs {
            let tree = parse(input);
            assert_eq!(
                tree.root_node().text().to_string(),
                input,
                "Roundtrip failed for: {:?}",
                input
            );
            assert_covers(&tree);
        }
    }

    #[test]
    fn configured_depth_limit_degrades_to_text() {
        let config = ParserConfig {
            max_depth: 1,
            ..ParserConfig::default()
        };
        let tree = parse_with_config("* a\n** b\n", &config);
        let section = tree.root_node().first_child().expect("section");
        assert_eq!(section.kind(), SyntaxKind::SECTION);
        assert_eq!(section.fields("subsection").len(), 0);
        assert_eq!(tree.diagnostics()[0].kind, DiagnosticKind::DepthLimit);
    }
}
