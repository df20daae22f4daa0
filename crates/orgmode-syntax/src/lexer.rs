//! # Lexer - Context-Free Lexemes
//!
//! The first stage of scanning breaks a slice of source text into lexemes
//! using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one lexeme. We never skip or
//! discard characters:
//!
//! ```
//! use orgmode_syntax::lexer::lex;
//!
//! let input = "Some *bold* [[link]]\n";
//! let lexemes = lex(input);
//!
//! let reconstructed: String = lexemes.iter().map(|l| &input[l.span.clone()]).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Lexemes vs Tokens
//!
//! Lexemes are **context-free**: the lexer doesn't know whether `*` is a
//! heading star, a bullet, a bold delimiter or just part of a word. That is
//! the [scanner](crate::scanner)'s job, which walks lexemes with its frame
//! stack and turns them into [`SyntaxKind`](crate::SyntaxKind) tokens.
//!
//! Characters with inline meaning get their own lexeme:
//! - `*` `/` `_` `=` `~` `+` → [`Lexeme::Delimiter`]
//! - `[[`, `][`, `]]` → link brackets
//!
//! Everything else is grouped into runs of [`Lexeme::Text`].

use logos::Logos;

/// Lexeme kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// One of the six markup delimiter characters
    #[regex(r"[*/_=~+]", |lex| lex.slice().chars().next())]
    Delimiter(char),

    /// `[[`
    #[token("[[")]
    LinkOpen,

    /// `][`
    #[token("][")]
    LinkSeparator,

    /// `]]`
    #[token("]]")]
    LinkClose,

    /// A lone bracket
    #[regex(r"[\[\]]")]
    Bracket,

    /// Plain text - anything not matched by other rules
    #[regex(r"[^ \t\r\n*/_=~+\[\]]+")]
    Text,
}

/// A lexeme with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub kind: Lexeme,
    pub span: std::ops::Range<usize>,
}

/// Lex the input into a sequence of lexemes.
///
/// Guarantees that all bytes from the input appear in the output.
pub fn lex(input: &str) -> Vec<Spanned> {
    lex_at(input, 0)
}

/// Lex `input`, reporting spans relative to `offset`.
///
/// The scanner lexes one line at a time and needs spans in document
/// coordinates.
pub fn lex_at(input: &str, offset: usize) -> Vec<Spanned> {
    let mut lexemes = Vec::new();
    let mut lexer = Lexeme::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        // A lone `\r` is the only thing no rule matches; keep it as text
        let kind = result.unwrap_or(Lexeme::Text);
        lexemes.push(Spanned {
            kind,
            span: span.start + offset..span.end + offset,
        });
    }

    lexemes
}
