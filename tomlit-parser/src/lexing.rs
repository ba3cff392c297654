//! Surface lexer for TOML documents.
//!
//! Tokenizes punctuation, strings, comments and atoms with byte spans. This is
//! token-level only; the tree builder in [`crate::parsing`] decides what a
//! header or key-value line is, and the external TOML engine owns grammar
//! correctness. Unknown input never fails: bytes the lexer cannot classify are
//! surfaced as [`Token::Atom`] so downstream spans stay contiguous.

use logos::{Lexer, Logos};
use std::ops::Range as ByteRange;

/// A lexed token paired with its byte span.
pub type TokenSpan = (Token, ByteRange<usize>);

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    #[token("[[")]
    DoubleLeftBracket,

    #[token("]]")]
    DoubleRightBracket,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token("=")]
    Equals,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[regex(r"#[^\n]*")]
    Comment,

    // Multi-line strings are consumed by callbacks because their closing
    // delimiter search is not expressible as a finite regex here.
    #[token("\"\"\"", lex_multiline_basic)]
    MultilineBasicString,

    #[token("'''", lex_multiline_literal)]
    MultilineLiteralString,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    BasicString,

    #[regex(r"'[^'\n]*'")]
    LiteralString,

    #[token("\n")]
    Newline,

    #[regex(r"[ \t\r]+")]
    Whitespace,

    /// Bare-key characters. Also matches plain integers and dates, which is
    /// fine: in value position only the span matters.
    #[regex(r"[A-Za-z0-9_\-]+", priority = 3)]
    BareKey,

    /// Any other run of non-structural characters (floats with exponents,
    /// times, offsets, special values).
    #[regex(r#"[^ \t\r\n#\[\]{}=.,'"]+"#, priority = 1)]
    Atom,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::Comment)
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            Token::BasicString
                | Token::LiteralString
                | Token::MultilineBasicString
                | Token::MultilineLiteralString
        )
    }

    /// Tokens that can appear as a key segment.
    pub fn is_key_segment(&self) -> bool {
        matches!(
            self,
            Token::BareKey | Token::BasicString | Token::LiteralString | Token::Atom
        )
    }
}

fn lex_multiline_basic(lex: &mut Lexer<Token>) -> bool {
    consume_until(lex, "\"\"\"", b'"');
    true
}

fn lex_multiline_literal(lex: &mut Lexer<Token>) -> bool {
    consume_until(lex, "'''", b'\'');
    true
}

/// Bump the lexer past the closing delimiter, tolerating up to two extra
/// closing quotes (TOML allows `""""" ... """""`). An unterminated string
/// swallows the rest of the input; the TOML engine reports the error.
fn consume_until(lex: &mut Lexer<Token>, delimiter: &str, quote: u8) {
    let remainder = lex.remainder();
    match remainder.find(delimiter) {
        Some(idx) => {
            let mut end = idx + delimiter.len();
            let bytes = remainder.as_bytes();
            while end < remainder.len() && bytes[end] == quote && end < idx + delimiter.len() + 2 {
                end += 1;
            }
            lex.bump(end);
        }
        None => lex.bump(remainder.len()),
    }
}

/// Tokenize a document. Lexer errors (stray quotes and the like) degrade to
/// [`Token::Atom`] spans instead of aborting.
pub fn tokens(source: &str) -> Vec<TokenSpan> {
    let mut lexer = Token::lexer(source);
    let mut out = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = result.unwrap_or(Token::Atom);
        out.push((token, span.start..span.end));
    }
    out
}
