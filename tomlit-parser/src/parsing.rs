//! Line-oriented tree builder.
//!
//! Consumes the token stream from [`crate::lexing`] and produces a
//! [`SyntaxTree`]. The builder never fails: lines it cannot shape into a
//! header or key-value are skipped, and grammar-level problems are reported by
//! running the document through the external TOML engine, whose error becomes
//! a positioned diagnostic on the tree.

use std::ops::Range as ByteRange;

use crate::ast::{Diagnostic, KeyValue, Severity, SourceLocation, SyntaxTree, Table, TableKind};
use crate::lexing::{self, Token, TokenSpan};

/// Parse a document into its structural tree. Deterministic and pure over the
/// input text; syntax errors are captured as diagnostics, not failures.
pub fn parse_document(source: &str) -> SyntaxTree {
    let location = SourceLocation::new(source);
    let tokens = lexing::tokens(source);
    let mut builder = Builder {
        source,
        location: &location,
        tokens: &tokens,
        index: 0,
        tree: SyntaxTree {
            root_items: Vec::new(),
            tables: Vec::new(),
            diagnostics: Vec::new(),
            text_len: source.len(),
            first_line: location.range(0..first_line_end(source)),
        },
    };
    builder.run();
    let mut tree = builder.tree;
    if let Err(error) = source.parse::<toml::Table>() {
        let span = error.span().unwrap_or(0..0);
        tree.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: error.message().to_string(),
            range: location.range(span),
        });
    }
    tree
}

fn first_line_end(source: &str) -> usize {
    source.find('\n').unwrap_or(source.len())
}

struct Builder<'a> {
    source: &'a str,
    location: &'a SourceLocation,
    tokens: &'a [TokenSpan],
    index: usize,
    tree: SyntaxTree,
}

impl Builder<'_> {
    fn run(&mut self) {
        while self.index < self.tokens.len() {
            self.skip_blank();
            let Some((token, _)) = self.peek() else {
                break;
            };
            match token {
                Token::LeftBracket => self.header(TableKind::Table),
                Token::DoubleLeftBracket => self.header(TableKind::ArrayOfTables),
                _ if token.is_key_segment() => self.key_value(),
                _ => self.skip_line(),
            }
        }
    }

    fn peek(&self) -> Option<(Token, ByteRange<usize>)> {
        self.tokens
            .get(self.index)
            .map(|(token, span)| (*token, span.clone()))
    }

    fn bump(&mut self) -> Option<(Token, ByteRange<usize>)> {
        let current = self.peek();
        if current.is_some() {
            self.index += 1;
        }
        current
    }

    /// Skip whitespace, comments and newlines between lines.
    fn skip_blank(&mut self) {
        while let Some((token, _)) = self.peek() {
            if token.is_trivia() || token == Token::Newline {
                self.index += 1;
            } else {
                break;
            }
        }
    }

    /// Skip trivia within a line, stopping at the newline.
    fn skip_trivia(&mut self) {
        while let Some((token, _)) = self.peek() {
            if token.is_trivia() {
                self.index += 1;
            } else {
                break;
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some((token, _)) = self.bump() {
            if token == Token::Newline {
                break;
            }
        }
    }

    /// Parse `[name]` / `[[name]]`. A missing closing bracket still records
    /// the table; the TOML engine reports the error.
    fn header(&mut self, kind: TableKind) {
        let Some((_, open_span)) = self.bump() else {
            return;
        };
        let close = match kind {
            TableKind::Table => Token::RightBracket,
            TableKind::ArrayOfTables => Token::DoubleRightBracket,
        };
        let mut segments: Vec<String> = Vec::new();
        let mut name_span: Option<ByteRange<usize>> = None;
        let mut end = open_span.end;
        while let Some((token, span)) = self.peek() {
            match token {
                Token::Newline => break,
                token if token == close => {
                    self.index += 1;
                    end = span.end;
                    break;
                }
                Token::Dot => {
                    self.index += 1;
                }
                token if token.is_trivia() => {
                    self.index += 1;
                }
                token if token.is_key_segment() => {
                    segments.push(unquote(self.text(&span)));
                    name_span = Some(match name_span {
                        Some(existing) => existing.start..span.end,
                        None => span.clone(),
                    });
                    end = span.end;
                    self.index += 1;
                }
                _ => {
                    end = span.end;
                    self.index += 1;
                }
            }
        }
        self.skip_line();
        if segments.is_empty() {
            return;
        }
        let name_span = name_span.unwrap_or(open_span.end..end);
        self.tree.tables.push(Table {
            name: segments.join("."),
            kind,
            header_range: self.location.range(open_span.start..end),
            name_range: self.location.range(name_span),
            items: Vec::new(),
        });
    }

    /// Parse `key = value`, where the key may be dotted and the value may
    /// continue across lines while inside brackets or braces.
    fn key_value(&mut self) {
        let mut segments: Vec<String> = Vec::new();
        let mut key_span: Option<ByteRange<usize>> = None;
        loop {
            let Some((token, span)) = self.peek() else {
                return;
            };
            match token {
                Token::Equals => {
                    self.index += 1;
                    break;
                }
                Token::Newline => {
                    // Not a key-value line after all; leave it to the engine.
                    self.skip_line();
                    return;
                }
                Token::Dot => {
                    self.index += 1;
                }
                token if token.is_trivia() => {
                    self.index += 1;
                }
                token if token.is_key_segment() => {
                    segments.push(unquote(self.text(&span)));
                    key_span = Some(match key_span {
                        Some(existing) => existing.start..span.end,
                        None => span.clone(),
                    });
                    self.index += 1;
                }
                _ => {
                    self.skip_line();
                    return;
                }
            }
        }
        let Some(key_span) = key_span else {
            self.skip_line();
            return;
        };
        let value_span = self.value_span(key_span.end);
        let item = KeyValue {
            key: segments.join("."),
            key_range: self.location.range(key_span),
            value_range: self.location.range(value_span),
        };
        match self.tree.tables.last_mut() {
            Some(table) => table.items.push(item),
            None => self.tree.root_items.push(item),
        }
    }

    /// Span of the value after `=`: to the end of the line, extended across
    /// newlines while bracket/brace depth is open (multi-line arrays and
    /// inline tables). Multi-line strings arrive as single tokens and need no
    /// special casing.
    fn value_span(&mut self, fallback: usize) -> ByteRange<usize> {
        self.skip_trivia();
        let mut depth: isize = 0;
        let mut span: Option<ByteRange<usize>> = None;
        while let Some((token, token_span)) = self.peek() {
            match token {
                Token::Newline if depth <= 0 => {
                    self.index += 1;
                    break;
                }
                Token::Comment if depth <= 0 => {
                    self.index += 1;
                }
                _ => {
                    match token {
                        Token::LeftBracket | Token::LeftBrace => depth += 1,
                        Token::DoubleLeftBracket => depth += 2,
                        Token::RightBracket | Token::RightBrace => depth -= 1,
                        Token::DoubleRightBracket => depth -= 2,
                        _ => {}
                    }
                    if !token.is_trivia() && token != Token::Newline {
                        span = Some(match span {
                            Some(existing) => existing.start..token_span.end,
                            None => token_span.clone(),
                        });
                    }
                    self.index += 1;
                }
            }
        }
        span.unwrap_or(fallback..fallback)
    }

    fn text(&self, span: &ByteRange<usize>) -> &str {
        &self.source[span.clone()]
    }
}

/// Strip surrounding quotes from a key segment. Escape sequences are left
/// as-is; keys with escapes are rare enough that the raw form is acceptable
/// for path matching.
fn unquote(text: &str) -> String {
    let bytes = text.as_bytes();
    if text.len() >= 2 {
        let first = bytes[0];
        let last = bytes[text.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}
