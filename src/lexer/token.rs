//! Token definitions for the expression lexer.

use std::fmt;

use crate::intern::SymbolId;
use crate::span::Span;

/// Token classes. One-character operators and punctuation are not
/// enumerated; they are carried as their byte value in `Punct`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Eof,
    /// Integer literal, including character literals (see `TokenMod::Char`).
    Int(u64),
    Float(f64),
    /// Identifier, interned.
    Name(SymbolId),
    Punct(u8),
}

impl TokenKind {
    /// Short class name used in token dumps.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Eof => "TOKEN_EOF",
            TokenKind::Int(_) => "TOKEN_INT",
            TokenKind::Float(_) => "TOKEN_FLOAT",
            TokenKind::Name(_) => "TOKEN_NAME",
            TokenKind::Punct(_) => "ASCII",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Int(n) => write!(f, "integer {}", n),
            TokenKind::Float(n) => write!(f, "float {}", n),
            TokenKind::Name(_) => write!(f, "identifier"),
            TokenKind::Punct(c) if c.is_ascii_graphic() => write!(f, "'{}'", *c as char),
            TokenKind::Punct(c) => write!(f, "byte 0x{:02X}", c),
        }
    }
}

/// Literal sub-kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenMod {
    #[default]
    None,
    Bin,
    Oct,
    Dec,
    Hex,
    Char,
}

impl TokenMod {
    pub fn base(self) -> Option<u64> {
        match self {
            TokenMod::Bin => Some(2),
            TokenMod::Oct => Some(8),
            TokenMod::Dec => Some(10),
            TokenMod::Hex => Some(16),
            TokenMod::None | TokenMod::Char => None,
        }
    }
}

/// A token with its kind, literal modifier and source location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub modifier: TokenMod,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, modifier: TokenMod, span: Span) -> Self {
        Self {
            kind,
            modifier,
            span,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            modifier: TokenMod::None,
            span: Span::new(position, position, line, column),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn is_punct(&self, c: u8) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub fn int_value(&self) -> Option<u64> {
        match self.kind {
            TokenKind::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Float(n) => Some(n),
            _ => None,
        }
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        match self.kind {
            TokenKind::Name(id) => Some(id),
            _ => None,
        }
    }

    /// Human-readable description for error messages, quoting the lexeme of
    /// identifiers.
    pub fn describe(&self, source: &str) -> String {
        match self.kind {
            TokenKind::Name(_) => format!("identifier '{}'", self.span.text(source)),
            kind => kind.to_string(),
        }
    }

    /// Render the token in dump format against the source it was read from.
    pub fn display<'a>(&'a self, source: &'a str) -> TokenDump<'a> {
        TokenDump {
            token: self,
            source,
        }
    }
}

/// Dump line for a token: `TOKEN: <value>\t"<lexeme>"\t(<KIND>)`.
pub struct TokenDump<'a> {
    token: &'a Token,
    source: &'a str,
}

impl fmt::Display for TokenDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TOKEN: ")?;
        match self.token.kind {
            TokenKind::Float(n) => write!(f, " {:.6}", n)?,
            TokenKind::Int(n) => write!(f, " {}", n)?,
            _ => {}
        }
        write!(
            f,
            "\t\"{}\"\t({})",
            self.token.span.text(self.source),
            self.token.kind.name()
        )
    }
}
