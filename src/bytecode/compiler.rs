//! Single-pass compiler: parses an expression and emits bytecode as it goes.
//!
//! Grammar, lowest precedence last:
//!
//! ```text
//! expr3 = INT | '(' expr ')'
//! expr2 = '-' expr2 | '+' expr2 | expr3
//! expr1 = expr2 (('*' | '/') expr2)*
//! expr0 = expr1 (('+' | '-') expr1)*
//! expr  = expr0
//! ```
//!
//! Every production also folds its value with wrapping `i32` arithmetic, so
//! the result of a parse can be checked against the VM's result for the
//! emitted code. No syntax tree is built.

use crate::bytecode::chunk::Chunk;
use crate::bytecode::instruction::OpCode;
use crate::error::{LexerError, ParserError};
use crate::intern::SymbolTable;
use crate::lexer::{Scanner, TokenKind};

/// Deepest nesting of parentheses and unary operators accepted.
pub const MAX_NESTING: usize = 256;

/// Result type for compilation.
pub type ParseResult<T> = Result<T, ParserError>;

/// Outcome of compiling one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Statically folded value of the expression.
    pub value: i32,
    /// Non-fatal lexer diagnostics, in source order.
    pub diagnostics: Vec<LexerError>,
}

/// The bytecode compiler. Appends to a caller-owned chunk.
pub struct Compiler<'a> {
    scanner: Scanner<'a>,
    chunk: &'a mut Chunk,
    depth: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(
        source: &'a str,
        symbols: &'a mut SymbolTable,
        chunk: &'a mut Chunk,
    ) -> ParseResult<Self> {
        let scanner = Scanner::new(source, symbols)?;
        Ok(Self {
            scanner,
            chunk,
            depth: 0,
        })
    }

    /// Compile a complete expression followed by end of input and terminate
    /// the code with `HALT`.
    pub fn compile(mut self) -> ParseResult<Compiled> {
        let value = self.parse_expr()?;
        self.expect_eof()?;
        self.emit(OpCode::Halt);

        Ok(Compiled {
            value,
            diagnostics: self.scanner.take_diagnostics(),
        })
    }

    /// Parse one expression, emitting its code. Stops at the first token
    /// that cannot continue the expression.
    pub fn parse_expr(&mut self) -> ParseResult<i32> {
        self.parse_expr0()
    }

    /// Diagnostics recorded by the scanner so far.
    pub fn diagnostics(&self) -> &[LexerError] {
        self.scanner.diagnostics()
    }

    fn parse_expr0(&mut self) -> ParseResult<i32> {
        let mut value = self.parse_expr1()?;

        loop {
            if self.match_punct(b'+')? {
                let rhs = self.parse_expr1()?;
                self.emit(OpCode::Add);
                value = value.wrapping_add(rhs);
            } else if self.match_punct(b'-')? {
                let rhs = self.parse_expr1()?;
                self.emit(OpCode::Sub);
                value = value.wrapping_sub(rhs);
            } else {
                break;
            }
        }

        Ok(value)
    }

    fn parse_expr1(&mut self) -> ParseResult<i32> {
        let mut value = self.parse_expr2()?;

        loop {
            if self.match_punct(b'*')? {
                let rhs = self.parse_expr2()?;
                self.emit(OpCode::Mul);
                value = value.wrapping_mul(rhs);
            } else if self.scanner.is_punct(b'/') {
                let span = self.scanner.token().span;
                self.advance()?;
                let rhs = self.parse_expr2()?;
                self.emit(OpCode::Div);
                if rhs == 0 {
                    return Err(ParserError::division_by_zero(span));
                }
                value = value.wrapping_div(rhs);
            } else {
                break;
            }
        }

        Ok(value)
    }

    fn parse_expr2(&mut self) -> ParseResult<i32> {
        if self.match_punct(b'-')? {
            let value = self.nested(Self::parse_expr2)?;
            self.emit(OpCode::Neg);
            Ok(value.wrapping_neg())
        } else if self.match_punct(b'+')? {
            self.nested(Self::parse_expr2)
        } else {
            self.parse_expr3()
        }
    }

    fn parse_expr3(&mut self) -> ParseResult<i32> {
        let token = *self.scanner.token();

        match token.kind {
            TokenKind::Int(n) => {
                self.advance()?;
                // Only the low 32 bits of a literal reach the code.
                let value = n as u32 as i32;
                self.chunk.write_lit(value);
                Ok(value)
            }
            TokenKind::Punct(b'(') => {
                self.advance()?;
                let value = self.nested(Self::parse_expr)?;
                self.expect_punct(b')')?;
                Ok(value)
            }
            _ => Err(ParserError::unexpected_token(
                "integer or '('",
                token.describe(self.scanner.source()),
                token.span,
            )),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> ParseResult<i32>) -> ParseResult<i32> {
        if self.depth >= MAX_NESTING {
            return Err(ParserError::general(
                "Expression nested too deeply",
                self.scanner.token().span,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op);
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.scanner.next_token()?;
        Ok(())
    }

    fn match_punct(&mut self, c: u8) -> ParseResult<bool> {
        Ok(self.scanner.match_punct(c)?)
    }

    fn expect_punct(&mut self, c: u8) -> ParseResult<()> {
        if self.match_punct(c)? {
            Ok(())
        } else {
            Err(self.unexpected(TokenKind::Punct(c).to_string()))
        }
    }

    fn expect_eof(&self) -> ParseResult<()> {
        if self.scanner.token().is_eof() {
            Ok(())
        } else {
            Err(self.unexpected(TokenKind::Eof.to_string()))
        }
    }

    fn unexpected(&self, expected: String) -> ParserError {
        let token = self.scanner.token();
        ParserError::unexpected_token(
            expected,
            token.describe(self.scanner.source()),
            token.span,
        )
    }
}
