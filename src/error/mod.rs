//! Error types for all compilation phases.
//!
//! Two severities exist. Lexer diagnostics are recorded and scanning goes
//! on; everything else is fatal for the operation that produced it and is
//! returned as `Err`. Only the binary decides to end the process.

use crate::span::Span;
use thiserror::Error;

/// Lexer errors.
///
/// All variants except `StringLiteral` are diagnostics: the scanner records
/// them and still produces a best-effort token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexerError {
    #[error("Char literal cannot be empty at {0}")]
    EmptyChar(Span),

    #[error("Char literal cannot contain newline at {0}")]
    NewlineInChar(Span),

    #[error("Invalid char literal escape '\\{0}' at {1}")]
    InvalidEscape(char, Span),

    #[error("Expected closing char quote, got {found} at {span}")]
    UnterminatedChar { found: String, span: Span },

    #[error("Expected digit after float literal exponent, found {found} at {span}")]
    MissingExponentDigits { found: String, span: Span },

    #[error("Float literal out of range at {0}")]
    FloatOutOfRange(Span),

    #[error("Digit '{digit}' out of range for base {base} at {span}")]
    DigitOutOfRange { digit: char, base: u64, span: Span },

    #[error("Integer literal overflow at {0}")]
    IntegerOverflow(Span),

    #[error("String literals are not implemented at {0}")]
    StringLiteral(Span),
}

impl LexerError {
    pub fn unterminated_char(found: Option<u8>, span: Span) -> Self {
        Self::UnterminatedChar {
            found: describe_byte(found),
            span,
        }
    }

    pub fn missing_exponent_digits(found: Option<u8>, span: Span) -> Self {
        Self::MissingExponentDigits {
            found: describe_byte(found),
            span,
        }
    }

    pub fn digit_out_of_range(digit: u8, base: u64, span: Span) -> Self {
        Self::DigitOutOfRange {
            digit: digit as char,
            base,
            span,
        }
    }

    /// Whether this error stops scanning.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StringLiteral(_))
    }

    pub fn span(&self) -> Span {
        match self {
            Self::EmptyChar(span) => *span,
            Self::NewlineInChar(span) => *span,
            Self::InvalidEscape(_, span) => *span,
            Self::UnterminatedChar { span, .. } => *span,
            Self::MissingExponentDigits { span, .. } => *span,
            Self::FloatOutOfRange(span) => *span,
            Self::DigitOutOfRange { span, .. } => *span,
            Self::IntegerOverflow(span) => *span,
            Self::StringLiteral(span) => *span,
        }
    }
}

fn describe_byte(byte: Option<u8>) -> String {
    match byte {
        Some(b) if b.is_ascii_graphic() || b == b' ' => format!("'{}'", b as char),
        Some(b) => format!("byte 0x{:02X}", b),
        None => "end of input".to_string(),
    }
}

/// Parser errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserError {
    #[error("Expected {expected}, got {found} at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Division by zero in constant expression at {0}")]
    DivisionByZero(Span),

    #[error("{message} at {span}")]
    General { message: String, span: Span },

    #[error(transparent)]
    Lexer(#[from] LexerError),
}

impl ParserError {
    pub fn unexpected_token(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn division_by_zero(span: Span) -> Self {
        Self::DivisionByZero(span)
    }

    pub fn general(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::DivisionByZero(span) => *span,
            Self::General { span, .. } => *span,
            Self::Lexer(err) => err.span(),
        }
    }
}

/// Runtime errors. Each carries the offset of the faulting instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Stack underflow: {op} needs {needed} operand(s), found {found} at offset {offset}")]
    StackUnderflow {
        op: &'static str,
        needed: usize,
        found: usize,
        offset: usize,
    },

    #[error("Stack overflow at offset {0}")]
    StackOverflow(usize),

    #[error("Division by zero at offset {0}")]
    DivisionByZero(usize),

    #[error("Illegal opcode 0x{opcode:02X} at offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },

    #[error("Truncated operand for {op} at offset {offset}")]
    TruncatedOperand { op: &'static str, offset: usize },

    #[error("Ran off the end of the bytecode at offset {0} without HALT")]
    UnexpectedEnd(usize),
}

impl RuntimeError {
    pub fn stack_underflow(op: &'static str, needed: usize, found: usize, offset: usize) -> Self {
        Self::StackUnderflow {
            op,
            needed,
            found,
            offset,
        }
    }

    pub fn invalid_opcode(opcode: u8, offset: usize) -> Self {
        Self::InvalidOpcode { opcode, offset }
    }

    /// Offset of the instruction that failed.
    pub fn offset(&self) -> usize {
        match self {
            Self::StackUnderflow { offset, .. } => *offset,
            Self::StackOverflow(offset) => *offset,
            Self::DivisionByZero(offset) => *offset,
            Self::InvalidOpcode { offset, .. } => *offset,
            Self::TruncatedOperand { offset, .. } => *offset,
            Self::UnexpectedEnd(offset) => *offset,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum BytecalcError {
    #[error("Lexer error: {0}")]
    Lexer(#[from] LexerError),

    #[error("Parser error: {0}")]
    Parser(ParserError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParserError> for BytecalcError {
    /// Fatal lexer errors raised while parsing keep their lexer identity.
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::Lexer(err) => Self::Lexer(err),
            err => Self::Parser(err),
        }
    }
}

impl BytecalcError {
    /// Process exit code for this error, following sysexits.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Lexer(_) | Self::Parser(_) => 65,
            Self::Runtime(_) => 70,
            Self::Io(_) => 74,
        }
    }
}
