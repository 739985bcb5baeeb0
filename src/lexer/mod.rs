//! Lexer for integer expressions.

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenDump, TokenKind, TokenMod};
