//! bytecalc: a one-pass compiler and stack VM for integer expressions.
//!
//! Source text is scanned one token at a time, parsed by precedence
//! climbing, and turned into bytecode while it is parsed. The bytecode can
//! then be executed or disassembled.
//!
//! ```text
//! source -> Scanner -> Compiler -> Chunk -> { VM, Disassembly }
//! ```

#![allow(clippy::result_large_err)]

pub mod buffer;
pub mod bytecode;
pub mod error;
pub mod intern;
pub mod lexer;
pub mod selftest;
pub mod span;

pub use bytecode::{disassemble, print_disassembly, Chunk, Compiled};
pub use error::BytecalcError;

use bytecode::{Compiler, VM};
use error::LexerError;
use intern::SymbolTable;
use lexer::{Scanner, Token};

/// Everything produced by compiling and running one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Value computed by the VM.
    pub value: i32,
    /// Value folded by the compiler while parsing.
    pub folded: i32,
    pub chunk: Chunk,
    pub diagnostics: Vec<LexerError>,
}

/// Compile source code to bytecode ending in `HALT`.
pub fn compile(source: &str) -> Result<Chunk, BytecalcError> {
    let mut symbols = SymbolTable::new();
    let mut chunk = Chunk::new();
    compile_into(source, &mut symbols, &mut chunk)?;
    Ok(chunk)
}

/// Compile into a caller-owned chunk, which is cleared first.
pub fn compile_into(
    source: &str,
    symbols: &mut SymbolTable,
    chunk: &mut Chunk,
) -> Result<Compiled, BytecalcError> {
    chunk.clear();
    let compiled = Compiler::new(source, symbols, chunk)?.compile()?;
    Ok(compiled)
}

/// Execute bytecode on a fresh VM.
pub fn execute(code: &[u8]) -> Result<i32, BytecalcError> {
    let mut vm = VM::new();
    Ok(vm.run(code)?)
}

/// Scan `source` to the end, returning every token (end-of-input included)
/// and the diagnostics seen on the way.
pub fn tokenize(
    source: &str,
    symbols: &mut SymbolTable,
) -> Result<(Vec<Token>, Vec<LexerError>), LexerError> {
    let mut scanner = Scanner::new(source, symbols)?;
    let tokens = scanner.scan_tokens()?;
    Ok((tokens, scanner.take_diagnostics()))
}

/// Compile and execute an expression.
pub fn eval(source: &str) -> Result<Evaluation, BytecalcError> {
    let mut symbols = SymbolTable::new();
    let mut chunk = Chunk::new();
    let compiled = compile_into(source, &mut symbols, &mut chunk)?;
    let value = execute(chunk.as_bytes())?;

    Ok(Evaluation {
        value,
        folded: compiled.value,
        chunk,
        diagnostics: compiled.diagnostics,
    })
}
