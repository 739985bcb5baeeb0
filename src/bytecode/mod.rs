//! Bytecode compiler and virtual machine for integer expressions.
//!
//! # Architecture
//!
//! - `instruction`: opcode set with sizes, stack effects and mnemonics
//! - `chunk`: the byte buffer instructions are written into
//! - `compiler`: parses source and emits bytecode in one pass
//! - `vm`: stack machine that executes a bytecode sequence
//! - `disassembler`: human-readable listings

pub mod chunk;
pub mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod vm;

pub use chunk::Chunk;
pub use compiler::{Compiled, Compiler};
pub use disassembler::{disassemble, print_disassembly, Disassembly};
pub use instruction::OpCode;
pub use vm::{STACK_MAX, VM};
