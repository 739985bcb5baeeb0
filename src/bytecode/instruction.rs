//! Instruction set for the expression VM.
//!
//! Every instruction is a single opcode byte. `LIT` is followed by a 4-byte
//! little-endian signed operand; no other instruction has operands.

use std::fmt;

/// Opcodes for the bytecode virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Pop b, pop a, push a + b
    Add = 0,
    /// Pop b, pop a, push a - b
    Sub,
    /// Pop b, pop a, push a * b
    Mul,
    /// Pop b, pop a, push a / b (truncating)
    Div,
    /// Pop a, push -a
    Neg,
    /// Push a literal: LIT <value:i32 LE>
    Lit,
    /// Pop the result and stop
    Halt,
}

/// Width of the `LIT` operand in bytes.
pub const LIT_OPERAND_SIZE: usize = 4;

/// Size of the largest instruction, opcode included.
pub const MAX_INSTRUCTION_SIZE: usize = 1 + LIT_OPERAND_SIZE;

/// Static facts about one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionInfo {
    pub mnemonic: &'static str,
    /// Total encoded size, opcode byte included.
    pub size: usize,
    pub pops: usize,
    pub pushes: usize,
}

const fn info(mnemonic: &'static str, size: usize, pops: usize, pushes: usize) -> InstructionInfo {
    InstructionInfo {
        mnemonic,
        size,
        pops,
        pushes,
    }
}

/// Indexed by opcode value.
static INSTRUCTION_INFO: [InstructionInfo; 7] = [
    info("ADD", 1, 2, 1),
    info("SUB", 1, 2, 1),
    info("MUL", 1, 2, 1),
    info("DIV", 1, 2, 1),
    info("NEG", 1, 1, 1),
    info("LIT", MAX_INSTRUCTION_SIZE, 0, 1),
    info("HALT", 1, 1, 0),
];

impl OpCode {
    pub const ALL: [OpCode; 7] = [
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Div,
        OpCode::Neg,
        OpCode::Lit,
        OpCode::Halt,
    ];

    /// Convert from u8 to OpCode.
    pub fn from_u8(byte: u8) -> Option<OpCode> {
        Self::ALL.get(byte as usize).copied()
    }

    pub fn info(self) -> &'static InstructionInfo {
        &INSTRUCTION_INFO[self as usize]
    }

    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    /// Encoded size in bytes, opcode included.
    pub fn size(self) -> usize {
        self.info().size
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_size(self) -> usize {
        self.size() - 1
    }

    /// Values popped from the stack.
    pub fn pops(self) -> usize {
        self.info().pops
    }

    /// Values pushed onto the stack.
    pub fn pushes(self) -> usize {
        self.info().pushes
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::from_u8(byte).ok_or(byte)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
