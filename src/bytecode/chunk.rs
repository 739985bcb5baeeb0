//! Bytecode chunk: the append-only instruction stream produced by the
//! compiler.

use crate::buffer::Buffer;
use crate::bytecode::instruction::{OpCode, LIT_OPERAND_SIZE};

/// Decode the little-endian `LIT` operand starting at `offset`, or `None` if
/// fewer than four bytes remain.
pub fn read_operand(code: &[u8], offset: usize) -> Option<i32> {
    let end = offset.checked_add(LIT_OPERAND_SIZE)?;
    let bytes: [u8; LIT_OPERAND_SIZE] = code.get(offset..end)?.try_into().ok()?;
    Some(i32::from_le_bytes(bytes))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub code: Buffer<u8>,
}

impl Chunk {
    pub fn new() -> Self {
        Self {
            code: Buffer::new(),
        }
    }

    pub fn write_op(&mut self, op: OpCode) {
        self.code.push(op as u8);
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.code.push(byte);
    }

    /// Append `value` as four little-endian bytes.
    pub fn write_u32(&mut self, value: u32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a complete `LIT value` instruction.
    pub fn write_lit(&mut self, value: i32) {
        self.write_op(OpCode::Lit);
        self.write_u32(value as u32);
    }

    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        read_operand(&self.code, offset).map(|value| value as u32)
    }

    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Empty the chunk, keeping its allocation.
    pub fn clear(&mut self) {
        self.code.clear();
    }

    /// Release the chunk's storage.
    pub fn free(&mut self) {
        self.code.free();
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.code.as_slice()
    }
}
