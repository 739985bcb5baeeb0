//! Bytecode disassembler for debugging.
//!
//! Listing layout: a two-line header, then one row per instruction with the
//! offset, the raw bytes in five fixed columns, the mnemonic and, for `LIT`,
//! the decoded operand. An unknown opcode or a `LIT` cut short by the end of
//! the buffer gets a marker row and ends the listing.

use std::fmt;

use crate::bytecode::chunk::read_operand;
use crate::bytecode::instruction::{OpCode, MAX_INSTRUCTION_SIZE};

const HEADER: &str = "OFFSET B0 B1 B2 B3 B4 OPCODE";
const RULE: &str = "------ -- -- -- -- -- ----------------";

/// A displayable listing of a bytecode sequence.
pub struct Disassembly<'a> {
    code: &'a [u8],
}

impl<'a> Disassembly<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code }
    }
}

impl fmt::Display for Disassembly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER)?;
        writeln!(f, "{}", RULE)?;

        let mut offset = 0;
        while offset < self.code.len() {
            match disassemble_instruction(f, self.code, offset)? {
                Some(next) => offset = next,
                None => break,
            }
        }

        writeln!(f)
    }
}

/// Disassemble a bytecode sequence into human-readable output.
pub fn disassemble(code: &[u8]) -> String {
    Disassembly::new(code).to_string()
}

/// Write the disassembly of `code` to stdout.
pub fn print_disassembly(code: &[u8]) {
    print!("{}", Disassembly::new(code));
}

/// Write one row and return the offset of the next instruction, or `None`
/// when the listing cannot continue.
fn disassemble_instruction(
    f: &mut fmt::Formatter<'_>,
    code: &[u8],
    offset: usize,
) -> Result<Option<usize>, fmt::Error> {
    write!(f, "{:06} ", offset)?;

    let byte = code[offset];
    let Some(opcode) = OpCode::from_u8(byte) else {
        write_bytes(f, &code[offset..=offset])?;
        writeln!(f, "{:<16} 0x{:02X}", "??", byte)?;
        return Ok(None);
    };

    match opcode {
        OpCode::Lit => match read_operand(code, offset + 1) {
            Some(value) => {
                write_bytes(f, &code[offset..offset + opcode.size()])?;
                writeln!(f, "{:<16} {:4}", opcode.mnemonic(), value)?;
            }
            None => {
                write_bytes(f, &code[offset..])?;
                writeln!(f, "{:<16} <truncated>", opcode.mnemonic())?;
                return Ok(None);
            }
        },
        _ => {
            write_bytes(f, &code[offset..=offset])?;
            writeln!(f, "{:<16}", opcode.mnemonic())?;
        }
    }

    Ok(Some(offset + opcode.size()))
}

fn write_bytes(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02X} ", byte)?;
    }
    for _ in bytes.len()..MAX_INSTRUCTION_SIZE {
        f.write_str("   ")?;
    }
    Ok(())
}
