//! Stack-based virtual machine for executing bytecode.

use crate::bytecode::chunk::read_operand;
use crate::bytecode::instruction::OpCode;
use crate::error::RuntimeError;

/// Maximum stack size.
pub const STACK_MAX: usize = 1024;

/// Result type for VM operations.
pub type VMResult<T> = Result<T, RuntimeError>;

/// The virtual machine. A `VM` can run any number of programs; each run
/// starts with an empty stack.
#[derive(Debug)]
pub struct VM {
    stack: Vec<i32>,
}

impl VM {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(STACK_MAX),
        }
    }

    /// Execute `code` from offset 0 until `HALT` and return the value it pops.
    pub fn run(&mut self, code: &[u8]) -> VMResult<i32> {
        self.stack.clear();
        self.execute(code)
    }

    /// Values left on the stack by the last run.
    pub fn stack(&self) -> &[i32] {
        &self.stack
    }

    /// Main execution loop.
    fn execute(&mut self, code: &[u8]) -> VMResult<i32> {
        let mut ip = 0;

        loop {
            let offset = ip;
            let byte = *code.get(ip).ok_or(RuntimeError::UnexpectedEnd(offset))?;
            let opcode =
                OpCode::from_u8(byte).ok_or_else(|| RuntimeError::invalid_opcode(byte, offset))?;

            self.check_stack(opcode, offset)?;

            #[cfg(feature = "trace")]
            eprintln!(
                "{:06} {:<16} depth={}",
                offset,
                opcode.mnemonic(),
                self.stack.len()
            );

            ip += opcode.size();

            match opcode {
                OpCode::Add => self.binary_op(opcode, offset, |a, b| Ok(a.wrapping_add(b)))?,
                OpCode::Sub => self.binary_op(opcode, offset, |a, b| Ok(a.wrapping_sub(b)))?,
                OpCode::Mul => self.binary_op(opcode, offset, |a, b| Ok(a.wrapping_mul(b)))?,
                OpCode::Div => self.binary_op(opcode, offset, |a, b| {
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero(offset));
                    }
                    Ok(a.wrapping_div(b))
                })?,

                OpCode::Neg => {
                    let value = self.pop(opcode, offset)?;
                    self.push(value.wrapping_neg());
                }

                OpCode::Lit => {
                    let value = read_operand(code, offset + 1).ok_or(
                        RuntimeError::TruncatedOperand {
                            op: opcode.mnemonic(),
                            offset,
                        },
                    )?;
                    self.push(value);
                }

                OpCode::Halt => return self.pop(opcode, offset),
            }
        }
    }

    /// Verify that `op` has enough operands and that its results fit.
    fn check_stack(&self, op: OpCode, offset: usize) -> VMResult<()> {
        let depth = self.stack.len();
        if depth < op.pops() {
            return Err(RuntimeError::stack_underflow(
                op.mnemonic(),
                op.pops(),
                depth,
                offset,
            ));
        }
        if depth - op.pops() + op.pushes() > STACK_MAX {
            return Err(RuntimeError::StackOverflow(offset));
        }
        Ok(())
    }

    fn push(&mut self, value: i32) {
        self.stack.push(value);
    }

    fn pop(&mut self, op: OpCode, offset: usize) -> VMResult<i32> {
        self.stack.pop().ok_or_else(|| {
            RuntimeError::stack_underflow(op.mnemonic(), op.pops(), 0, offset)
        })
    }

    fn binary_op<F>(&mut self, op: OpCode, offset: usize, f: F) -> VMResult<()>
    where
        F: FnOnce(i32, i32) -> VMResult<i32>,
    {
        let b = self.pop(op, offset)?;
        let a = self.pop(op, offset)?;
        let result = f(a, b)?;
        self.push(result);
        Ok(())
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADD: u8 = OpCode::Add as u8;
    const SUB: u8 = OpCode::Sub as u8;
    const MUL: u8 = OpCode::Mul as u8;
    const DIV: u8 = OpCode::Div as u8;
    const NEG: u8 = OpCode::Neg as u8;
    const LIT: u8 = OpCode::Lit as u8;
    const HALT: u8 = OpCode::Halt as u8;

    fn run(code: &[u8]) -> VMResult<i32> {
        VM::new().run(code)
    }

    #[test]
    fn test_literal() {
        assert_eq!(run(&[LIT, 1, 0, 0, 0, HALT]), Ok(1));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run(&[LIT, 2, 0, 0, 0, LIT, 3, 0, 0, 0, ADD, HALT]), Ok(5));
        assert_eq!(
            run(&[LIT, 1, 0, 0, 0, LIT, 2, 0, 0, 0, LIT, 3, 0, 0, 0, ADD, ADD, HALT]),
            Ok(6)
        );
        assert_eq!(run(&[LIT, 1, 0, 0, 0, NEG, HALT]), Ok(-1));
        assert_eq!(run(&[LIT, 2, 0, 0, 0, LIT, 3, 0, 0, 0, MUL, HALT]), Ok(6));
        assert_eq!(run(&[LIT, 4, 0, 0, 0, LIT, 2, 0, 0, 0, DIV, HALT]), Ok(2));
        assert_eq!(run(&[LIT, 2, 0, 0, 0, LIT, 5, 0, 0, 0, SUB, HALT]), Ok(-3));
    }

    #[test]
    fn test_negative_literal_operand() {
        assert_eq!(run(&[LIT, 0xFE, 0xFF, 0xFF, 0xFF, HALT]), Ok(-2));
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        assert_eq!(run(&[LIT, 7, 0, 0, 0, NEG, LIT, 2, 0, 0, 0, DIV, HALT]), Ok(-3));
    }

    #[test]
    fn test_arithmetic_wraps() {
        let max = i32::MAX.to_le_bytes();
        let min = i32::MIN.to_le_bytes();
        assert_eq!(
            run(&[LIT, max[0], max[1], max[2], max[3], LIT, 1, 0, 0, 0, ADD, HALT]),
            Ok(i32::MIN)
        );
        assert_eq!(
            run(&[LIT, min[0], min[1], min[2], min[3], LIT, 0xFF, 0xFF, 0xFF, 0xFF, DIV, HALT]),
            Ok(i32::MIN)
        );
        assert_eq!(run(&[LIT, min[0], min[1], min[2], min[3], NEG, HALT]), Ok(i32::MIN));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            run(&[LIT, 1, 0, 0, 0, LIT, 0, 0, 0, 0, DIV, HALT]),
            Err(RuntimeError::DivisionByZero(10))
        );
    }

    #[test]
    fn test_stack_underflow() {
        assert_eq!(
            run(&[LIT, 1, 0, 0, 0, ADD, HALT]),
            Err(RuntimeError::stack_underflow("ADD", 2, 1, 5))
        );
        assert_eq!(
            run(&[HALT]),
            Err(RuntimeError::stack_underflow("HALT", 1, 0, 0))
        );
        assert_eq!(
            run(&[NEG, HALT]),
            Err(RuntimeError::stack_underflow("NEG", 1, 0, 0))
        );
    }

    #[test]
    fn test_stack_overflow() {
        let mut code = Vec::new();
        for _ in 0..STACK_MAX {
            code.extend_from_slice(&[LIT, 1, 0, 0, 0]);
        }
        let mut full = code.clone();
        full.extend_from_slice(&[LIT, 1, 0, 0, 0, HALT]);
        assert_eq!(
            run(&full),
            Err(RuntimeError::StackOverflow(STACK_MAX * 5))
        );

        // Exactly STACK_MAX values fit.
        code.push(HALT);
        assert_eq!(run(&code), Ok(1));
    }

    #[test]
    fn test_invalid_opcode() {
        assert_eq!(
            run(&[LIT, 1, 0, 0, 0, 0x7F, HALT]),
            Err(RuntimeError::invalid_opcode(0x7F, 5))
        );
    }

    #[test]
    fn test_truncated_operand() {
        assert_eq!(
            run(&[LIT, 1, 0]),
            Err(RuntimeError::TruncatedOperand { op: "LIT", offset: 0 })
        );
    }

    #[test]
    fn test_missing_halt() {
        assert_eq!(run(&[LIT, 1, 0, 0, 0]), Err(RuntimeError::UnexpectedEnd(5)));
        assert_eq!(run(&[]), Err(RuntimeError::UnexpectedEnd(0)));
    }

    #[test]
    fn test_vm_is_reusable() {
        let mut vm = VM::new();
        assert_eq!(vm.run(&[LIT, 1, 0, 0, 0, LIT, 2, 0, 0, 0, HALT]), Ok(2));
        assert_eq!(vm.stack(), &[1]);
        assert_eq!(vm.run(&[LIT, 3, 0, 0, 0, HALT]), Ok(3));
        assert!(vm.stack().is_empty());
    }
}
