//! Built-in self-test suite.
//!
//! These checks run inside the shipped binary (`bytecalc test`), so a build
//! can be verified on the target machine without the test harness.

use std::fmt::Debug;

use thiserror::Error;

use crate::buffer::Buffer;
use crate::bytecode::{OpCode, VM};
use crate::intern::SymbolTable;
use crate::lexer::TokenKind;

/// The first check that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("self-test '{suite}' failed: {message}")]
pub struct SelfTestFailure {
    pub suite: &'static str,
    pub message: String,
}

/// Outcome of one passing suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub name: &'static str,
    pub checks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfTestReport {
    pub suites: Vec<SuiteReport>,
}

impl SelfTestReport {
    pub fn total_checks(&self) -> usize {
        self.suites.iter().map(|s| s.checks).sum()
    }
}

type CheckResult = Result<(), SelfTestFailure>;

struct Suite {
    name: &'static str,
    checks: usize,
}

impl Suite {
    fn fail(&self, message: impl Into<String>) -> SelfTestFailure {
        SelfTestFailure {
            suite: self.name,
            message: message.into(),
        }
    }

    fn check(&mut self, condition: bool, what: &str) -> CheckResult {
        self.checks += 1;
        if condition {
            Ok(())
        } else {
            Err(self.fail(what))
        }
    }

    fn check_eq<T: PartialEq + Debug>(&mut self, actual: T, expected: T, what: &str) -> CheckResult {
        self.checks += 1;
        if actual == expected {
            Ok(())
        } else {
            Err(self.fail(format!(
                "{}: expected {:?}, got {:?}",
                what, expected, actual
            )))
        }
    }
}

type SuiteFn = fn(&mut Suite) -> CheckResult;

const SUITES: &[(&str, SuiteFn)] = &[
    ("buffer", buffer_suite),
    ("intern", intern_suite),
    ("lex", lex_suite),
    ("parse", parse_suite),
    ("vm", vm_suite),
    ("compile", compile_suite),
];

/// Names of the suites, in the order they run.
pub fn suite_names() -> impl Iterator<Item = &'static str> {
    SUITES.iter().map(|(name, _)| *name)
}

/// Run every suite in order, stopping at the first failed check.
pub fn run_self_tests() -> Result<SelfTestReport, SelfTestFailure> {
    let mut report = SelfTestReport::default();

    for &(name, run) in SUITES {
        let mut suite = Suite { name, checks: 0 };
        run(&mut suite)?;
        report.suites.push(SuiteReport {
            name,
            checks: suite.checks,
        });
    }

    Ok(report)
}

fn buffer_suite(t: &mut Suite) -> CheckResult {
    let mut buf: Buffer<usize> = Buffer::new();
    t.check_eq(buf.len(), 0, "empty length")?;
    t.check_eq(buf.capacity(), 0, "empty capacity")?;

    let n = 1024;
    for i in 0..n {
        buf.push(i);
    }
    t.check_eq(buf.len(), n, "length after pushes")?;
    t.check(buf.capacity() >= n, "capacity covers length")?;
    t.check(
        buf.iter().enumerate().all(|(i, value)| *value == i),
        "elements in push order",
    )?;

    buf.free();
    t.check_eq(buf.len(), 0, "length after free")?;
    buf.free();
    t.check_eq(buf.capacity(), 0, "capacity after double free")
}

fn intern_suite(t: &mut Suite) -> CheckResult {
    let mut table = SymbolTable::new();
    let a = String::from("hello");
    let b = String::from("hello");

    let ia = table.intern(&a);
    t.check_eq(table.intern(&b), ia, "identical strings share a symbol")?;
    t.check(table.intern("hello!") != ia, "longer string is distinct")?;
    t.check(table.intern("hell") != ia, "prefix is distinct")?;
    t.check_eq(table.get(ia), Some("hello"), "canonical text")
}

fn lex_suite(t: &mut Suite) -> CheckResult {
    let ints: [u64; 4] = [
        18446744073709551615,
        0xffff_ffff_ffff_ffff,
        0xf,
        0o42,
    ];
    check_tokens(
        t,
        "18446744073709551615 0xffff_ffff_ffff_ffff 0b1111 042",
        &ints.map(TokenKind::Int),
    )?;

    let floats = [3.14, 0.123, 42.0, 3e10];
    check_tokens(t, "3.14 .123 42. 3e10", &floats.map(TokenKind::Float))?;

    check_tokens(t, r"'a' '\n' '\r'", &[97u64, 10, 13].map(TokenKind::Int))?;

    let mut table = SymbolTable::new();
    let xy = table.intern("XY");
    let hello = table.intern("_HELLO1");
    let (tokens, diagnostics) = crate::tokenize("XY+(XY)_HELLO1,234+994", &mut table)
        .map_err(|e| t.fail(e.to_string()))?;
    let kinds: Vec<TokenKind> = tokens.iter().map(|tok| tok.kind).collect();
    t.check(diagnostics.is_empty(), "no diagnostics for identifiers")?;
    t.check_eq(
        kinds,
        vec![
            TokenKind::Name(xy),
            TokenKind::Punct(b'+'),
            TokenKind::Punct(b'('),
            TokenKind::Name(xy),
            TokenKind::Punct(b')'),
            TokenKind::Name(hello),
            TokenKind::Punct(b','),
            TokenKind::Int(234),
            TokenKind::Punct(b'+'),
            TokenKind::Int(994),
            TokenKind::Eof,
        ],
        "identifier and punctuation tokens",
    )?;

    // A bad literal is reported and lexing goes on.
    let (tokens, diagnostics) =
        crate::tokenize("0b12 3", &mut table).map_err(|e| t.fail(e.to_string()))?;
    t.check_eq(diagnostics.len(), 1, "digit out of range is reported")?;
    t.check_eq(
        tokens.last().map(|tok| tok.kind),
        Some(TokenKind::Eof),
        "lexing continues past a bad literal",
    )?;
    t.check_eq(
        tokens.get(1).map(|tok| tok.kind),
        Some(TokenKind::Int(3)),
        "token after a bad literal",
    )
}

fn check_tokens(t: &mut Suite, source: &str, expected: &[TokenKind]) -> CheckResult {
    let mut table = SymbolTable::new();
    let (tokens, diagnostics) =
        crate::tokenize(source, &mut table).map_err(|e| t.fail(e.to_string()))?;
    t.check(diagnostics.is_empty(), source)?;

    let mut kinds: Vec<TokenKind> = tokens.iter().map(|tok| tok.kind).collect();
    t.check_eq(kinds.pop(), Some(TokenKind::Eof), source)?;
    t.check_eq(kinds.as_slice(), expected, source)
}

fn parse_suite(t: &mut Suite) -> CheckResult {
    let cases = [
        ("1", 1),
        ("-1", -1),
        ("1-(-1)", 2),
        ("(1)", 1),
        ("1-2-3", -4),
        ("2*3+4*5", 26),
        ("2+-3", -1),
        ("2*(3+4)*5", 70),
    ];

    for (source, expected) in cases {
        let evaluation = crate::eval(source).map_err(|e| t.fail(format!("{}: {}", source, e)))?;
        t.check_eq(evaluation.folded, expected, source)?;
        t.check_eq(evaluation.value, expected, source)?;
    }

    Ok(())
}

fn vm_suite(t: &mut Suite) -> CheckResult {
    const ADD: u8 = OpCode::Add as u8;
    const MUL: u8 = OpCode::Mul as u8;
    const DIV: u8 = OpCode::Div as u8;
    const NEG: u8 = OpCode::Neg as u8;
    const LIT: u8 = OpCode::Lit as u8;
    const HALT: u8 = OpCode::Halt as u8;

    let programs: [(&[u8], i32); 6] = [
        (&[LIT, 1, 0, 0, 0, HALT], 1),
        (&[LIT, 2, 0, 0, 0, LIT, 3, 0, 0, 0, ADD, HALT], 5),
        (
            &[LIT, 1, 0, 0, 0, LIT, 2, 0, 0, 0, LIT, 3, 0, 0, 0, ADD, ADD, HALT],
            6,
        ),
        (&[LIT, 1, 0, 0, 0, NEG, HALT], -1),
        (&[LIT, 2, 0, 0, 0, LIT, 3, 0, 0, 0, MUL, HALT], 6),
        (&[LIT, 4, 0, 0, 0, LIT, 2, 0, 0, 0, DIV, HALT], 2),
    ];

    let mut vm = VM::new();
    for (code, expected) in programs {
        t.check_eq(vm.run(code), Ok(expected), "program result")?;
    }

    Ok(())
}

fn compile_suite(t: &mut Suite) -> CheckResult {
    let cases = [
        ("1", 1),
        ("-1", -1),
        ("1+2", 3),
        ("2*3", 6),
        ("(2*3)+(4*5)", 26),
        ("10/2", 5),
    ];

    for (source, expected) in cases {
        let chunk = crate::compile(source).map_err(|e| t.fail(format!("{}: {}", source, e)))?;
        t.check_eq(
            chunk.as_bytes().last().copied(),
            Some(OpCode::Halt as u8),
            "code ends in HALT",
        )?;
        let value = crate::execute(chunk.as_bytes())
            .map_err(|e| t.fail(format!("{}: {}", source, e)))?;
        t.check_eq(value, expected, source)?;

        let again = crate::compile(source).map_err(|e| t.fail(e.to_string()))?;
        t.check_eq(again.as_bytes(), chunk.as_bytes(), "identical code on recompile")?;
    }

    Ok(())
}
