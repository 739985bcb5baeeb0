//! bytecalc CLI: run the self-tests or compile, run and inspect expressions.

use std::env;
use std::io::{self, Read};
use std::process;

use colored::Colorize;

use bytecalc::error::{BytecalcError, LexerError};
use bytecalc::intern::SymbolTable;
use bytecalc::selftest;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI command to execute.
enum Command {
    /// Run the built-in self-test suite
    Test,
    /// Compile and execute an expression
    Eval { source: String },
    /// Print the disassembly of an expression
    Disasm { source: String },
    /// Print one dump line per token
    Tokens { source: String },
}

/// CLI options parsed from arguments.
struct Options {
    command: Command,
    no_color: bool,
}

fn print_usage() {
    eprintln!("bytecalc {} - integer expression compiler and VM", VERSION);
    eprintln!();
    eprintln!("Usage: bytecalc [options] [command]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  test                 Run the self-test suite (default)");
    eprintln!("  eval <expr>          Compile and execute an expression");
    eprintln!("  disasm <expr>        Print the bytecode listing for an expression");
    eprintln!("  tokens <source>      Print the tokens of a source string");
    eprintln!();
    eprintln!("An argument of '-' reads the source from stdin.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --no-color      Disable colored output");
    eprintln!("  --help, -h      Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  bytecalc eval '2*(3+4)*5'");
    eprintln!("  bytecalc disasm '-1 + 0x10'");
    eprintln!("  echo \"'a' + 1\" | bytecalc eval -");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message);
    print_usage();
    process::exit(64);
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut options = Options {
        command: Command::Test,
        no_color: false,
    };
    let mut command_seen = false;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--no-color" => options.no_color = true,
            "test" | "eval" | "disasm" | "tokens" if !command_seen => {
                command_seen = true;
                if arg == "test" {
                    options.command = Command::Test;
                } else {
                    i += 1;
                    let Some(source) = args.get(i).cloned() else {
                        usage_error(&format!("{} command requires an expression", arg));
                    };
                    options.command = match arg.as_str() {
                        "eval" => Command::Eval { source },
                        "disasm" => Command::Disasm { source },
                        _ => Command::Tokens { source },
                    };
                }
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                usage_error(&format!("Unknown option: {}", arg));
            }
            _ => usage_error(&format!("Unexpected argument: {}", arg)),
        }
        i += 1;
    }

    options
}

fn main() {
    let options = parse_args();

    if options.no_color {
        colored::control::set_override(false);
    }

    match &options.command {
        Command::Test => run_self_tests(),
        Command::Eval { source } => run_eval(source),
        Command::Disasm { source } => run_disasm(source),
        Command::Tokens { source } => run_tokens(source),
    }
}

/// Expression text from an argument, or from stdin for `-`.
fn read_source(arg: &str) -> Result<String, BytecalcError> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;
    Ok(source)
}

fn report_diagnostics(diagnostics: &[LexerError]) {
    for diagnostic in diagnostics {
        eprintln!("{} {}", "SYNTAX ERROR:".yellow(), diagnostic);
    }
}

fn fatal(err: &BytecalcError) -> ! {
    eprintln!("{} {}", "FATAL:".red().bold(), err);
    process::exit(err.exit_code());
}

fn run_self_tests() {
    match selftest::run_self_tests() {
        Ok(report) => {
            for suite in &report.suites {
                println!(
                    "{:<10} {} ({} checks)",
                    suite.name,
                    "ok".green(),
                    suite.checks
                );
            }
            println!(
                "{} suites, {} checks passed",
                report.suites.len(),
                report.total_checks()
            );
        }
        Err(failure) => {
            eprintln!("{} {}", "FATAL:".red().bold(), failure);
            process::exit(70);
        }
    }
}

fn run_eval(arg: &str) {
    let source = read_source(arg).unwrap_or_else(|e| fatal(&e));

    match bytecalc::eval(&source) {
        Ok(evaluation) => {
            report_diagnostics(&evaluation.diagnostics);
            println!("{}", evaluation.value);
            if evaluation.folded != evaluation.value {
                eprintln!("note: compile-time value was {}", evaluation.folded);
            }
        }
        Err(e) => fatal(&e),
    }
}

fn run_disasm(arg: &str) {
    let source = read_source(arg).unwrap_or_else(|e| fatal(&e));

    let mut symbols = SymbolTable::new();
    let mut chunk = bytecalc::Chunk::new();
    match bytecalc::compile_into(&source, &mut symbols, &mut chunk) {
        Ok(compiled) => {
            report_diagnostics(&compiled.diagnostics);
            bytecalc::print_disassembly(chunk.as_bytes());
        }
        Err(e) => fatal(&e),
    }
}

fn run_tokens(arg: &str) {
    let source = read_source(arg).unwrap_or_else(|e| fatal(&e));

    let mut symbols = SymbolTable::new();
    match bytecalc::tokenize(&source, &mut symbols) {
        Ok((tokens, diagnostics)) => {
            for token in &tokens {
                println!("{}", token.display(&source));
            }
            report_diagnostics(&diagnostics);
        }
        Err(e) => fatal(&BytecalcError::from(e)),
    }
}
