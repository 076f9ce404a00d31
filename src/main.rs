use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use treelox as lox;

use clap::Parser as ClapParser;

use lox::error::Reporter;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::Token;

/// Built-in prelude, prepended to every script run from a file.
static PRELUDE: &str = include_str!("../builtins/prelude.lox");

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for the Lox language", long_about = None)]
pub struct Cli {
    /// Script file to run; starts a REPL when omitted
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(e) => {
            let _ = e.print();

            match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    process::exit(0)
                }

                // Usage errors exit 64, not clap's default.
                _ => process::exit(64),
            }
        }
    };

    match args.script {
        Some(script) => run_file(&script)?,

        None => run_prompt()?,
    }

    Ok(())
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let user_source: String = fs::read_to_string(path)?;
    let source: String = format!("{}\n{}", PRELUDE, user_source);

    let mut interpreter = Interpreter::new();
    let mut reporter = Reporter::new();

    run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error {
        process::exit(65);
    }

    if reporter.had_runtime_error {
        process::exit(70);
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();

    // Globals, functions and classes persist across lines.
    let mut interpreter = Interpreter::new();
    let mut reporter = Reporter::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        run(&line, &mut interpreter, &mut reporter);

        // A mistake on one line must not kill the session.
        reporter.clear();
    }

    Ok(())
}

fn run(source: &str, interpreter: &mut Interpreter, reporter: &mut Reporter) {
    let scanner = Scanner::new(source.as_bytes());

    let mut tokens: Vec<Token> = Vec::new();
    for result in scanner {
        match result {
            Ok(token) => tokens.push(token),

            Err(e) => reporter.lex_error(&e),
        }
    }

    let mut parser = Parser::new(tokens, reporter);
    let statements = parser.parse();

    // Stop if there was a syntax error.
    if reporter.had_error {
        return;
    }

    let mut resolver = Resolver::new(interpreter, reporter);
    resolver.resolve(&statements);

    // Stop if there was a resolution error.
    if reporter.had_error {
        return;
    }

    if let Err(e) = interpreter.interpret(&statements) {
        reporter.runtime_error(&e);
    }
}
