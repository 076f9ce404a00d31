//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The [`Reporter`] at the bottom of the module is the one object that prints
//! diagnostics (to standard error) and records whether any occurred; it is
//! threaded through the parser and resolver and consulted by the driver when
//! choosing an exit code.

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Runtime evaluation error, rendered the way the driver reports it.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Shared diagnostic reporter.
///
/// Compile diagnostics are formatted `[line N] Error<loc>: <message>` where
/// `<loc>` is ` at end` for the EOF token and ` at '<lexeme>'` otherwise.
/// Runtime diagnostics use the [`LoxError::Runtime`] rendering. Both go to
/// standard error only; nothing here touches standard output.
#[derive(Debug, Default)]
pub struct Reporter {
    pub had_error: bool,
    pub had_runtime_error: bool,
    errors_reported: usize,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compile diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.errors_reported
    }

    /// Reset the compile-error flag. The REPL calls this between lines.
    pub fn clear(&mut self) {
        self.had_error = false;
    }

    /// Report a compile error with no offending token (scanner errors).
    pub fn error(&mut self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// Report a compile error at a specific token.
    pub fn error_at(&mut self, token: &Token, message: &str) {
        if token.token_type == TokenType::EOF {
            self.report(token.line, " at end", message);
        } else {
            let location: String = format!(" at '{}'", token.lexeme);
            self.report(token.line, &location, message);
        }
    }

    /// Print a scanner error (already carries its own rendering).
    pub fn lex_error(&mut self, error: &LoxError) {
        eprintln!("{}", error);
        self.had_error = true;
        self.errors_reported += 1;
    }

    /// Print a runtime error and latch the runtime flag.
    pub fn runtime_error(&mut self, error: &LoxError) {
        eprintln!("{}", error);
        self.had_runtime_error = true;
    }

    fn report(&mut self, line: usize, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
        self.had_error = true;
        self.errors_reported += 1;
    }
}
