//! Error types for the expression compiler.

use std::fmt;

/// An error that occurred while compiling a script.
///
/// A failed compile never touches the program that is currently playing.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    /// Name resolution failed: unknown function, assignment to a constant, ...
    BindError,
}

impl CompileError {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(ErrorKind::LexError, message, line, col)
    }

    pub fn parse(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(ErrorKind::ParseError, message, line, col)
    }

    pub fn bind(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(ErrorKind::BindError, message, line, col)
    }

    fn new(kind: ErrorKind, message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {:?}: {}",
            self.line, self.col, self.kind, self.message
        )
    }
}

impl std::error::Error for CompileError {}
