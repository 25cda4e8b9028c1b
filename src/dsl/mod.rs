//! Expression compiler: source text → tokens → [`Expr`] → bound program.
//!
//! Parsing needs no engine state and can run on any thread; binding
//! ([`bind`]) resolves names against a specific engine's variable table and
//! function library.

pub mod ast;
pub mod compile;
pub mod error;
pub mod lexer;
pub mod note;
pub mod parser;
pub mod token;

pub use ast::*;
pub use compile::bind;
pub use error::{CompileError, ErrorKind};

use lexer::Lexer;
use parser::Parser;

/// The script front end.
pub struct Compiler;

impl Compiler {
    /// Parse script source into an unbound expression tree.
    pub fn parse(source: &str) -> Result<Expr, CompileError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse()
    }
}
