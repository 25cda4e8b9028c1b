//! Token types for the expression lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Ident(String),
    Number(f32),

    // Delimiters
    LParen,
    RParen,
    Comma,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar, // **
    Slash,
    Percent,
    Shl, // <<
    Shr, // >>
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,   // ==
    NotEq,  // !=
    Amp,    // &
    AmpAmp, // &&
    Pipe,   // |
    PipePipe,
    Caret,
    Tilde,
    Bang,
    Assign, // =

    // Special
    Eof,
}
