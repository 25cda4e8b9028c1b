//! Lexer for the expression language.
//!
//! Converts script text into a stream of [`Token`]s. Newlines are plain
//! whitespace; `//` starts a comment that runs to the end of the line.

use super::error::CompileError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                ',' => self.single_char(TokenKind::Comma),
                '+' => self.single_char(TokenKind::Plus),
                '-' => self.single_char(TokenKind::Minus),
                '/' => self.single_char(TokenKind::Slash),
                '%' => self.single_char(TokenKind::Percent),
                '^' => self.single_char(TokenKind::Caret),
                '~' => self.single_char(TokenKind::Tilde),
                '*' => self.one_or_two('*', TokenKind::Star, TokenKind::StarStar),
                '&' => self.one_or_two('&', TokenKind::Amp, TokenKind::AmpAmp),
                '|' => self.one_or_two('|', TokenKind::Pipe, TokenKind::PipePipe),
                '=' => self.one_or_two('=', TokenKind::Assign, TokenKind::EqEq),
                '!' => self.one_or_two('=', TokenKind::Bang, TokenKind::NotEq),
                '<' => self.lex_angle('<', TokenKind::Lt, TokenKind::Le, TokenKind::Shl),
                '>' => self.lex_angle('>', TokenKind::Gt, TokenKind::Ge, TokenKind::Shr),
                '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                '0'..='9' => self.lex_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident(),
                _ => {
                    return Err(CompileError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_trivia(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_next() == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let token = Token {
            kind,
            line: self.line,
            col: self.col,
        };
        self.advance();
        token
    }

    /// Lex `c` or `cc`-style pairs such as `*`/`**` and `=`/`==`.
    fn one_or_two(&mut self, second: char, one: TokenKind, two: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        let kind = if !self.is_at_end() && self.peek() == second {
            self.advance();
            two
        } else {
            one
        };
        Token { kind, line, col }
    }

    /// Lex `<`, `<=`, `<<` (and the `>` family).
    fn lex_angle(&mut self, same: char, bare: TokenKind, eq: TokenKind, shift: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        let kind = match self.chars.get(self.pos) {
            Some('=') => {
                self.advance();
                eq
            }
            Some(&c) if c == same => {
                self.advance();
                shift
            }
            _ => bare,
        };
        Token { kind, line, col }
    }

    fn lex_number(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        let start = self.pos;

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }
        if !self.is_at_end() && self.peek() == '.' {
            self.advance();
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        if !self.is_at_end() && self.peek().is_ascii_alphabetic() {
            return Err(CompileError::lex(
                format!("unexpected character in number: '{}'", self.peek()),
                self.line,
                self.col,
            ));
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        let value: f32 = text
            .parse()
            .map_err(|_| CompileError::lex(format!("invalid number: '{text}'"), line, col))?;

        Ok(Token {
            kind: TokenKind::Number(value),
            line,
            col,
        })
    }

    /// Identifiers may contain `#` after the first character (`C#4`).
    fn lex_ident(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let start = self.pos;

        while !self.is_at_end() {
            let ch = self.peek();
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '#' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        Token {
            kind: TokenKind::Ident(text),
            line,
            col,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 0.5 .25"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(0.5),
                TokenKind::Number(0.25),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn sharp_note_identifier() {
        assert_eq!(
            kinds("C#4+Bb3"),
            vec![
                TokenKind::Ident("C#4".into()),
                TokenKind::Plus,
                TokenKind::Ident("Bb3".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("** << >> <= >= == != && ||"),
            vec![
                TokenKind::StarStar,
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn bytebeat_expression() {
        let k = kinds("t*(42&t>>10)");
        assert_eq!(k.len(), 10);
        assert_eq!(k[4], TokenKind::Amp);
        assert_eq!(k[6], TokenKind::Shr);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// a comment\nx // trailing\n"),
            vec![TokenKind::Ident("x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn positions_track_lines() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].col), (2, 3));
    }

    #[test]
    fn unexpected_character() {
        let err = Lexer::new("1 @ 2").tokenize().unwrap_err();
        assert_eq!(err.kind, crate::dsl::error::ErrorKind::LexError);
        assert_eq!(err.col, 3);
    }

    #[test]
    fn malformed_number() {
        assert!(Lexer::new("12abc").tokenize().is_err());
    }
}
