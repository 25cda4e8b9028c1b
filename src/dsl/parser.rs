//! Parser for the expression language.
//!
//! Precedence climbing over the token stream. The comma operator has the
//! lowest precedence and nests to the right, which is what the sequencer and
//! `each` rely on when they walk tuples.

use super::ast::*;
use super::error::CompileError;
use super::token::{Token, TokenKind};

/// Deepest expression tree accepted. Binding and evaluation recurse over
/// the tree, so this also bounds their stack use.
pub const MAX_DEPTH: usize = 256;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a whole script. The token stream must be fully consumed.
    pub fn parse(&mut self) -> Result<Expr, CompileError> {
        if self.is_at_end() {
            let t = self.peek();
            return Err(CompileError::parse("empty script", t.line, t.col));
        }
        let expr = self.parse_comma()?;
        if !self.is_at_end() {
            let t = self.peek();
            return Err(CompileError::parse(
                format!("unexpected token: {:?}", t.kind),
                t.line,
                t.col,
            ));
        }
        Ok(expr)
    }

    fn parse_comma(&mut self) -> Result<Expr, CompileError> {
        let head = self.parse_assign()?;
        if self.check(TokenKind::Comma) {
            self.advance();
            let tail = self.nested(Self::parse_comma)?;
            return Ok(Expr::Comma(Box::new(head), Box::new(tail)));
        }
        Ok(head)
    }

    fn parse_assign(&mut self) -> Result<Expr, CompileError> {
        let target = self.parse_binary(1)?;
        if !self.check(TokenKind::Assign) {
            return Ok(target);
        }
        let eq = self.advance().clone();
        match target {
            Expr::Var { name, span } => {
                let value = self.nested(Self::parse_assign)?;
                Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    span,
                })
            }
            _ => Err(CompileError::parse(
                "left side of '=' must be a variable",
                eq.line,
                eq.col,
            )),
        }
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        let depth = self.depth;

        while let Some(op) = binary_op(&self.peek().kind) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            // Each left-associative link deepens the tree by one.
            self.enter()?;
            self.advance();
            let next_min = if op.is_right_assoc() { prec } else { prec + 1 };
            let rhs = self.nested(|p| p.parse_binary(next_min))?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        self.depth = depth;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            // Unary plus is a no-op.
            TokenKind::Plus => {
                self.advance();
                return self.nested(Self::parse_unary);
            }
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let operand = self.nested(Self::parse_unary)?;
                Ok(match (op, operand) {
                    (UnaryOp::Neg, Expr::Number(n)) => Expr::Number(-n),
                    (op, operand) => Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                })
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let t = self.advance().clone();
        match t.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Ident(name) => {
                let span = Span {
                    line: t.line,
                    col: t.col,
                };
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let args = self.parse_args()?;
                    Ok(Expr::Call { name, args, span })
                } else {
                    Ok(Expr::Var { name, span })
                }
            }
            TokenKind::LParen => {
                if self.check(TokenKind::RParen) {
                    return Err(CompileError::parse("empty parentheses", t.line, t.col));
                }
                let inner = self.nested(Self::parse_comma)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(CompileError::parse(
                format!("expected expression, got {other:?}"),
                t.line,
                t.col,
            )),
        }
    }

    /// Parse call arguments after the opening parenthesis.
    fn parse_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = Vec::new();
        if self.check(TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.nested(Self::parse_assign)?);
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    // --- Helpers ---

    fn enter(&mut self) -> Result<(), CompileError> {
        if self.depth >= MAX_DEPTH {
            let t = self.peek();
            return Err(CompileError::parse(
                format!("expression nested deeper than {MAX_DEPTH} levels"),
                t.line,
                t.col,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.enter()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, CompileError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(CompileError::parse(
                format!("expected {kind:?}, got {:?}", t.kind),
                t.line,
                t.col,
            ))
        }
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::StarStar => BinaryOp::Pow,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::Ne,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        _ => return None,
    })
}
