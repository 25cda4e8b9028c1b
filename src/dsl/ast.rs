//! AST types for the expression language.
//!
//! The parser produces an [`Expr`] tree with names still unresolved. Binding
//! (see [`super::compile`]) turns it into an engine program.

/// Source position of a node, used for bind-time error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f32),
    Var {
        name: String,
        span: Span,
    },
    Assign {
        name: String,
        value: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `a, b`: evaluates both, yields `b`. Chains nest to the right, so
    /// `(a, b, c)` is `Comma(a, Comma(b, c))`.
    Comma(Box<Expr>, Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Pow,
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl UnaryOp {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Not => truth(x == 0.0),
            UnaryOp::BitNot => !to_int(x) as f32,
        }
    }
}

impl BinaryOp {
    /// Apply an eager operator. `And`/`Or` short-circuit and are handled by
    /// the evaluator; here they fall back to their eager meaning.
    #[inline]
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            BinaryOp::Pow => a.powf(b),
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Rem => a % b,
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Shl => to_int(a).wrapping_shl(to_int(b) as u32) as f32,
            BinaryOp::Shr => to_int(a).wrapping_shr(to_int(b) as u32) as f32,
            BinaryOp::Lt => truth(a < b),
            BinaryOp::Le => truth(a <= b),
            BinaryOp::Gt => truth(a > b),
            BinaryOp::Ge => truth(a >= b),
            BinaryOp::Eq => truth(a == b),
            BinaryOp::Ne => truth(a != b),
            BinaryOp::BitAnd => (to_int(a) & to_int(b)) as f32,
            BinaryOp::BitXor => (to_int(a) ^ to_int(b)) as f32,
            BinaryOp::BitOr => (to_int(a) | to_int(b)) as f32,
            BinaryOp::And => and(a, b),
            BinaryOp::Or => or(a, b),
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 7,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
            BinaryOp::Pow => 11,
        }
    }

    pub fn is_right_assoc(self) -> bool {
        self == BinaryOp::Pow
    }
}

/// `a && b`: `b` when both are non-zero, else 0.
#[inline]
pub fn and(a: f32, b: f32) -> f32 {
    if a != 0.0 && b != 0.0 {
        b
    } else {
        0.0
    }
}

/// `a || b`: `a` when it is a usable non-zero value, else `b`.
#[inline]
pub fn or(a: f32, b: f32) -> f32 {
    if a != 0.0 && !a.is_nan() {
        a
    } else if b != 0.0 {
        b
    } else {
        0.0
    }
}

/// Integer view used by bitwise operators: truncated, then wrapped to 32
/// bits. NaN and infinities map to 0.
#[inline]
pub fn to_int(x: f32) -> i32 {
    if !x.is_finite() {
        return 0;
    }
    (x.trunc() as f64).rem_euclid(4_294_967_296.0) as u32 as i32
}

#[inline]
fn truth(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn or_skips_nan_and_zero() {
        assert_eq!(or(f32::NAN, 1.0), 1.0);
        assert_eq!(or(0.0, -1.0), -1.0);
        assert_eq!(or(2.0, -1.0), 2.0);
        assert_eq!(or(f32::NAN, 0.0), 0.0);
    }

    #[test]
    fn and_requires_both() {
        assert_eq!(and(1.0, 3.0), 3.0);
        assert_eq!(and(0.0, 3.0), 0.0);
        assert_eq!(and(1.0, 0.0), 0.0);
    }

    #[test]
    fn bitwise_on_integers() {
        assert_eq!(BinaryOp::BitAnd.apply(42.0, 7.9), 2.0);
        assert_eq!(BinaryOp::Shr.apply(1024.0, 10.0), 1.0);
        assert_eq!(BinaryOp::BitOr.apply(f32::NAN, 5.0), 5.0);
        assert_eq!(UnaryOp::BitNot.apply(0.0), -1.0);
    }

    #[test]
    fn integer_view_wraps_instead_of_saturating() {
        assert_eq!(to_int(-1.5), -1);
        assert_eq!(to_int(2_147_483_904.0), -2_147_483_392);
        assert_eq!(to_int(4_294_967_808.0), 512);
        assert_eq!(to_int(-4_294_967_808.0), -512);
        assert_eq!(to_int(f32::INFINITY), 0);
        assert_eq!(BinaryOp::BitAnd.apply(4_294_967_808.0, 1023.0), 512.0);
    }

    #[test]
    fn comparisons_with_nan_are_false() {
        assert_eq!(BinaryOp::Lt.apply(f32::NAN, 1.0), 0.0);
        assert_eq!(BinaryOp::Ne.apply(f32::NAN, f32::NAN), 1.0);
        assert_eq!(UnaryOp::Not.apply(f32::NAN), 0.0);
        assert_eq!(UnaryOp::Not.apply(0.0), 1.0);
    }
}
