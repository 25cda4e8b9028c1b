//! Binder: resolves a parsed [`Expr`] against an engine's variable table and
//! function library, producing an executable [`Program`].
//!
//! Binding runs in two passes. [`check`] validates the whole tree without
//! touching the variable table, so a rejected script leaves no trace; the
//! second pass interns variables and hands out one state slot per call site.

use super::ast::{Expr, Span};
use super::error::CompileError;
use crate::engine::program::{Node, Program};
use crate::engine::vars::VarTable;
use crate::library::{Builtin, Library};

/// Bind `expr` into a fresh program.
pub fn bind(expr: &Expr, vars: &mut VarTable, lib: &Library) -> Result<Program, CompileError> {
    check(expr, vars, lib)?;
    let mut binder = Binder {
        vars,
        lib,
        slots: 0,
    };
    let root = binder.bind(expr)?;
    Ok(Program::new(root, binder.slots))
}

/// Validate names and assignment targets.
fn check(expr: &Expr, vars: &VarTable, lib: &Library) -> Result<(), CompileError> {
    match expr {
        Expr::Number(_) | Expr::Var { .. } => Ok(()),
        Expr::Assign { name, value, span } => {
            check_writable(name, *span, vars)?;
            check(value, vars, lib)
        }
        Expr::Unary { operand, .. } => check(operand, vars, lib),
        Expr::Binary { lhs, rhs, .. } => {
            check(lhs, vars, lib)?;
            check(rhs, vars, lib)
        }
        Expr::Comma(head, tail) => {
            check(head, vars, lib)?;
            check(tail, vars, lib)
        }
        Expr::Call { name, args, span } => {
            let func = lib.lookup(name).ok_or_else(|| {
                CompileError::bind(format!("unknown function '{name}'"), span.line, span.col)
            })?;
            if func == Builtin::Each && args.len() >= 3 {
                check_pattern(&args[0], *span, vars)?;
            }
            args.iter().try_for_each(|arg| check(arg, vars, lib))
        }
    }
}

fn check_writable(name: &str, span: Span, vars: &VarTable) -> Result<(), CompileError> {
    match vars.lookup(name) {
        Some(id) if vars.is_constant(id) => Err(CompileError::bind(
            format!("cannot assign to constant '{name}'"),
            span.line,
            span.col,
        )),
        _ => Ok(()),
    }
}

/// An `each` pattern is a variable or a tuple of variables.
fn check_pattern(pattern: &Expr, call: Span, vars: &VarTable) -> Result<(), CompileError> {
    match pattern {
        Expr::Var { name, span } => check_writable(name, *span, vars),
        Expr::Comma(head, tail) => {
            check_pattern(head, call, vars)?;
            check_pattern(tail, call, vars)
        }
        _ => Err(CompileError::bind(
            "each() pattern must be a variable or a tuple of variables",
            call.line,
            call.col,
        )),
    }
}

struct Binder<'v, 'l> {
    vars: &'v mut VarTable,
    lib: &'l Library,
    slots: usize,
}

impl Binder<'_, '_> {
    fn bind(&mut self, expr: &Expr) -> Result<Node, CompileError> {
        Ok(match expr {
            Expr::Number(v) => Node::Const(*v),
            Expr::Var { name, .. } => Node::Var(self.vars.intern(name)),
            Expr::Assign { name, value, .. } => {
                let id = self.vars.intern(name);
                Node::Assign(id, Box::new(self.bind(value)?))
            }
            Expr::Unary { op, operand } => Node::Unary(*op, Box::new(self.bind(operand)?)),
            Expr::Binary { op, lhs, rhs } => {
                Node::Binary(*op, Box::new(self.bind(lhs)?), Box::new(self.bind(rhs)?))
            }
            Expr::Comma(head, tail) => {
                Node::Comma(Box::new(self.bind(head)?), Box::new(self.bind(tail)?))
            }
            Expr::Call { name, args, span } => {
                let func = self.lib.lookup(name).ok_or_else(|| {
                    CompileError::bind(format!("unknown function '{name}'"), span.line, span.col)
                })?;
                let slot = self.slots;
                self.slots += 1;
                let args = if func == Builtin::Each && args.len() >= 3 {
                    self.bind_each(args)?
                } else {
                    args.iter().map(|a| self.bind(a)).collect::<Result<_, _>>()?
                };
                Node::Call { func, slot, args }
            }
        })
    }

    /// `each(pattern, body, l1, .., ln)` becomes
    /// `[pattern, body_1, .., body_n, l1, .., ln]` where every body copy is
    /// bound separately and so owns its own state slots.
    fn bind_each(&mut self, args: &[Expr]) -> Result<Vec<Node>, CompileError> {
        let (pattern, body, lists) = (&args[0], &args[1], &args[2..]);
        let mut nodes = Vec::with_capacity(1 + 2 * lists.len());
        nodes.push(self.bind(pattern)?);
        for _ in lists {
            nodes.push(self.bind(body)?);
        }
        for list in lists {
            nodes.push(self.bind(list)?);
        }
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;
    use crate::dsl::Compiler;
    use crate::instrument::{PcmBank, PianoBank};
    use std::sync::Arc;

    fn library() -> Library {
        Library::new(Arc::new(PcmBank::default()), Arc::new(PianoBank::default()))
    }

    fn bind_src(src: &str, vars: &mut VarTable) -> Result<Program, CompileError> {
        let expr = Compiler::parse(src).unwrap();
        bind(&expr, vars, &library())
    }

    #[test]
    fn one_slot_per_call_site() {
        let mut vars = VarTable::new();
        let program = bind_src("sin(440) + sin(220) * hz(0)", &mut vars).unwrap();
        assert_eq!(program.slot_count(), 3);

        let program = bind_src("x = 1, x + 2", &mut vars).unwrap();
        assert_eq!(program.slot_count(), 0);
    }

    #[test]
    fn each_copies_the_body_per_list() {
        let mut vars = VarTable::new();
        // each + 3 copies of (sin + hz)
        let program = bind_src("each(f, sin(hz(f)), 1, 2, 3)", &mut vars).unwrap();
        assert_eq!(program.slot_count(), 7);
    }

    #[test]
    fn variables_are_created_on_first_use() {
        let mut vars = VarTable::new();
        bind_src("a = b + 1", &mut vars).unwrap();
        assert_eq!(vars.value_of("a"), Some(0.0));
        assert_eq!(vars.value_of("b"), Some(0.0));
    }

    #[test]
    fn unknown_function_is_rejected() {
        let mut vars = VarTable::new();
        let err = bind_src("1 + nope(2)", &mut vars).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BindError);
        assert_eq!((err.line, err.col), (1, 5));
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn constants_are_read_only() {
        let mut vars = VarTable::new();
        vars.define_constant("C4", -9.0);
        assert!(bind_src("C4 + 1", &mut vars).is_ok());
        let err = bind_src("C4 = 1", &mut vars).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BindError);
        assert!(bind_src("each(C4, C4, 1, 2)", &mut vars).is_err());
    }

    #[test]
    fn failed_bind_leaves_variables_untouched() {
        let mut vars = VarTable::new();
        assert!(bind_src("fresh = 1, nope()", &mut vars).is_err());
        assert_eq!(vars.lookup("fresh"), None);
    }

    #[test]
    fn each_pattern_must_be_variables() {
        let mut vars = VarTable::new();
        assert!(bind_src("each((a, b), a + b, (1, 2))", &mut vars).is_ok());
        let err = bind_src("each(1, 2, 3)", &mut vars).unwrap_err();
        assert!(err.message.contains("pattern"));
    }
}
