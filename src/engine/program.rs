//! Compiled programs and the per-sample evaluator.
//!
//! A [`Program`] is a bound expression tree plus a flat arena of node states.
//! Every function-call node carries the index of its own arena slot, so two
//! call sites never share state and the state lives exactly as long as the
//! program.

use rand::Rng;

use super::vars::{VarId, VarTable};
use crate::dsl::ast::{and, or, BinaryOp, UnaryOp};
use crate::library::{Builtin, Library, NodeState, Runtime};

/// A bound expression node.
#[derive(Debug)]
pub enum Node {
    Const(f32),
    Var(VarId),
    Assign(VarId, Box<Node>),
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Comma(Box<Node>, Box<Node>),
    Call {
        func: Builtin,
        slot: usize,
        args: Vec<Node>,
    },
}

impl Node {
    /// Split a comma node into head and tail.
    pub fn as_pair(&self) -> Option<(&Node, &Node)> {
        match self {
            Node::Comma(head, tail) => Some((&**head, &**tail)),
            _ => None,
        }
    }

    /// Number of elements in a right-nested comma chain (1 for a non-tuple).
    pub fn chain_len(&self) -> usize {
        let mut n = 1;
        let mut node = self;
        while let Node::Comma(_, tail) = node {
            n += 1;
            node = &**tail;
        }
        n
    }

    /// The `index`-th element of a comma chain. Indices past the end give
    /// the last element.
    pub fn chain_nth(&self, index: usize) -> &Node {
        let mut node = self;
        for _ in 0..index {
            match node {
                Node::Comma(_, tail) => node = &**tail,
                _ => break,
            }
        }
        match node {
            Node::Comma(head, _) => &**head,
            _ => node,
        }
    }
}

/// A compiled script ready to be evaluated once per sample.
#[derive(Debug)]
pub struct Program {
    root: Node,
    states: Vec<NodeState>,
}

impl Program {
    pub(crate) fn new(root: Node, slots: usize) -> Self {
        let mut states = Vec::with_capacity(slots);
        states.resize_with(slots, NodeState::default);
        Self { root, states }
    }

    /// Number of state slots (one per function-call node).
    pub fn slot_count(&self) -> usize {
        self.states.len()
    }

    /// Evaluate the program for one sample.
    pub(crate) fn eval(&mut self, vars: &mut VarTable, rt: &mut Runtime, lib: &Library) -> f32 {
        let mut scope = Scope {
            vars,
            states: &mut self.states,
            rt,
            lib,
        };
        eval(&self.root, &mut scope)
    }
}

/// Everything a node needs while evaluating.
pub(crate) struct Scope<'a> {
    vars: &'a mut VarTable,
    states: &'a mut [NodeState],
    rt: &'a mut Runtime,
    lib: &'a Library,
}

pub(crate) fn eval(node: &Node, scope: &mut Scope<'_>) -> f32 {
    match node {
        Node::Const(v) => *v,
        Node::Var(id) => scope.vars.get(*id),
        Node::Assign(id, value) => {
            let v = eval(value, scope);
            scope.vars.set(*id, v);
            v
        }
        Node::Unary(op, operand) => op.apply(eval(operand, scope)),
        Node::Binary(BinaryOp::And, lhs, rhs) => {
            let a = eval(lhs, scope);
            if a == 0.0 {
                return 0.0;
            }
            and(a, eval(rhs, scope))
        }
        Node::Binary(BinaryOp::Or, lhs, rhs) => {
            let a = eval(lhs, scope);
            if a != 0.0 && !a.is_nan() {
                return a;
            }
            or(a, eval(rhs, scope))
        }
        Node::Binary(op, lhs, rhs) => {
            let a = eval(lhs, scope);
            let b = eval(rhs, scope);
            op.apply(a, b)
        }
        Node::Comma(head, tail) => {
            eval(head, scope);
            eval(tail, scope)
        }
        Node::Call { func, slot, args } => {
            let mut state = std::mem::take(&mut scope.states[*slot]);
            let out = func.call(
                &mut Args {
                    nodes: args,
                    scope: &mut *scope,
                },
                &mut state,
            );
            scope.states[*slot] = state;
            out
        }
    }
}

/// Lazy access to a function's arguments.
///
/// Functions decide which arguments to evaluate, how often and in what
/// order. Evaluation may have side effects on shared variables.
pub struct Args<'n, 's, 'a> {
    nodes: &'n [Node],
    scope: &'s mut Scope<'a>,
}

impl<'n, 's, 'a> Args<'n, 's, 'a> {
    /// Number of arguments written at the call site.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The unevaluated argument node at `index`.
    pub fn node(&self, index: usize) -> Option<&'n Node> {
        self.nodes.get(index)
    }

    /// Evaluate argument `index`, or return `default` when it was not given.
    pub fn get(&mut self, index: usize, default: f32) -> f32 {
        match self.nodes.get(index) {
            Some(node) => eval(node, self.scope),
            None => default,
        }
    }

    /// Evaluate an arbitrary node (typically a tuple element of an argument).
    pub fn eval(&mut self, node: &Node) -> f32 {
        eval(node, self.scope)
    }

    pub fn assign(&mut self, var: VarId, value: f32) {
        self.scope.vars.set(var, value);
    }

    pub fn sample_rate(&self) -> f32 {
        self.scope.rt.sample_rate
    }

    /// Uniform random number in `[0, 1)` from the engine's generator.
    pub fn random(&mut self) -> f32 {
        self.scope.rt.rng.gen::<f32>()
    }

    pub fn library(&self) -> &'a Library {
        self.scope.lib
    }
}
