//! Expression nodes. Per `spec.md`'s data model, a `Statement` is itself a
//! kind of expression (mirroring the original's `Statement : Expression`
//! relationship) — `ExprKind::Stmt` is how that shows up here, letting a
//! procedure body double as a value-producing expression via `return`.

use std::rc::Rc;

use crate::lang::element::NodeCore;
use crate::lang::global::{Function, Fluent};
use crate::lang::program::Stmt;
use crate::lang::reference::Reference;
use crate::lang::scope::{ScopeHandle, Variable};
use crate::lang::types::Type;
use crate::lang::value::Value;
use crate::semantics::{ExprEval, SemanticsFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantOp {
    ForAll,
    Exists,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    BoolLit(bool),
    IntLit(i64),
    FloatLit(f64),
    SymbolLit(String),
    StringLit(String),
    ListLit(Vec<Box<Expr>>),
    CompoundLit(Vec<(String, Box<Expr>)>),
    VarRef(Rc<Variable>),
    FluentRef(Reference<Fluent>),
    FuncCall(Reference<Function>),
    Not(Box<Expr>),
    BoolOp {
        op: BoolOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Quantify {
        op: QuantOp,
        var: Rc<Variable>,
        domain: Vec<Value>,
        body: Box<Expr>,
    },
    /// A statement used where an expression is expected — evaluating it
    /// runs the statement to exhaustion and yields whatever it `return`s.
    Stmt(Box<Stmt>),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    core: NodeCore<Rc<dyn ExprEval>>,
}

impl Expr {
    pub fn new(kind: ExprKind, parent_scope: ScopeHandle, ty: Option<Type>) -> Box<Self> {
        Box::new(Expr {
            kind,
            core: NodeCore::leaf(parent_scope, ty),
        })
    }

    pub fn scope(&self) -> &ScopeHandle {
        self.core.scope()
    }

    pub fn ty(&self) -> Option<&Type> {
        self.core.ty()
    }

    /// Walks this node's children first, then attaches this node's own
    /// evaluator. Idempotent — re-running on an already-attached tree is a
    /// no-op at every node.
    pub fn attach_semantics(&self, factory: &dyn SemanticsFactory) {
        if self.core.is_attached() {
            return;
        }
        match &self.kind {
            ExprKind::ListLit(items) => items.iter().for_each(|e| e.attach_semantics(factory)),
            ExprKind::CompoundLit(fields) => fields.iter().for_each(|(_, e)| e.attach_semantics(factory)),
            ExprKind::FluentRef(r) => r.args.iter().for_each(|a| a.attach_semantics(factory)),
            ExprKind::FuncCall(r) => r.args.iter().for_each(|a| a.attach_semantics(factory)),
            ExprKind::Not(e) => e.attach_semantics(factory),
            ExprKind::BoolOp { lhs, rhs, .. }
            | ExprKind::Compare { lhs, rhs, .. }
            | ExprKind::Arith { lhs, rhs, .. } => {
                lhs.attach_semantics(factory);
                rhs.attach_semantics(factory);
            }
            ExprKind::Quantify { body, .. } => body.attach_semantics(factory),
            ExprKind::Stmt(s) => s.attach_semantics(factory),
            ExprKind::BoolLit(_)
            | ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::SymbolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::VarRef(_) => {}
        }
        let eval = factory.make_expr_semantics(self);
        self.core.attach(eval);
    }

    pub fn semantics(&self) -> Option<Rc<dyn ExprEval>> {
        self.core.semantics().cloned()
    }
}
