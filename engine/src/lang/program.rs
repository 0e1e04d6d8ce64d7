//! Procedural and non-deterministic statement constructs: sequence,
//! conditional, loop, assignment, procedure call/return, and the
//! non-deterministic `choose`/`pick`/`search`/`test` family.

use std::rc::Rc;

use crate::lang::element::NodeCore;
use crate::lang::expr::Expr;
use crate::lang::global::{Action, Fluent, Function};
use crate::lang::reference::Reference;
use crate::lang::scope::{ScopeHandle, Variable};
use crate::semantics::{SemanticsFactory, StmtEval};

#[derive(Debug, Clone)]
pub enum StmtKind {
    Seq(Box<Stmt>, Box<Stmt>),
    If {
        cond: Box<Expr>,
        then_branch: Box<Stmt>,
        else_branch: Box<Stmt>,
    },
    While {
        cond: Box<Expr>,
        body: Box<Stmt>,
    },
    Assign {
        fluent: Rc<Fluent>,
        args: Vec<Box<Expr>>,
        value: Box<Expr>,
    },
    Call(Reference<Function>),
    ActionCall(Reference<Action>),
    /// Non-deterministic choice among a fixed set of sub-programs.
    Choose(Vec<Box<Stmt>>),
    /// Non-deterministic choice of a value for `var`, ranging over `domain`,
    /// before running `body`.
    Pick {
        var: Rc<Variable>,
        domain: Vec<crate::lang::value::Value>,
        body: Box<Stmt>,
    },
    /// Offline, backtracking search over the remainder: only transitions
    /// that lead to a legally-final continuation are offered.
    Search(Box<Stmt>),
    /// Blocks unless `cond` holds; never itself produces a transition.
    Test(Box<Expr>),
    Return(Option<Box<Expr>>),
    /// The empty program: trivially final, never transitions.
    Nil,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    core: NodeCore<Rc<dyn StmtEval>>,
}

impl Stmt {
    pub fn new(kind: StmtKind, parent_scope: ScopeHandle) -> Box<Self> {
        Box::new(Stmt {
            kind,
            core: NodeCore::leaf(parent_scope, None),
        })
    }

    pub fn scope(&self) -> &ScopeHandle {
        self.core.scope()
    }

    pub fn attach_semantics(&self, factory: &dyn SemanticsFactory) {
        if self.core.is_attached() {
            return;
        }
        match &self.kind {
            StmtKind::Seq(a, b) => {
                a.attach_semantics(factory);
                b.attach_semantics(factory);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.attach_semantics(factory);
                then_branch.attach_semantics(factory);
                else_branch.attach_semantics(factory);
            }
            StmtKind::While { cond, body } => {
                cond.attach_semantics(factory);
                body.attach_semantics(factory);
            }
            StmtKind::Assign { args, value, .. } => {
                args.iter().for_each(|a| a.attach_semantics(factory));
                value.attach_semantics(factory);
            }
            StmtKind::Call(r) => r.args.iter().for_each(|a| a.attach_semantics(factory)),
            StmtKind::ActionCall(r) => r.args.iter().for_each(|a| a.attach_semantics(factory)),
            StmtKind::Choose(branches) => branches.iter().for_each(|b| b.attach_semantics(factory)),
            StmtKind::Pick { body, .. } => body.attach_semantics(factory),
            StmtKind::Search(body) => body.attach_semantics(factory),
            StmtKind::Test(cond) => cond.attach_semantics(factory),
            StmtKind::Return(Some(e)) => e.attach_semantics(factory),
            StmtKind::Return(None) | StmtKind::Nil => {}
        }
        let eval = factory.make_stmt_semantics(self);
        self.core.attach(eval);
    }

    pub fn semantics(&self) -> Option<Rc<dyn StmtEval>> {
        self.core.semantics().cloned()
    }

    /// Attaches an evaluator the caller already built, bypassing
    /// `SemanticsFactory::make_stmt_semantics`. An evaluator that synthesizes
    /// a continuation node at `trans` time (rather than walking a static
    /// tree) already knows the right evaluator for it and has no factory
    /// handle to dispatch back through.
    pub fn attach_existing(&self, eval: Rc<dyn StmtEval>) -> bool {
        self.core.attach(eval)
    }
}
