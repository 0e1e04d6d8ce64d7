//! The pluggable evaluator factory.
//!
//! AST nodes are inert data until `attach_semantics` walks the tree and
//! installs, per node, a small trait object produced by a `SemanticsFactory`
//! implementation supplied by the embedder. This is the idiomatic-Rust
//! analogue of the original's `Semantics<GologT>` template specialization:
//! instead of one monolithic interpreter reached via `dynamic_cast`, each AST
//! category gets its own evaluator trait, and a single factory method
//! produces the right one for a given node.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::history::History;
use crate::lang::expr::Expr;
use crate::lang::global::{Action, ExogAction, Fluent, Function};
use crate::lang::program::Stmt;
use crate::lang::transition::Transition;
use crate::lang::value::Value;

/// A binding of free variable names to grounded values, threaded through
/// `trans`/`is_final`/`evaluate` calls. Cheap to clone: pick/search push a
/// new binding layer rather than mutating the caller's.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    values: HashMap<String, Value>,
}

impl Binding {
    pub fn empty() -> Self {
        Binding::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn bind(&self, name: impl Into<String>, value: Value) -> Self {
        let mut next = self.clone();
        next.values.insert(name.into(), value);
        next
    }
}

/// One step of a dispatchable plan: a primitive transition ready to be
/// handed to `PlatformBackend`.
#[derive(Debug, Clone)]
pub struct PlanElement {
    pub transition: Transition,
}

/// The result of `trans`: a sequence of primitive transitions plus the
/// statement remaining after they are all dispatched.
#[derive(Debug, Clone)]
pub struct Plan {
    pub elements: Vec<PlanElement>,
}

impl Plan {
    pub fn empty() -> Self {
        Plan { elements: Vec::new() }
    }

    pub fn single(transition: Transition) -> Self {
        Plan {
            elements: vec![PlanElement { transition }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Evaluator for a statement node: `trans` (can it make progress, and if so
/// what primitive transition(s) result) and `is_final` (can the remaining
/// program legally stop here).
pub trait StmtEval {
    /// Every alternative this node currently offers: a dispatchable `Plan`,
    /// the statement remaining after it, and the binding that remainder
    /// should be evaluated under (unchanged from the caller's except after
    /// a `pick`, which extends it with the chosen value).
    fn trans(&self, binding: &Binding, history: &History) -> Result<Vec<(Plan, Box<Stmt>, Binding)>>;
    fn is_final(&self, binding: &Binding, history: &History) -> Result<bool>;
}

/// Evaluator for an expression node.
pub trait ExprEval {
    fn evaluate(&self, binding: &Binding, history: &History) -> Result<Value>;
}

/// Evaluator for a fluent: supplies values for groundings the history has no
/// recorded effect for yet (the fluent's declared initial-value axioms).
pub trait FluentEval {
    fn default_value(&self, args: &[Value]) -> Result<Value>;
}

/// Evaluator for a (possibly exogenous) action: precondition and/or
/// grounding-domain checks the backend wants to enforce beyond the AST's own
/// precondition expression. Most backends use the default no-op.
pub trait ActionEval {
    fn extra_precondition(&self, _args: &[Value], _history: &History) -> Result<bool> {
        Ok(true)
    }
}

/// Evaluator for a procedure/function body.
pub trait FunctionEval {
    fn call(&self, args: &[Value], history: &History) -> Result<Value>;
}

/// Evaluator attached to the history itself. No `StmtEval`/`ExprEval` in
/// this engine ever reads it back; it exists so `History::attach_semantics`
/// has something to attach, mirroring `examples/original_source/src/model/execution.cpp`'s
/// `history().attach_semantics(semantics_factory())` as the first step of
/// `run()`.
pub trait HistoryEval {}

pub struct TrivialHistoryEval;
impl HistoryEval for TrivialHistoryEval {}

/// Produces evaluators for every AST category. Implemented once per backend
/// (the demo binary's tree-walker, a test fixture, ...); `attach_semantics`
/// walks the tree calling the matching `make_*` method on each node exactly
/// once.
pub trait SemanticsFactory {
    fn make_stmt_semantics(&self, node: &Stmt) -> Rc<dyn StmtEval>;
    fn make_expr_semantics(&self, node: &Expr) -> Rc<dyn ExprEval>;
    fn make_fluent_semantics(&self, node: &Fluent) -> Rc<dyn FluentEval>;
    fn make_action_semantics(&self, node: &Action) -> Rc<dyn ActionEval>;
    fn make_exog_action_semantics(&self, node: &ExogAction) -> Rc<dyn ActionEval>;
    fn make_function_semantics(&self, node: &Function) -> Rc<dyn FunctionEval>;

    fn make_history_semantics(&self, _node: &History) -> Rc<dyn HistoryEval> {
        Rc::new(TrivialHistoryEval)
    }

    /// Runs once, before any global is attached or compiled. Mirrors
    /// `examples/original_source/src/model/execution.cpp`'s
    /// `ctx.precompile()` call at the top of `Scope::implement_globals`.
    /// Default no-op.
    fn precompile(&self) -> Result<()> {
        Ok(())
    }

    /// Runs once per global, after every global in scope has already been
    /// attached — mirrors the second of the two loops in
    /// `examples/original_source/src/model/scope.cpp`'s
    /// `Scope::implement_globals` (`entry.second->compile(ctx)`). Default
    /// no-op: most backends have nothing left to do once semantics are
    /// attached.
    fn compile_global(&self, _global: &crate::lang::scope::GlobalRef) -> Result<()> {
        Ok(())
    }

    /// Runs once, after every global has been compiled. Default no-op.
    fn postcompile(&self) -> Result<()> {
        Ok(())
    }
}

/// A no-op `ActionEval`, handed out by factories that have nothing extra to
/// check beyond the AST's own precondition expression.
pub struct TrivialActionEval;
impl ActionEval for TrivialActionEval {}

pub(crate) fn grounding_binding(args_names: &[String], args: &[Value]) -> Binding {
    let mut b = Binding::empty();
    for (name, value) in args_names.iter().zip(args.iter()) {
        b = b.bind(name.clone(), value.clone());
    }
    b
}
