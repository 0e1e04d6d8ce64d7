//! A tree-walking `SemanticsFactory`: the same generic enum-wrapper shape
//! `golog-engine`'s own test fixture uses (match on a cloned `kind` rather
//! than one Rust type per AST variant), kept here as a real, non-test module
//! so the demo binary is a legitimate embedder rather than a copy of the
//! library's test-only evaluator.
//!
//! Supports the statement/expression forms the shipped model programs
//! actually use. Anything else is a `Bug` — a real reasoning backend would
//! cover the rest of the grammar; this one only needs to prove the engine
//! runs.

use std::collections::BTreeMap;
use std::rc::Rc;

use golog_engine::activity::ActivityState;
use golog_engine::error::{Bug, Result};
use golog_engine::history::History;
use golog_engine::lang::expr::{ArithOp, BoolOp, CmpOp, Expr, ExprKind, QuantOp};
use golog_engine::lang::global::{Action, ExogAction, Fluent, Function};
use golog_engine::lang::program::{Stmt, StmtKind};
use golog_engine::lang::reference::Grounding;
use golog_engine::lang::scope::ScopeHandle;
use golog_engine::lang::transition::{Hook, Transition};
use golog_engine::lang::types::Type;
use golog_engine::lang::value::Value;
use golog_engine::semantics::{
    ActionEval, Binding, ExprEval, FluentEval, FunctionEval, Plan, SemanticsFactory, StmtEval, TrivialActionEval,
};

fn eval_expr(e: &Expr, binding: &Binding, history: &History) -> Result<Value> {
    e.semantics().expect("expression semantics attached").evaluate(binding, history)
}

fn eval_bool(e: &Expr, binding: &Binding, history: &History) -> Result<bool> {
    Ok(eval_expr(e, binding, history)?.as_bool()?)
}

fn attached_stmt(kind: StmtKind, scope: ScopeHandle) -> Box<Stmt> {
    let eval: Rc<dyn StmtEval> = Rc::new(TreeStmtEval {
        kind: kind.clone(),
        scope: scope.clone(),
    });
    let node = Stmt::new(kind, scope);
    node.attach_existing(eval);
    node
}

fn nil(scope: ScopeHandle) -> Box<Stmt> {
    attached_stmt(StmtKind::Nil, scope)
}

fn last_resolved_state(history: &History, key: &golog_engine::lang::reference::GroundingKey) -> Option<ActivityState> {
    history
        .events()
        .into_iter()
        .rev()
        .find_map(|te| match te.event {
            golog_engine::history::HistoryEvent::Transition(t) if &t.key() == key => Some(t.resolved_state),
            _ => None,
        })
}

struct TreeStmtEval {
    kind: StmtKind,
    scope: ScopeHandle,
}

impl StmtEval for TreeStmtEval {
    fn trans(&self, binding: &Binding, history: &History) -> Result<Vec<(Plan, Box<Stmt>, Binding)>> {
        match &self.kind {
            StmtKind::Nil | StmtKind::Return(_) => Ok(vec![]),

            StmtKind::Test(cond) => {
                if eval_bool(cond, binding, history)? {
                    Ok(vec![(Plan::empty(), nil(self.scope.clone()), binding.clone())])
                } else {
                    Ok(vec![])
                }
            }

            StmtKind::Seq(a, b) => {
                let mut out = Vec::new();
                for (plan, cont_a, next_binding) in a.semantics().expect("attached").trans(binding, history)? {
                    out.push((
                        plan,
                        attached_stmt(StmtKind::Seq(cont_a, b.clone()), self.scope.clone()),
                        next_binding,
                    ));
                }
                Ok(out)
            }

            StmtKind::ActionCall(r) => {
                let args = r
                    .args
                    .iter()
                    .map(|a| eval_expr(a, binding, history))
                    .collect::<Result<Vec<_>>>()?;
                let grounding = Grounding::durative(r.target.clone(), args.clone());
                let key = grounding.key();
                match last_resolved_state(history, &key) {
                    Some(ActivityState::Final) => Ok(vec![(Plan::empty(), nil(self.scope.clone()), binding.clone())]),
                    Some(_) => Ok(vec![]),
                    None => {
                        let precond_ok = r.target.with_precondition(|cond| -> Result<bool> {
                            match cond {
                                Some(e) => eval_bool(e, binding, history),
                                None => Ok(true),
                            }
                        })?;
                        if !precond_ok || !r.target.semantics().expect("attached").extra_precondition(&args, history)? {
                            return Ok(vec![]);
                        }
                        let transition = Transition::new(grounding, Hook::Start, ActivityState::Idle);
                        let continuation = attached_stmt(StmtKind::ActionCall(r.clone()), self.scope.clone());
                        Ok(vec![(Plan::single(transition), continuation, binding.clone())])
                    }
                }
            }

            other => Err(Bug::new(format!("toy-backend evaluator does not support {other:?}")).into()),
        }
    }

    fn is_final(&self, binding: &Binding, history: &History) -> Result<bool> {
        match &self.kind {
            StmtKind::Nil | StmtKind::Return(_) => Ok(true),
            StmtKind::Test(cond) => eval_bool(cond, binding, history),
            StmtKind::Seq(a, b) => Ok(a.semantics().expect("attached").is_final(binding, history)?
                && b.semantics().expect("attached").is_final(binding, history)?),
            StmtKind::ActionCall(r) => {
                let args = r
                    .args
                    .iter()
                    .map(|a| eval_expr(a, binding, history))
                    .collect::<Result<Vec<_>>>()?;
                let key = Grounding::durative(r.target.clone(), args).key();
                Ok(matches!(last_resolved_state(history, &key), Some(ActivityState::Final)))
            }
            other => Err(Bug::new(format!("toy-backend evaluator does not support {other:?}")).into()),
        }
    }
}

struct TreeExprEval(ExprKind);

impl ExprEval for TreeExprEval {
    fn evaluate(&self, binding: &Binding, history: &History) -> Result<Value> {
        match &self.0 {
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::IntLit(i) => Ok(Value::Int(*i)),
            ExprKind::FloatLit(f) => Ok(Value::Float(*f)),
            ExprKind::SymbolLit(s) => Ok(Value::Symbol(s.clone())),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::FluentRef(r) => {
                let args = r
                    .args
                    .iter()
                    .map(|a| eval_expr(a, binding, history))
                    .collect::<Result<Vec<_>>>()?;
                match history.evaluate_fluent(&r.target.name, &args) {
                    Some(v) => Ok(v),
                    None => r.target.semantics().expect("attached").default_value(&args),
                }
            }
            ExprKind::Not(e) => Ok(Value::Bool(!eval_bool(e, binding, history)?)),
            ExprKind::BoolOp { op, lhs, rhs } => {
                let l = eval_bool(lhs, binding, history)?;
                let r = eval_bool(rhs, binding, history)?;
                Ok(Value::Bool(match op {
                    BoolOp::And => l && r,
                    BoolOp::Or => l || r,
                }))
            }
            ExprKind::Compare { op, lhs, rhs } => {
                let l = eval_expr(lhs, binding, history)?;
                let r = eval_expr(rhs, binding, history)?;
                Ok(Value::Bool(match op {
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                    CmpOp::Lt => l.as_f64()? < r.as_f64()?,
                    CmpOp::Le => l.as_f64()? <= r.as_f64()?,
                    CmpOp::Gt => l.as_f64()? > r.as_f64()?,
                    CmpOp::Ge => l.as_f64()? >= r.as_f64()?,
                }))
            }
            other => Err(Bug::new(format!("toy-backend evaluator does not support {other:?}")).into()),
        }
    }
}

struct TreeFluentEval(Type);

impl FluentEval for TreeFluentEval {
    fn default_value(&self, _args: &[Value]) -> Result<Value> {
        Ok(match &self.0 {
            Type::Bool => Value::Bool(false),
            Type::Number => Value::Int(0),
            Type::Symbol => Value::Symbol(String::new()),
            Type::String => Value::String(String::new()),
            Type::List(_) => Value::List(vec![]),
            Type::Compound(_) => Value::Compound(BTreeMap::new()),
        })
    }
}

struct TreeFunctionEval;

impl FunctionEval for TreeFunctionEval {
    fn call(&self, _args: &[Value], _history: &History) -> Result<Value> {
        Err(Bug::new("toy-backend evaluator does not support function calls").into())
    }
}

pub struct TreeWalkFactory;

impl SemanticsFactory for TreeWalkFactory {
    fn make_stmt_semantics(&self, node: &Stmt) -> Rc<dyn StmtEval> {
        Rc::new(TreeStmtEval {
            kind: node.kind.clone(),
            scope: node.scope().clone(),
        })
    }

    fn make_expr_semantics(&self, node: &Expr) -> Rc<dyn ExprEval> {
        Rc::new(TreeExprEval(node.kind.clone()))
    }

    fn make_fluent_semantics(&self, node: &Fluent) -> Rc<dyn FluentEval> {
        Rc::new(TreeFluentEval(node.return_ty.clone()))
    }

    fn make_action_semantics(&self, _node: &Action) -> Rc<dyn ActionEval> {
        Rc::new(TrivialActionEval)
    }

    fn make_exog_action_semantics(&self, _node: &ExogAction) -> Rc<dyn ActionEval> {
        Rc::new(TrivialActionEval)
    }

    fn make_function_semantics(&self, _node: &Function) -> Rc<dyn FunctionEval> {
        Rc::new(TreeFunctionEval)
    }
}
