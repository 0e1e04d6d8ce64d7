//! A minimal deterministic tree-walking evaluator, used purely to exercise
//! the engine end to end in `tests/scenarios.rs`. Not part of the crate's
//! public API: a real embedder's reasoning backend would replace every
//! `Demo*Eval` here with whatever deliberation `trans`/`final` actually
//! require.
//!
//! Every statement and expression node clones its own `kind` plus its scope
//! at attach time and evaluates by matching on that clone, rather than
//! spawning a distinct Rust type per AST variant — continuations are built
//! by constructing a fresh node of the same kind and attaching a fresh
//! evaluator directly via `Stmt::attach_existing`, so there is never a need
//! to route back through the factory at `trans` time.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Once;

use golog_engine::activity::ActivityState;
use golog_engine::backend::ComponentBackend;
use golog_engine::error::{Bug, Result};
use golog_engine::exog::ExogSender;
use golog_engine::history::{History, HistoryEvent};
use golog_engine::lang::effect::EffectAxiom;
use golog_engine::lang::expr::{ArithOp, BoolOp, CmpOp, Expr, ExprKind, QuantOp};
use golog_engine::lang::global::{Action, ExogAction, Fluent, Function, InitialValue};
use golog_engine::lang::program::{Stmt, StmtKind};
use golog_engine::lang::reference::{Grounding, Reference};
use golog_engine::lang::scope::{Scope, ScopeHandle};
use golog_engine::lang::transition::{Hook, Transition};
use golog_engine::lang::types::Type;
use golog_engine::lang::value::Value;
use golog_engine::semantics::{
    ActionEval, Binding, ExprEval, FluentEval, FunctionEval, Plan, SemanticsFactory, StmtEval, TrivialActionEval,
};
use golog_engine::time;

/// Registers the process-wide clock exactly once for the whole test binary.
/// `time::set_clock` panics (as a `Bug`) on a second registration, and every
/// `#[test]` fn in this binary runs in the same process. Scenario tests don't
/// assert on timestamp values, so the real wall clock is as good as a fake
/// one here — and it's reachable from an integration test crate, unlike the
/// library's own `#[cfg(test)]`-only `SteppingClock`.
pub fn init_clock() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        time::set_real_clock().unwrap();
    });
}

fn eval_expr(e: &Expr, binding: &Binding, history: &History) -> Result<Value> {
    e.semantics()
        .expect("expression semantics must be attached before execution")
        .evaluate(binding, history)
}

fn eval_bool(e: &Expr, binding: &Binding, history: &History) -> Result<bool> {
    Ok(eval_expr(e, binding, history)?.as_bool()?)
}

fn attached_stmt(kind: StmtKind, scope: ScopeHandle) -> Box<Stmt> {
    let eval: Rc<dyn StmtEval> = Rc::new(DemoStmtEval {
        kind: kind.clone(),
        scope: scope.clone(),
    });
    let node = Stmt::new(kind, scope);
    node.attach_existing(eval);
    node
}

fn nil_stmt(scope: ScopeHandle) -> Box<Stmt> {
    attached_stmt(StmtKind::Nil, scope)
}

fn last_resolved_state(history: &History, key: &golog_engine::lang::reference::GroundingKey) -> Option<ActivityState> {
    history.events().into_iter().rev().find_map(|te| match te.event {
        HistoryEvent::Transition(t) if &t.key() == key => Some(t.resolved_state),
        _ => None,
    })
}

struct DemoStmtEval {
    kind: StmtKind,
    scope: ScopeHandle,
}

impl StmtEval for DemoStmtEval {
    fn trans(&self, binding: &Binding, history: &History) -> Result<Vec<(Plan, Box<Stmt>, Binding)>> {
        match &self.kind {
            StmtKind::Nil | StmtKind::Return(_) => Ok(vec![]),

            StmtKind::Test(cond) => {
                if eval_bool(cond, binding, history)? {
                    Ok(vec![(Plan::empty(), nil_stmt(self.scope.clone()), binding.clone())])
                } else {
                    Ok(vec![])
                }
            }

            StmtKind::Assign { fluent, args, value } => {
                let arg_vals = args
                    .iter()
                    .map(|a| eval_expr(a, binding, history))
                    .collect::<Result<Vec<_>>>()?;
                let v = eval_expr(value, binding, history)?;
                history.seed_fluent(&fluent.name, arg_vals, v);
                Ok(vec![(Plan::empty(), nil_stmt(self.scope.clone()), binding.clone())])
            }

            StmtKind::Seq(a, b) => {
                let mut out = Vec::new();
                let a_eval = a.semantics().expect("attached");
                for (plan, cont_a, next_binding) in a_eval.trans(binding, history)? {
                    let kind = StmtKind::Seq(cont_a, b.clone());
                    out.push((plan, attached_stmt(kind, self.scope.clone()), next_binding));
                }
                Ok(out)
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if eval_bool(cond, binding, history)? {
                    then_branch
                } else {
                    else_branch
                };
                branch.semantics().expect("attached").trans(binding, history)
            }

            StmtKind::While { cond, body } => {
                if !eval_bool(cond, binding, history)? {
                    return Ok(vec![]);
                }
                let mut out = Vec::new();
                let body_eval = body.semantics().expect("attached");
                for (plan, cont_body, next_binding) in body_eval.trans(binding, history)? {
                    let while_node = attached_stmt(
                        StmtKind::While {
                            cond: cond.clone(),
                            body: body.clone(),
                        },
                        self.scope.clone(),
                    );
                    let kind = StmtKind::Seq(cont_body, while_node);
                    out.push((plan, attached_stmt(kind, self.scope.clone()), next_binding));
                }
                Ok(out)
            }

            StmtKind::Choose(branches) => {
                let mut out = Vec::new();
                for b in branches {
                    out.extend(b.semantics().expect("attached").trans(binding, history)?);
                }
                Ok(out)
            }

            StmtKind::Pick { var, domain, body } => {
                let mut out = Vec::new();
                for v in domain {
                    let extended = binding.bind(var.name.clone(), v.clone());
                    out.extend(body.semantics().expect("attached").trans(&extended, history)?);
                }
                Ok(out)
            }

            StmtKind::Search(body) => body.semantics().expect("attached").trans(binding, history),

            StmtKind::Call(_) => Err(Bug::new("procedure calls are not supported by the test evaluator").into()),

            StmtKind::ActionCall(r) => {
                let args = r
                    .args
                    .iter()
                    .map(|a| eval_expr(a, binding, history))
                    .collect::<Result<Vec<_>>>()?;
                let grounding = Grounding::durative(r.target.clone(), args.clone());
                let key = grounding.key();
                match last_resolved_state(history, &key) {
                    Some(ActivityState::Final) => Ok(vec![(Plan::empty(), nil_stmt(self.scope.clone()), binding.clone())]),
                    Some(_) => Ok(vec![]),
                    None => {
                        let precond_ok = r.target.with_precondition(|cond| -> Result<bool> {
                            match cond {
                                Some(e) => eval_bool(e, binding, history),
                                None => Ok(true),
                            }
                        })?;
                        if !precond_ok {
                            return Ok(vec![]);
                        }
                        if !r.target.semantics().expect("attached").extra_precondition(&args, history)? {
                            return Ok(vec![]);
                        }
                        let transition = Transition::new(grounding, Hook::Start, ActivityState::Idle);
                        let continuation = attached_stmt(StmtKind::ActionCall(r.clone()), self.scope.clone());
                        Ok(vec![(Plan::single(transition), continuation, binding.clone())])
                    }
                }
            }
        }
    }

    fn is_final(&self, binding: &Binding, history: &History) -> Result<bool> {
        match &self.kind {
            StmtKind::Nil | StmtKind::Return(_) => Ok(true),
            StmtKind::Test(cond) => eval_bool(cond, binding, history),
            StmtKind::Assign { .. } => Ok(false),
            StmtKind::Seq(a, b) => {
                Ok(a.semantics().expect("attached").is_final(binding, history)?
                    && b.semantics().expect("attached").is_final(binding, history)?)
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if eval_bool(cond, binding, history)? {
                    then_branch
                } else {
                    else_branch
                };
                branch.semantics().expect("attached").is_final(binding, history)
            }
            StmtKind::While { cond, .. } => Ok(!eval_bool(cond, binding, history)?),
            StmtKind::Choose(branches) => {
                for b in branches {
                    if b.semantics().expect("attached").is_final(binding, history)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            StmtKind::Pick { var, domain, body } => {
                for v in domain {
                    let extended = binding.bind(var.name.clone(), v.clone());
                    if body.semantics().expect("attached").is_final(&extended, history)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            StmtKind::Search(body) => body.semantics().expect("attached").is_final(binding, history),
            StmtKind::Call(_) => Err(Bug::new("procedure calls are not supported by the test evaluator").into()),
            StmtKind::ActionCall(r) => {
                let args = r
                    .args
                    .iter()
                    .map(|a| eval_expr(a, binding, history))
                    .collect::<Result<Vec<_>>>()?;
                let key = Grounding::durative(r.target.clone(), args).key();
                Ok(matches!(last_resolved_state(history, &key), Some(ActivityState::Final)))
            }
        }
    }
}

struct DemoExprEval(ExprKind);

impl ExprEval for DemoExprEval {
    fn evaluate(&self, binding: &Binding, history: &History) -> Result<Value> {
        match &self.0 {
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::IntLit(i) => Ok(Value::Int(*i)),
            ExprKind::FloatLit(f) => Ok(Value::Float(*f)),
            ExprKind::SymbolLit(s) => Ok(Value::Symbol(s.clone())),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::ListLit(items) => Ok(Value::List(
                items.iter().map(|e| eval_expr(e, binding, history)).collect::<Result<_>>()?,
            )),
            ExprKind::CompoundLit(fields) => {
                let mut m = BTreeMap::new();
                for (k, e) in fields {
                    m.insert(k.clone(), eval_expr(e, binding, history)?);
                }
                Ok(Value::Compound(m))
            }
            ExprKind::VarRef(var) => binding
                .get(&var.name)
                .cloned()
                .ok_or_else(|| Bug::new(format!("unbound variable {}", var.name)).into()),
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
            ExprKind::FuncCall(r) => {
                let args = r
                    .args
                    .iter()
                    .map(|a| eval_expr(a, binding, history))
                    .collect::<Result<Vec<_>>>()?;
                r.target.semantics().expect("attached").call(&args, history)
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
                let result = match op {
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                    CmpOp::Lt => l.as_f64()? < r.as_f64()?,
                    CmpOp::Le => l.as_f64()? <= r.as_f64()?,
                    CmpOp::Gt => l.as_f64()? > r.as_f64()?,
                    CmpOp::Ge => l.as_f64()? >= r.as_f64()?,
                };
                Ok(Value::Bool(result))
            }
            ExprKind::Arith { op, lhs, rhs } => {
                let l = eval_expr(lhs, binding, history)?.as_f64()?;
                let r = eval_expr(rhs, binding, history)?.as_f64()?;
                let v = match op {
                    ArithOp::Add => l + r,
                    ArithOp::Sub => l - r,
                    ArithOp::Mul => l * r,
                    ArithOp::Div => l / r,
                };
                Ok(Value::Float(v))
            }
            ExprKind::Quantify { op, var, domain, body } => {
                let mut result = matches!(op, QuantOp::ForAll);
                for v in domain {
                    let extended = binding.bind(var.name.clone(), v.clone());
                    let b = eval_bool(body, &extended, history)?;
                    match op {
                        QuantOp::ForAll => {
                            if !b {
                                result = false;
                                break;
                            }
                        }
                        QuantOp::Exists => {
                            result = b;
                            if b {
                                break;
                            }
                        }
                    }
                }
                Ok(Value::Bool(result))
            }
            ExprKind::Stmt(_) => Err(Bug::new("statement-expressions are not supported by the test evaluator").into()),
        }
    }
}

struct DemoFluentEval(Type);

impl FluentEval for DemoFluentEval {
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

struct DemoFunctionEval;

impl FunctionEval for DemoFunctionEval {
    fn call(&self, _args: &[Value], _history: &History) -> Result<Value> {
        Err(Bug::new("function calls are not supported by the test evaluator").into())
    }
}

pub struct DemoFactory;

impl SemanticsFactory for DemoFactory {
    fn make_stmt_semantics(&self, node: &Stmt) -> Rc<dyn StmtEval> {
        Rc::new(DemoStmtEval {
            kind: node.kind.clone(),
            scope: node.scope().clone(),
        })
    }

    fn make_expr_semantics(&self, node: &Expr) -> Rc<dyn ExprEval> {
        Rc::new(DemoExprEval(node.kind.clone()))
    }

    fn make_fluent_semantics(&self, node: &Fluent) -> Rc<dyn FluentEval> {
        Rc::new(DemoFluentEval(node.return_ty.clone()))
    }

    fn make_action_semantics(&self, _node: &Action) -> Rc<dyn ActionEval> {
        Rc::new(TrivialActionEval)
    }

    fn make_exog_action_semantics(&self, _node: &ExogAction) -> Rc<dyn ActionEval> {
        Rc::new(TrivialActionEval)
    }

    fn make_function_semantics(&self, _node: &Function) -> Rc<dyn FunctionEval> {
        Rc::new(DemoFunctionEval)
    }
}

/// A component that reports every activity it's asked to start as instantly
/// `Final`, by pushing an `ActivityEnded` callback through the sender it was
/// built with. Simulates a component whose real-world action is effectively
/// instantaneous, so scenario tests don't need a background thread.
pub struct AutoFinishComponent {
    name: String,
    sender: ExogSender,
}

impl AutoFinishComponent {
    pub fn new(name: impl Into<String>, sender: ExogSender) -> Self {
        AutoFinishComponent {
            name: name.into(),
            sender,
        }
    }
}

impl ComponentBackend for AutoFinishComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, grounding: &Grounding) -> Result<()> {
        self.sender.push_activity_ended(grounding.key(), ActivityState::Final);
        Ok(())
    }

    fn cancel(&self, _grounding: &Grounding) -> Result<()> {
        Ok(())
    }
}

/// A component that never resolves an activity on its own; tests drive its
/// lifecycle directly through `PlatformBackend`/`ExogSender` instead.
pub struct ManualComponent {
    name: String,
}

impl ManualComponent {
    pub fn new(name: impl Into<String>) -> Self {
        ManualComponent { name: name.into() }
    }
}

impl ComponentBackend for ManualComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, _grounding: &Grounding) -> Result<()> {
        Ok(())
    }

    fn cancel(&self, _grounding: &Grounding) -> Result<()> {
        Ok(())
    }
}

/// A component that reports a running activity as `Cancelled` as soon as
/// `cancel` is requested, simulating a backend that can tear the real-world
/// activity down immediately.
pub struct CancelRespondingComponent {
    name: String,
    sender: ExogSender,
}

impl CancelRespondingComponent {
    pub fn new(name: impl Into<String>, sender: ExogSender) -> Self {
        CancelRespondingComponent {
            name: name.into(),
            sender,
        }
    }
}

impl ComponentBackend for CancelRespondingComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, _grounding: &Grounding) -> Result<()> {
        Ok(())
    }

    fn cancel(&self, grounding: &Grounding) -> Result<()> {
        self.sender.push_activity_ended(grounding.key(), ActivityState::Cancelled);
        Ok(())
    }
}

/// A tiny door model shared by several scenarios: a `door_open` fluent, an
/// `open_door` action (no params) that sets it, and an `unlocked` fluent
/// guarding the action's precondition, flipped by a `press_button` exog
/// action.
pub struct DoorModel {
    pub root: ScopeHandle,
    pub door_open: Rc<Fluent>,
    pub unlocked: Rc<Fluent>,
    pub open_door: Rc<Action>,
    pub press_button: Rc<ExogAction>,
}

fn bool_lit(root: &ScopeHandle, b: bool) -> Box<Expr> {
    Expr::new(ExprKind::BoolLit(b), root.clone(), Some(Type::Bool))
}

fn fluent_ref(root: &ScopeHandle, fluent: &Rc<Fluent>) -> Box<Expr> {
    Expr::new(
        ExprKind::FluentRef(Reference {
            target: fluent.clone(),
            args: vec![],
        }),
        root.clone(),
        Some(fluent.return_ty.clone()),
    )
}

impl DoorModel {
    pub fn build() -> Self {
        let root = Scope::new_root();

        let door_open = Fluent::new("door_open", vec![], Type::Bool, &root);
        door_open.define(vec![InitialValue {
            args: vec![],
            value: Value::Bool(false),
        }]).unwrap();
        Scope::declare_global(&root, golog_engine::lang::scope::GlobalRef::Fluent(door_open.clone())).unwrap();

        let unlocked = Fluent::new("unlocked", vec![], Type::Bool, &root);
        unlocked.define(vec![InitialValue {
            args: vec![],
            value: Value::Bool(false),
        }]).unwrap();
        Scope::declare_global(&root, golog_engine::lang::scope::GlobalRef::Fluent(unlocked.clone())).unwrap();

        let open_door = Action::new("open_door", vec![], &root);
        open_door.set_precondition(fluent_ref(&root, &unlocked));
        open_door.add_effect(EffectAxiom {
            condition: bool_lit(&root, true),
            fluent: door_open.clone(),
            fluent_args: vec![],
            value: bool_lit(&root, true),
        });
        Scope::declare_global(&root, golog_engine::lang::scope::GlobalRef::Action(open_door.clone())).unwrap();

        let press_button = ExogAction::new("press_button", vec![], &root);
        press_button.add_effect(EffectAxiom {
            condition: bool_lit(&root, true),
            fluent: unlocked.clone(),
            fluent_args: vec![],
            value: bool_lit(&root, true),
        });
        Scope::declare_global(&root, golog_engine::lang::scope::GlobalRef::ExogAction(press_button.clone())).unwrap();

        // Globals are attached independently of any call site that
        // references them (`Stmt::attach_semantics` only walks a call's own
        // argument expressions, not the referenced global's body).
        door_open.attach_semantics(&DemoFactory);
        unlocked.attach_semantics(&DemoFactory);
        open_door.attach_semantics(&DemoFactory);
        press_button.attach_semantics(&DemoFactory);

        DoorModel {
            root,
            door_open,
            unlocked,
            open_door,
            press_button,
        }
    }

    /// `open_door()` as a standalone program.
    pub fn open_door_program(&self) -> Box<Stmt> {
        Stmt::new(
            StmtKind::ActionCall(Reference {
                target: self.open_door.clone(),
                args: vec![],
            }),
            self.root.clone(),
        )
    }

    pub fn seed_history(&self, history: &History) {
        for iv in self.door_open.initial_values() {
            history.seed_fluent(&self.door_open.name, iv.args, iv.value);
        }
        for iv in self.unlocked.initial_values() {
            history.seed_fluent(&self.unlocked.name, iv.args, iv.value);
        }
    }
}
