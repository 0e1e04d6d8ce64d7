//! The four kinds of global: `Fluent`, `Action` (durative, controllable),
//! `ExogAction` (observation-only), and `Function` (a named procedure body).
//! Each is declared once into a `Scope`'s registry and referenced
//! afterwards only by `(name, arity)` lookup or by cloning the `Rc` handed
//! back from that lookup — never by a second owning edge.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{GologError, UserError};
use crate::lang::effect::EffectAxiom;
use crate::lang::element::NodeCore;
use crate::lang::expr::Expr;
use crate::lang::program::Stmt;
use crate::lang::scope::ScopeHandle;
use crate::lang::types::Type;
use crate::lang::value::Value;
use crate::semantics::{ActionEval, FluentEval, FunctionEval};

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct InitialValue {
    pub args: Vec<Value>,
    pub value: Value,
}

#[derive(Debug)]
pub struct Fluent {
    pub name: String,
    pub params: Vec<Param>,
    pub return_ty: Type,
    pub own_scope: ScopeHandle,
    initial_values: RefCell<Vec<InitialValue>>,
    /// The finite Cartesian product of constant argument tuples this fluent
    /// is defined over — one entry per `InitialValue`, populated as a
    /// byproduct of `define()` rather than declared separately (mirrors
    /// `examples/original_source/src/model/fluent.h`'s `domain_`, built
    /// inside `Fluent::define` from each initial value's own arguments).
    domain: RefCell<Vec<Vec<Value>>>,
    core: NodeCore<Rc<dyn FluentEval>>,
}

impl Fluent {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_ty: Type, parent_scope: &ScopeHandle) -> Rc<Self> {
        let own_scope = crate::lang::scope::Scope::new_child(parent_scope);
        Rc::new(Fluent {
            name: name.into(),
            params,
            return_ty: return_ty.clone(),
            own_scope,
            initial_values: RefCell::new(Vec::new()),
            domain: RefCell::new(Vec::new()),
            core: NodeCore::leaf(parent_scope.clone(), Some(return_ty)),
        })
    }

    /// Declares the initial-value axioms for this fluent's domain. Errors if
    /// any grounded argument's type doesn't match the declared signature.
    pub fn define(&self, values: Vec<InitialValue>) -> Result<(), GologError> {
        for iv in &values {
            if iv.args.len() != self.params.len() {
                return Err(UserError::TypeError(format!(
                    "{}: expected {} arguments, got {}",
                    self.name,
                    self.params.len(),
                    iv.args.len()
                ))
                .into());
            }
            for (param, arg) in self.params.iter().zip(iv.args.iter()) {
                if !arg.type_of().is_subtype_of(&param.ty) {
                    return Err(UserError::TypeError(format!(
                        "{}: argument {} expected {}, got {}",
                        self.name, param.name, param.ty, arg.type_of()
                    ))
                    .into());
                }
            }
            if !iv.value.type_of().is_subtype_of(&self.return_ty) {
                return Err(UserError::ExpressionTypeMismatch(format!(
                    "{}: initial value {} is not a {}",
                    self.name, iv.value, self.return_ty
                ))
                .into());
            }
        }
        *self.domain.borrow_mut() = values.iter().map(|iv| iv.args.clone()).collect();
        *self.initial_values.borrow_mut() = values;
        Ok(())
    }

    pub fn initial_values(&self) -> Vec<InitialValue> {
        self.initial_values.borrow().clone()
    }

    /// The argument tuples this fluent has a declared initial value for.
    pub fn domain(&self) -> Vec<Vec<Value>> {
        self.domain.borrow().clone()
    }

    pub fn attach_semantics(self: &Rc<Self>, factory: &dyn crate::semantics::SemanticsFactory) {
        if !self.core.is_attached() {
            let eval = factory.make_fluent_semantics(self);
            self.core.attach(eval);
        }
    }

    pub fn semantics(&self) -> Option<Rc<dyn FluentEval>> {
        self.core.semantics().cloned()
    }
}

/// How a durative action's occurrences are reported to the out-of-scope
/// concrete platform backend: the command name and the (ordered) parameter
/// names whose bound values become that command's arguments. Data only —
/// nothing here consults a dispatch table; that belongs to the component
/// backend. Mirrors the `ActionMapping` built inside the `AbstractAction`
/// constructor in `examples/original_source/src/model/action.cpp`.
#[derive(Debug, Clone)]
pub struct ActionMapping {
    pub command_name: String,
    pub command_args: Vec<String>,
}

#[derive(Debug)]
pub struct Action {
    pub name: String,
    pub params: Vec<Param>,
    pub own_scope: ScopeHandle,
    precondition: RefCell<Option<Box<Expr>>>,
    effects: RefCell<Vec<EffectAxiom>>,
    /// The fluent this action senses, if any (`examples/original_source/src/model/action.cpp`'s
    /// `senses_`). `ExogAction` has no counterpart — exogenous occurrences
    /// are never sensing actions.
    senses: RefCell<Option<Rc<Fluent>>>,
    mapping: RefCell<ActionMapping>,
    /// Whether occurrences of this action are announced at diagnostic-info
    /// level (`examples/original_source/src/model/execution.cpp`'s
    /// `(*exog)->silent()`).
    silent: Cell<bool>,
    core: NodeCore<Rc<dyn ActionEval>>,
}

impl Action {
    pub fn new(name: impl Into<String>, params: Vec<Param>, parent_scope: &ScopeHandle) -> Rc<Self> {
        let own_scope = crate::lang::scope::Scope::new_child(parent_scope);
        let name = name.into();
        let mapping = ActionMapping {
            command_name: name.clone(),
            command_args: params.iter().map(|p| p.name.clone()).collect(),
        };
        Rc::new(Action {
            name,
            params,
            own_scope,
            precondition: RefCell::new(None),
            effects: RefCell::new(Vec::new()),
            senses: RefCell::new(None),
            mapping: RefCell::new(mapping),
            silent: Cell::new(false),
            core: NodeCore::leaf(parent_scope.clone(), None),
        })
    }

    pub fn set_precondition(&self, cond: Box<Expr>) {
        *self.precondition.borrow_mut() = Some(cond);
    }

    pub fn with_precondition<R>(&self, f: impl FnOnce(Option<&Expr>) -> R) -> R {
        f(self.precondition.borrow().as_deref())
    }

    pub fn add_effect(&self, axiom: EffectAxiom) {
        self.effects.borrow_mut().push(axiom);
    }

    pub fn with_effects<R>(&self, f: impl FnOnce(&[EffectAxiom]) -> R) -> R {
        f(&self.effects.borrow())
    }

    pub fn set_senses(&self, fluent: Rc<Fluent>) {
        *self.senses.borrow_mut() = Some(fluent);
    }

    pub fn senses(&self) -> Option<Rc<Fluent>> {
        self.senses.borrow().clone()
    }

    pub fn mapping(&self) -> ActionMapping {
        self.mapping.borrow().clone()
    }

    pub fn set_mapping(&self, mapping: ActionMapping) {
        *self.mapping.borrow_mut() = mapping;
    }

    pub fn silent(&self) -> bool {
        self.silent.get()
    }

    pub fn set_silent(&self, silent: bool) {
        self.silent.set(silent);
    }

    pub fn attach_semantics(self: &Rc<Self>, factory: &dyn crate::semantics::SemanticsFactory) {
        if self.core.is_attached() {
            return;
        }
        if let Some(cond) = self.precondition.borrow().as_ref() {
            cond.attach_semantics(factory);
        }
        for axiom in self.effects.borrow().iter() {
            axiom.condition.attach_semantics(factory);
            axiom.value.attach_semantics(factory);
            for a in &axiom.fluent_args {
                a.attach_semantics(factory);
            }
        }
        if let Some(fluent) = self.senses.borrow().as_ref() {
            fluent.attach_semantics(factory);
        }
        let eval = factory.make_action_semantics(self);
        self.core.attach(eval);
    }

    pub fn semantics(&self) -> Option<Rc<dyn ActionEval>> {
        self.core.semantics().cloned()
    }
}

#[derive(Debug)]
pub struct ExogAction {
    pub name: String,
    pub params: Vec<Param>,
    pub own_scope: ScopeHandle,
    effects: RefCell<Vec<EffectAxiom>>,
    silent: Cell<bool>,
    core: NodeCore<Rc<dyn ActionEval>>,
}

impl ExogAction {
    pub fn new(name: impl Into<String>, params: Vec<Param>, parent_scope: &ScopeHandle) -> Rc<Self> {
        let own_scope = crate::lang::scope::Scope::new_child(parent_scope);
        Rc::new(ExogAction {
            name: name.into(),
            params,
            own_scope,
            effects: RefCell::new(Vec::new()),
            silent: Cell::new(false),
            core: NodeCore::leaf(parent_scope.clone(), None),
        })
    }

    pub fn add_effect(&self, axiom: EffectAxiom) {
        self.effects.borrow_mut().push(axiom);
    }

    pub fn with_effects<R>(&self, f: impl FnOnce(&[EffectAxiom]) -> R) -> R {
        f(&self.effects.borrow())
    }

    pub fn silent(&self) -> bool {
        self.silent.get()
    }

    pub fn set_silent(&self, silent: bool) {
        self.silent.set(silent);
    }

    pub fn attach_semantics(self: &Rc<Self>, factory: &dyn crate::semantics::SemanticsFactory) {
        if self.core.is_attached() {
            return;
        }
        for axiom in self.effects.borrow().iter() {
            axiom.condition.attach_semantics(factory);
            axiom.value.attach_semantics(factory);
            for a in &axiom.fluent_args {
                a.attach_semantics(factory);
            }
        }
        let eval = factory.make_exog_action_semantics(self);
        self.core.attach(eval);
    }

    pub fn semantics(&self) -> Option<Rc<dyn ActionEval>> {
        self.core.semantics().cloned()
    }
}

#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_ty: Type,
    pub own_scope: ScopeHandle,
    body: RefCell<Option<Box<Stmt>>>,
    core: NodeCore<Rc<dyn FunctionEval>>,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_ty: Type, parent_scope: &ScopeHandle) -> Rc<Self> {
        let own_scope = crate::lang::scope::Scope::new_child(parent_scope);
        Rc::new(Function {
            name: name.into(),
            params,
            return_ty: return_ty.clone(),
            own_scope,
            body: RefCell::new(None),
            core: NodeCore::leaf(parent_scope.clone(), Some(return_ty)),
        })
    }

    pub fn set_body(&self, body: Box<Stmt>) {
        *self.body.borrow_mut() = Some(body);
    }

    pub fn with_body<R>(&self, f: impl FnOnce(Option<&Stmt>) -> R) -> R {
        f(self.body.borrow().as_deref())
    }

    pub fn attach_semantics(self: &Rc<Self>, factory: &dyn crate::semantics::SemanticsFactory) {
        if self.core.is_attached() {
            return;
        }
        if let Some(body) = self.body.borrow().as_ref() {
            body.attach_semantics(factory);
        }
        let eval = factory.make_function_semantics(self);
        self.core.attach(eval);
    }

    pub fn semantics(&self) -> Option<Rc<dyn FunctionEval>> {
        self.core.semantics().cloned()
    }
}
