//! Scope/name-resolution tree, grounded in `examples/original_source/model/scope.cpp`:
//! the global scope is its own parent, variables are looked up by walking
//! toward it, and globals (actions, fluents, functions) live in one
//! `(name, arity)`-keyed registry shared by every scope in the tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::error::{GologError, UserError};
use crate::lang::global::{Action, ExogAction, Fluent, Function};
use crate::lang::types::Type;
use crate::lang::value::Value;

pub type ScopeHandle = Rc<RefCell<Scope>>;

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
}

/// A global, keyed by `(name, arity)` in the registry. One concrete kind per
/// variant rather than a trait object — callers that need "the fluent named
/// X" get a typed accessor instead of a downcast.
#[derive(Debug, Clone)]
pub enum GlobalRef {
    Action(Rc<Action>),
    ExogAction(Rc<ExogAction>),
    Fluent(Rc<Fluent>),
    Function(Rc<Function>),
}

impl GlobalRef {
    pub fn name(&self) -> &str {
        match self {
            GlobalRef::Action(a) => &a.name,
            GlobalRef::ExogAction(a) => &a.name,
            GlobalRef::Fluent(f) => &f.name,
            GlobalRef::Function(f) => &f.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            GlobalRef::Action(a) => a.params.len(),
            GlobalRef::ExogAction(a) => a.params.len(),
            GlobalRef::Fluent(f) => f.params.len(),
            GlobalRef::Function(f) => f.params.len(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            GlobalRef::Action(_) => "action",
            GlobalRef::ExogAction(_) => "exog_action",
            GlobalRef::Fluent(_) => "fluent",
            GlobalRef::Function(_) => "function",
        }
    }

    pub fn as_fluent(&self) -> Option<Rc<Fluent>> {
        match self {
            GlobalRef::Fluent(f) => Some(f.clone()),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<Rc<Action>> {
        match self {
            GlobalRef::Action(a) => Some(a.clone()),
            _ => None,
        }
    }

    pub fn as_exog_action(&self) -> Option<Rc<ExogAction>> {
        match self {
            GlobalRef::ExogAction(a) => Some(a.clone()),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<Rc<Function>> {
        match self {
            GlobalRef::Function(f) => Some(f.clone()),
            _ => None,
        }
    }

    /// The type a redeclaration of this global is checked against, for the
    /// kinds that carry one. `Action`/`ExogAction` have no declared return
    /// type to widen or narrow, so redeclaring one is still an unconditional
    /// same-kind overwrite.
    pub fn declared_type(&self) -> Option<Type> {
        match self {
            GlobalRef::Fluent(f) => Some(f.return_ty.clone()),
            GlobalRef::Function(f) => Some(f.return_ty.clone()),
            GlobalRef::Action(_) | GlobalRef::ExogAction(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct GlobalRegistry {
    globals: HashMap<(String, usize), GlobalRef>,
    types: HashMap<String, Type>,
    domains: HashMap<String, Vec<Value>>,
}

impl GlobalRegistry {
    /// Declares a global. Redeclaration under the same `(name, arity)` and
    /// kind is accepted only when the declared type, if any, doesn't
    /// narrow: the new type must be the old one or a supertype of it
    /// (`Type::is_subtype_of` in the old-is-subtype-of-new direction).
    /// Kinds with no declared type (`Action`/`ExogAction`) keep the simpler
    /// unconditional same-kind overwrite. Anything else is a
    /// `RedefinitionError`.
    pub fn declare(&mut self, global: GlobalRef) -> Result<(), GologError> {
        let key = (global.name().to_string(), global.arity());
        match self.globals.get(&key) {
            None => {
                self.globals.insert(key, global);
                Ok(())
            }
            Some(existing) if existing.kind_name() != global.kind_name() => Err(UserError::RedefinitionError(format!(
                "{} (was {}, now {})",
                key.0,
                existing.kind_name(),
                global.kind_name()
            ))
            .into()),
            Some(existing) => match (existing.declared_type(), global.declared_type()) {
                (Some(old_ty), Some(new_ty)) if old_ty.is_subtype_of(&new_ty) => {
                    self.globals.insert(key, global);
                    Ok(())
                }
                (Some(old_ty), Some(new_ty)) => Err(UserError::TypeError(format!(
                    "{}: redeclaration would narrow {} to {}",
                    key.0, old_ty, new_ty
                ))
                .into()),
                _ => {
                    self.globals.insert(key, global);
                    Ok(())
                }
            },
        }
    }

    pub fn lookup(&self, name: &str, arity: usize) -> Option<GlobalRef> {
        self.globals.get(&(name.to_string(), arity)).cloned()
    }

    pub fn all_globals(&self) -> Vec<GlobalRef> {
        self.globals.values().cloned().collect()
    }

    /// Registers a named sort/type. Always a `RedefinitionError` on a
    /// duplicate name — no widening allowance, unlike `declare`.
    pub fn register_type(&mut self, name: &str, ty: Type) -> Result<(), GologError> {
        if self.types.contains_key(name) {
            return Err(UserError::RedefinitionError(name.to_string()).into());
        }
        self.types.insert(name.to_string(), ty);
        Ok(())
    }

    /// Registers a named enumerated domain of constants. Always a
    /// `RedefinitionError` on a duplicate name.
    pub fn register_domain(&mut self, name: &str, values: Vec<Value>) -> Result<(), GologError> {
        if self.domains.contains_key(name) {
            return Err(UserError::RedefinitionError(name.to_string()).into());
        }
        self.domains.insert(name.to_string(), values);
        Ok(())
    }
}

#[derive(Debug)]
pub struct Scope {
    parent: Weak<RefCell<Scope>>,
    registry: Rc<RefCell<GlobalRegistry>>,
    variables: HashMap<String, Rc<Variable>>,
}

impl Scope {
    /// Creates the global scope: its own parent, a fresh shared registry.
    pub fn new_root() -> ScopeHandle {
        Rc::new_cyclic(|weak| {
            RefCell::new(Scope {
                parent: weak.clone(),
                registry: Rc::new(RefCell::new(GlobalRegistry::default())),
                variables: HashMap::new(),
            })
        })
    }

    /// Creates a child scope sharing the root's global registry.
    pub fn new_child(parent: &ScopeHandle) -> ScopeHandle {
        let registry = parent.borrow().registry.clone();
        Rc::new_cyclic(|weak| {
            let _ = weak;
            RefCell::new(Scope {
                parent: Rc::downgrade(parent),
                registry,
                variables: HashMap::new(),
            })
        })
    }

    pub fn is_global(scope: &ScopeHandle) -> bool {
        let s = scope.borrow();
        match s.parent.upgrade() {
            Some(p) => Rc::ptr_eq(&p, scope),
            None => false,
        }
    }

    pub fn declare_var(scope: &ScopeHandle, name: impl Into<String>, ty: Type) -> Rc<Variable> {
        let var = Rc::new(Variable {
            name: name.into(),
            ty,
        });
        scope.borrow_mut().variables.insert(var.name.clone(), var.clone());
        var
    }

    pub fn lookup_var(scope: &ScopeHandle, name: &str) -> Option<Rc<Variable>> {
        if let Some(v) = scope.borrow().variables.get(name) {
            return Some(v.clone());
        }
        if Self::is_global(scope) {
            return None;
        }
        let parent = scope.borrow().parent.upgrade()?;
        Self::lookup_var(&parent, name)
    }

    pub fn declare_global(scope: &ScopeHandle, global: GlobalRef) -> Result<(), GologError> {
        scope.borrow().registry.borrow_mut().declare(global)
    }

    /// Same as `declare_global`, but logs when the declaration replaces an
    /// existing one — `declare` itself stays quiet about a widening
    /// redeclaration, since a scope built up incrementally during parsing
    /// can legitimately re-see the same name more than once.
    pub fn define_global(scope: &ScopeHandle, global: GlobalRef) -> Result<(), GologError> {
        let name = global.name().to_string();
        let arity = global.arity();
        let kind = global.kind_name();
        let existed = Self::lookup_global(scope, &name, arity).is_some();
        scope.borrow().registry.borrow_mut().declare(global)?;
        if existed {
            warn!(name, arity, kind, "redefining existing global");
        }
        Ok(())
    }

    pub fn lookup_global(scope: &ScopeHandle, name: &str, arity: usize) -> Option<GlobalRef> {
        scope.borrow().registry.borrow().lookup(name, arity)
    }

    pub fn all_globals(scope: &ScopeHandle) -> Vec<GlobalRef> {
        scope.borrow().registry.borrow().all_globals()
    }

    pub fn register_type(scope: &ScopeHandle, name: &str, ty: Type) -> Result<(), GologError> {
        scope.borrow().registry.borrow_mut().register_type(name, ty)
    }

    pub fn register_domain(scope: &ScopeHandle, name: &str, values: Vec<Value>) -> Result<(), GologError> {
        scope.borrow().registry.borrow_mut().register_domain(name, values)
    }

    /// Walks up to the scope that is its own parent — the one whose
    /// registry every scope in the tree shares.
    pub fn root_of(scope: &ScopeHandle) -> ScopeHandle {
        if Self::is_global(scope) {
            return scope.clone();
        }
        let parent = scope
            .borrow()
            .parent
            .upgrade()
            .expect("a non-global scope always has a live parent");
        Self::root_of(&parent)
    }

    /// Attaches semantics to every global declared anywhere in the tree
    /// `scope` belongs to. Mirrors the first of the two loops in
    /// `examples/original_source/src/model/scope.cpp`'s
    /// `Scope::implement_globals` — kept separate from compiling them so
    /// every global is fully attached before any of them is compiled.
    pub fn attach_all_globals(scope: &ScopeHandle, factory: &dyn crate::semantics::SemanticsFactory) {
        for global in Self::all_globals(scope) {
            match global {
                GlobalRef::Action(a) => a.attach_semantics(factory),
                GlobalRef::ExogAction(a) => a.attach_semantics(factory),
                GlobalRef::Fluent(f) => f.attach_semantics(factory),
                GlobalRef::Function(f) => f.attach_semantics(factory),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_its_own_parent() {
        let root = Scope::new_root();
        assert!(Scope::is_global(&root));
    }

    #[test]
    fn child_inherits_global_registry_but_not_variables() {
        let root = Scope::new_root();
        let child = Scope::new_child(&root);
        Scope::declare_var(&child, "x", Type::Number);
        assert!(Scope::lookup_var(&child, "x").is_some());
        assert!(Scope::lookup_var(&root, "x").is_none());
    }

    #[test]
    fn var_lookup_walks_up_to_parent() {
        let root = Scope::new_root();
        Scope::declare_var(&root, "g", Type::Bool);
        let child = Scope::new_child(&root);
        let grandchild = Scope::new_child(&child);
        assert!(Scope::lookup_var(&grandchild, "g").is_some());
    }

    #[test]
    fn root_of_walks_a_child_back_to_the_global_scope() {
        let root = Scope::new_root();
        let child = Scope::new_child(&root);
        let grandchild = Scope::new_child(&child);
        assert!(Rc::ptr_eq(&Scope::root_of(&grandchild), &root));
    }

    #[test]
    fn redeclaring_a_fluent_with_a_wider_type_succeeds() {
        let root = Scope::new_root();
        let narrow = Fluent::new("loc", vec![], Type::list_of(Type::Symbol), &root);
        Scope::declare_global(&root, GlobalRef::Fluent(narrow)).unwrap();
        let wider = Fluent::new("loc", vec![], Type::list_of(Type::Symbol), &root);
        assert!(Scope::declare_global(&root, GlobalRef::Fluent(wider)).is_ok());
    }

    #[test]
    fn redeclaring_a_fluent_with_an_incompatible_type_fails() {
        let root = Scope::new_root();
        let bools = Fluent::new("flag", vec![], Type::Bool, &root);
        Scope::declare_global(&root, GlobalRef::Fluent(bools)).unwrap();
        let numbers = Fluent::new("flag", vec![], Type::Number, &root);
        assert!(Scope::declare_global(&root, GlobalRef::Fluent(numbers)).is_err());
    }

    #[test]
    fn register_domain_rejects_a_duplicate_name() {
        let root = Scope::new_root();
        Scope::register_domain(&root, "doors", vec![Value::Symbol("d1".into())]).unwrap();
        assert!(Scope::register_domain(&root, "doors", vec![Value::Symbol("d2".into())]).is_err());
    }

    #[test]
    fn register_type_rejects_a_duplicate_name() {
        let root = Scope::new_root();
        Scope::register_type(&root, "door", Type::Symbol).unwrap();
        assert!(Scope::register_type(&root, "door", Type::Symbol).is_err());
    }
}
