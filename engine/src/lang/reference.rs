//! Non-owning references into the global registry: `Reference<T>` pairs a
//! shared handle to a global with the (still-symbolic) argument expressions
//! used at a call site; `Grounding<T>` pairs the same handle with
//! already-evaluated constant arguments, the unit the activity lifecycle and
//! history operate on.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::lang::expr::Expr;
use crate::lang::global::{Action, ExogAction};
use crate::lang::value::Value;

/// A symbolic call site: `target(args...)` where `args` may still contain
/// variables.
#[derive(Debug)]
pub struct Reference<T> {
    pub target: Rc<T>,
    pub args: Vec<Box<Expr>>,
}

// Manual, not derived: `#[derive(Clone)]` would add a spurious `T: Clone`
// bound even though `Rc<T>::clone` never needs one.
impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Reference {
            target: self.target.clone(),
            args: self.args.clone(),
        }
    }
}

/// Either flavor of action a `Grounding` can name. A plain enum rather than
/// a trait object: the two are structurally different (only `Action` has a
/// durative lifecycle) and call sites almost always know which they expect.
#[derive(Debug, Clone)]
pub enum ActionHandle {
    Durative(Rc<Action>),
    Exogenous(Rc<ExogAction>),
}

impl ActionHandle {
    pub fn name(&self) -> &str {
        match self {
            ActionHandle::Durative(a) => &a.name,
            ActionHandle::Exogenous(a) => &a.name,
        }
    }

    pub fn param_names(&self) -> Vec<String> {
        match self {
            ActionHandle::Durative(a) => a.params.iter().map(|p| p.name.clone()).collect(),
            ActionHandle::Exogenous(a) => a.params.iter().map(|p| p.name.clone()).collect(),
        }
    }

    /// Attaches semantics to the underlying global, idempotently. A
    /// grounding built from an action reached through the global registry is
    /// already attached by the time it occurs; this exists so a dynamically
    /// constructed occurrence can't slip past attachment.
    pub fn attach_semantics(&self, factory: &dyn crate::semantics::SemanticsFactory) {
        match self {
            ActionHandle::Durative(a) => a.attach_semantics(factory),
            ActionHandle::Exogenous(a) => a.attach_semantics(factory),
        }
    }

    /// Whether occurrences of this action should be announced at
    /// diagnostic-info level. Mirrors `examples/original_source/src/model/execution.cpp`'s
    /// `(*exog)->silent()` check.
    pub fn is_silent(&self) -> bool {
        match self {
            ActionHandle::Durative(a) => a.silent(),
            ActionHandle::Exogenous(a) => a.silent(),
        }
    }
}

/// A fully evaluated `(action, constant-argument-tuple)` pair: what actually
/// gets dispatched, recorded in history, or tracked as a running activity.
#[derive(Debug, Clone)]
pub struct Grounding {
    pub action: ActionHandle,
    pub args: Vec<Value>,
}

impl Grounding {
    pub fn durative(action: Rc<Action>, args: Vec<Value>) -> Self {
        Grounding {
            action: ActionHandle::Durative(action),
            args,
        }
    }

    pub fn exogenous(action: Rc<ExogAction>, args: Vec<Value>) -> Self {
        Grounding {
            action: ActionHandle::Exogenous(action),
            args,
        }
    }

    pub fn key(&self) -> GroundingKey {
        GroundingKey(self.action.name().to_string(), self.args.clone())
    }
}

/// Hashable identity for a grounding: used as the activity-map key and for
/// the "at most one running activity per grounding" invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundingKey(pub String, pub Vec<Value>);

impl PartialEq for Grounding {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for Grounding {}

impl Hash for Grounding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
