//! The capabilities every AST node shares, composed rather than inherited:
//! a place in the scope tree, an optional resolved type, and a once-only
//! semantics slot. This is the idiomatic-Rust stand-in for the original's
//! `AbstractLanguageElement` base class plus `Semantics<GologT>` attachment.

use std::cell::OnceCell;

use crate::lang::scope::ScopeHandle;
use crate::lang::types::Type;

#[derive(Debug)]
pub struct NodeCore<S> {
    parent_scope: ScopeHandle,
    own_scope: Option<ScopeHandle>,
    ty: Option<Type>,
    semantics: OnceCell<S>,
}

// `std::cell::OnceCell` has no `Clone` impl, so this can't be `#[derive(Clone)]`
// — cloning copies whatever evaluator is already attached (if any) into a
// fresh cell rather than requiring re-attachment. Used so a node's
// `Stmt`/`Expr` continuation can be cloned out of the static program tree
// without losing its attached semantics.
impl<S: Clone> Clone for NodeCore<S> {
    fn clone(&self) -> Self {
        let semantics = OnceCell::new();
        if let Some(s) = self.semantics.get() {
            let _ = semantics.set(s.clone());
        }
        NodeCore {
            parent_scope: self.parent_scope.clone(),
            own_scope: self.own_scope.clone(),
            ty: self.ty.clone(),
            semantics,
        }
    }
}

impl<S> NodeCore<S> {
    /// A node that does not open a scope of its own (most expressions,
    /// assignment statements, ...).
    pub fn leaf(parent_scope: ScopeHandle, ty: Option<Type>) -> Self {
        NodeCore {
            parent_scope,
            own_scope: None,
            ty,
            semantics: OnceCell::new(),
        }
    }

    /// A node that opens a new scope for its children (a `pick`'s bound
    /// variable, a procedure's parameter list, ...).
    pub fn scope_owner(parent_scope: ScopeHandle, own_scope: ScopeHandle, ty: Option<Type>) -> Self {
        NodeCore {
            parent_scope,
            own_scope: Some(own_scope),
            ty,
            semantics: OnceCell::new(),
        }
    }

    pub fn parent_scope(&self) -> &ScopeHandle {
        &self.parent_scope
    }

    /// The scope this node's children resolve names in: its own scope if it
    /// opened one, otherwise the enclosing scope.
    pub fn scope(&self) -> &ScopeHandle {
        self.own_scope.as_ref().unwrap_or(&self.parent_scope)
    }

    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    /// Attaches semantics. Idempotent: returns `true` the first time,
    /// `false` on every subsequent call (the evaluator already attached is
    /// left untouched).
    pub fn attach(&self, semantics: S) -> bool {
        self.semantics.set(semantics).is_ok()
    }

    pub fn semantics(&self) -> Option<&S> {
        self.semantics.get()
    }

    pub fn is_attached(&self) -> bool {
        self.semantics.get().is_some()
    }
}
