//! The AST and data model: scopes, globals, expressions, statements,
//! references, and transitions. See `spec.md` §3 for the invariants this
//! module is grounded on.

pub mod effect;
pub mod element;
pub mod expr;
pub mod global;
pub mod program;
pub mod reference;
pub mod scope;
pub mod transition;
pub mod types;
pub mod value;
