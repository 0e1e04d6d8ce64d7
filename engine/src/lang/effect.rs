//! Effect axioms: "when `condition` holds in the pre-state, assign `value`
//! to `fluent(fluent_args)`". An action owns zero or more; they fire when
//! the action's transition is incorporated into history (`History::append`,
//! see `crate::history`).

use std::rc::Rc;

use crate::lang::expr::Expr;
use crate::lang::global::Fluent;

#[derive(Debug)]
pub struct EffectAxiom {
    pub condition: Box<Expr>,
    pub fluent: Rc<Fluent>,
    pub fluent_args: Vec<Box<Expr>>,
    pub value: Box<Expr>,
}
